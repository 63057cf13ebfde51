//! Canvas surface management.
//!
//! [`CanvasSurfaces`] owns the writable color and normal copies of one mesh
//! instance and keeps its material's [`TextureSlot`]s pointed at them.

mod manager;
mod slots;

pub use manager::{CanvasSources, CanvasSurfaces};
pub use slots::{CanvasSlots, TextureSlot, UnknownTextureSlot};
