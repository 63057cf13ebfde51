//! Paint stroke compositing.
//!
//! A stroke binds brush parameters onto two [`CompositeProgram`]s, selects one
//! blend keyword per program, and ping-pongs each canvas surface through a
//! leased scratch target:
//!
//! 1. lease a scratch target from the [`TemporarySurfacePool`]
//! 2. render surface + brush → scratch with the color program
//! 3. copy scratch → color surface
//! 4. repeat 2–3 with the normal program when the brush and canvas have normals
//!
//! A surface is never read and written by the same pass.

mod kernel;
mod pool;
mod program;
mod stroke;

use bevy::prelude::*;

pub use pool::{TemporarySurface, TemporarySurfacePool};
pub use program::{
    BrushImages, ColorCompositeParams, CompositeParams, CompositeProgram, NormalCompositeParams,
    ProgramKind,
};
pub use stroke::{PaintContext, PaintReport, PaintStrokeCompositor};

/// Built-in programs used by canvases that do not name their own.
#[derive(Resource, Clone, Debug)]
pub struct DefaultCompositePrograms {
    pub color: Handle<CompositeProgram>,
    pub normal: Handle<CompositeProgram>,
}

impl FromWorld for DefaultCompositePrograms {
    fn from_world(world: &mut World) -> Self {
        let mut programs = world.resource_mut::<Assets<CompositeProgram>>();
        Self {
            color: programs.add(CompositeProgram::color()),
            normal: programs.add(CompositeProgram::normal()),
        }
    }
}

impl DefaultCompositePrograms {
    /// A compositor using the built-in programs.
    pub fn compositor(&self) -> PaintStrokeCompositor {
        PaintStrokeCompositor::new(self.color.clone(), self.normal.clone())
    }
}
