//! # bevy_texture_paint
//!
//! A Bevy plugin for painting brush strokes onto mesh textures at runtime.
//!
//! ## Features
//!
//! - Per-instance writable copies of a material's color and normal textures
//! - Color blending from the brush, a control color, or both
//! - Normal blending by replacement, per-channel min or per-channel max
//! - Blend modes mirrored as program keywords for shader specialization
//! - Bounded pool of temporary targets for the composite ping-pong
//!
//! ## Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_texture_paint::prelude::*;
//!
//! #[derive(Resource)]
//! struct RoundBrush(Brush);
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(TexturePaintPlugin::default())
//!         .add_systems(Startup, setup)
//!         .add_systems(Update, paint_center)
//!         .run();
//! }
//!
//! fn setup(
//!     mut commands: Commands,
//!     mut meshes: ResMut<Assets<Mesh>>,
//!     mut materials: ResMut<Assets<StandardMaterial>>,
//!     asset_server: Res<AssetServer>,
//! ) {
//!     commands.insert_resource(RoundBrush(
//!         Brush::new(asset_server.load("brushes/round.png"))
//!             .with_color_blend(ColorBlendMode::UseBrush),
//!     ));
//!     commands.spawn((
//!         Mesh3d(meshes.add(Sphere::new(1.0).mesh().uv(64, 32))),
//!         MeshMaterial3d(materials.add(StandardMaterial {
//!             base_color_texture: Some(asset_server.load("wall/albedo.png")),
//!             normal_map_texture: Some(asset_server.load("wall/normal.png")),
//!             ..default()
//!         })),
//!         CollisionShape::Mesh,
//!         PaintableCanvas::default(),
//!     ));
//! }
//!
//! /// Stamp the brush at the middle of every canvas. A ray-cast hit supplies
//! /// the entity and UV in a real scene.
//! fn paint_center(
//!     canvases: Query<Entity, With<PaintableCanvas>>,
//!     brush: Res<RoundBrush>,
//!     mut requests: MessageWriter<PaintRequest>,
//! ) {
//!     for entity in &canvases {
//!         let hit = PaintHit::new(entity, Vec2::splat(0.5));
//!         requests.write(PaintRequest::new(hit, brush.0.clone()));
//!     }
//! }
//! ```

pub mod brush;
pub mod canvas;
pub mod compositor;
pub mod error;
mod plugin;
pub mod surface;
pub mod texture;

pub mod prelude {
    pub use crate::brush::{BlendKeyword, Brush, ColorBlendMode, NormalBlendMode};
    pub use crate::canvas::{
        CanvasCommand, CanvasInit, CanvasRegistry, CollisionShape, InertCanvas, PaintHit,
        PaintOutcome, PaintRequest, PaintableCanvas, TextureCanvas, TexturePaintSystems,
    };
    pub use crate::compositor::{
        CompositeProgram, DefaultCompositePrograms, PaintContext, PaintReport,
        PaintStrokeCompositor, TemporarySurfacePool,
    };
    pub use crate::error::CanvasError;
    pub use crate::plugin::{TexturePaintPlugin, TexturePaintSettings};
    pub use crate::surface::{CanvasSlots, TextureSlot};
}
