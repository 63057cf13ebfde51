//! Plugin for runtime texture painting.
use bevy::prelude::*;

use crate::canvas::{
    CanvasCommand, CanvasRegistry, PaintOutcome, PaintRequest, TexturePaintSystems,
    apply_canvas_commands, apply_paint_requests, attach_canvases, release_removed_canvases,
};
use crate::compositor::{CompositeProgram, DefaultCompositePrograms, TemporarySurfacePool};

/// Settings applied when canvases attach and strokes lease scratch targets.
#[derive(Resource, Clone, Debug)]
pub struct TexturePaintSettings {
    /// Size of the blank color surface synthesized for materials without a
    /// color texture.
    /// Default: 1024×1024
    pub default_canvas_size: UVec2,

    /// Texels the temporary surface pool may lease at once.
    /// Default: [`TemporarySurfacePool::DEFAULT_TEXEL_BUDGET`]
    pub temporary_texel_budget: u64,

    /// Returned scratch targets kept for reuse.
    /// Default: 2
    pub max_idle_temporaries: usize,
}

impl Default for TexturePaintSettings {
    fn default() -> Self {
        Self {
            default_canvas_size: UVec2::splat(1024),
            temporary_texel_budget: TemporarySurfacePool::DEFAULT_TEXEL_BUDGET,
            max_idle_temporaries: TemporarySurfacePool::DEFAULT_MAX_IDLE,
        }
    }
}

/// Plugin that adds paintable canvases to Bevy.
///
/// This plugin registers:
/// - [`CompositeProgram`] as an asset type, with the built-in color and
///   normal programs in [`DefaultCompositePrograms`]
/// - the [`CanvasRegistry`] and [`TemporarySurfacePool`] resources
/// - the [`PaintRequest`], [`PaintOutcome`] and [`CanvasCommand`] messages
/// - the canvas systems, in [`TexturePaintSystems`]
///
/// # Example
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_texture_paint::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(TexturePaintPlugin::default())
///     .run();
/// ```
#[derive(Default)]
pub struct TexturePaintPlugin {
    pub settings: TexturePaintSettings,
}

impl TexturePaintPlugin {
    pub fn with_settings(settings: TexturePaintSettings) -> Self {
        Self { settings }
    }
}

impl Plugin for TexturePaintPlugin {
    fn build(&self, app: &mut App) {
        let settings = self.settings.clone();
        app.init_asset::<CompositeProgram>()
            .insert_resource(TemporarySurfacePool::new(
                settings.temporary_texel_budget,
                settings.max_idle_temporaries,
            ))
            .insert_resource(settings)
            .init_resource::<CanvasRegistry>()
            .init_resource::<DefaultCompositePrograms>()
            .add_message::<PaintRequest>()
            .add_message::<PaintOutcome>()
            .add_message::<CanvasCommand>()
            .add_systems(
                Update,
                (
                    release_removed_canvases,
                    attach_canvases,
                    apply_canvas_commands,
                    apply_paint_requests,
                )
                    .chain()
                    .in_set(TexturePaintSystems),
            );
    }
}
