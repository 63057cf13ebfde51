//! Error types for canvas attachment and paint strokes.

use bevy::math::UVec2;
use bevy::prelude::Entity;
use bevy::render::render_resource::TextureFormat;
use thiserror::Error;

use crate::canvas::HostValidationError;
use crate::compositor::ProgramKind;

/// Errors produced by canvases and the paint stroke compositor.
///
/// Every variant is recoverable at the call site: a failed paint leaves the
/// canvas surfaces untouched and may be retried with corrected input. The
/// worst outcome is a canvas that stays inert.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("Paint hit targets {hit}, not the canvas owner {owner}")]
    InvalidTarget { owner: Entity, hit: Entity },

    #[error("No canvas is attached to {target}")]
    UnknownCanvas { target: Entity },

    #[error("Paint request carries no brush")]
    MissingBrush,

    #[error(
        "Temporary surface budget exhausted: requested {requested} texels, {available} available"
    )]
    ResourceExhausted { requested: u64, available: u64 },

    #[error("Canvas host failed validation: {0}")]
    StructuralPrecondition(#[from] HostValidationError),

    #[error("Source texture is not loaded")]
    SourceNotLoaded,

    #[error("Texture has no CPU-side pixel data")]
    NoPixelData,

    #[error("Texture format {found:?} cannot be painted")]
    UnsupportedFormat { found: TextureFormat },

    #[error("Texture size mismatch: expected {expected}, got {found}")]
    SizeMismatch { expected: UVec2, found: UVec2 },

    #[error("Canvas surfaces have been released")]
    SurfaceReleased,

    #[error("Composite program is not loaded")]
    ProgramMissing,

    #[error("Composite program '{label}' has no bound parameters")]
    ProgramUnbound { label: String },

    #[error("Composite program kind mismatch: expected {expected:?}, got {found:?}")]
    ProgramKindMismatch {
        expected: ProgramKind,
        found: ProgramKind,
    },

    #[error("Composite pass needs a brush texture that was not supplied")]
    MissingBrushTexture,
}
