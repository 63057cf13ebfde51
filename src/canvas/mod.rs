//! Paintable canvases attached to mesh entities.
//!
//! Add [`PaintableCanvas`] to an entity with a `MeshMaterial3d<StandardMaterial>`
//! and a mesh [`CollisionShape`]. Once its textures have loaded the entity is
//! given its own material instance and a [`TextureCanvas`] in the
//! [`CanvasRegistry`]; [`PaintRequest`] and [`CanvasCommand`] messages then
//! drive painting, reset and release.

mod systems;
mod texture_canvas;
mod validation;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::brush::Brush;
use crate::compositor::{CompositeProgram, PaintReport};
use crate::error::CanvasError;
use crate::surface::{CanvasSlots, TextureSlot};

pub use systems::{
    TexturePaintSystems, apply_canvas_commands, apply_paint_requests, attach_canvases,
    release_removed_canvases,
};
pub use texture_canvas::{CanvasHost, CanvasInit, PaintHit, TextureCanvas};
pub use validation::{CollisionShape, HostValidationError, validate_collision_shapes};

/// Marks an entity whose material textures should become paintable.
///
/// Configuration is resolved once, when the canvas attaches.
#[derive(Component, Clone, Debug, Default)]
pub struct PaintableCanvas {
    /// Material slots painted by the color and normal passes.
    pub slots: CanvasSlots,

    /// Color program override. Default: the plugin's built-in program.
    pub color_program: Option<Handle<CompositeProgram>>,

    /// Normal program override. Default: the plugin's built-in program.
    pub normal_program: Option<Handle<CompositeProgram>>,
}

impl PaintableCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color_slot(mut self, slot: TextureSlot) -> Self {
        self.slots.color = slot;
        self
    }

    pub fn with_normal_slot(mut self, slot: TextureSlot) -> Self {
        self.slots.normal = slot;
        self
    }

    pub fn with_color_program(mut self, program: Handle<CompositeProgram>) -> Self {
        self.color_program = Some(program);
        self
    }

    pub fn with_normal_program(mut self, program: Handle<CompositeProgram>) -> Self {
        self.normal_program = Some(program);
        self
    }
}

/// Inserted on a [`PaintableCanvas`] entity that failed to attach.
///
/// The canvas is not retried while this component is present.
#[derive(Component, Clone, Debug)]
pub struct InertCanvas {
    pub reason: CanvasError,
}

/// Paint a brush stroke at a hit point.
#[derive(Message, Clone, Debug)]
pub struct PaintRequest {
    pub hit: PaintHit,
    pub brush: Option<Brush>,
}

impl PaintRequest {
    pub fn new(hit: PaintHit, brush: Brush) -> Self {
        Self {
            hit,
            brush: Some(brush),
        }
    }
}

/// Result of one [`PaintRequest`], written in request order.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct PaintOutcome {
    pub target: Entity,
    pub result: Result<PaintReport, CanvasError>,
}

impl PaintOutcome {
    pub fn painted(&self) -> bool {
        self.result.is_ok()
    }
}

/// Lifecycle requests for attached canvases.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasCommand {
    /// Discard every stroke on the entity's canvas.
    Reset(Entity),
    /// Free the entity's surfaces and point its material back at the source
    /// textures. The canvas stops accepting paint until reset.
    Release(Entity),
}

/// Active canvases keyed by the entity they are attached to.
#[derive(Resource, Debug, Default)]
pub struct CanvasRegistry {
    canvases: HashMap<Entity, TextureCanvas>,
}

impl CanvasRegistry {
    pub fn get(&self, entity: Entity) -> Option<&TextureCanvas> {
        self.canvases.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut TextureCanvas> {
        self.canvases.get_mut(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.canvases.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &TextureCanvas)> {
        self.canvases.iter().map(|(entity, canvas)| (*entity, canvas))
    }

    pub(crate) fn insert(&mut self, canvas: TextureCanvas) {
        self.canvases.insert(canvas.owner(), canvas);
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Option<TextureCanvas> {
        self.canvases.remove(&entity)
    }
}
