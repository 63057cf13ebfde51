//! Structural checks on the entity hosting a canvas.

use bevy::prelude::*;
use thiserror::Error;

/// Collision shape descriptor used by the ray-intersection collaborator.
///
/// A canvas host must expose exactly one, on itself or a direct child, and it
/// must be [`CollisionShape::Mesh`] so hits carry mesh UVs.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub enum CollisionShape {
    /// Collides against the entity's render mesh.
    Mesh,
    Cuboid,
    Sphere,
    Capsule,
}

impl CollisionShape {
    pub const fn is_mesh_based(self) -> bool {
        matches!(self, Self::Mesh)
    }
}

/// Reasons a canvas host is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostValidationError {
    #[error("Canvas host has no collision shape")]
    NoCollisionShape,

    #[error("Canvas host has {count} collision shapes, expected exactly one")]
    MultipleCollisionShapes { count: usize },

    #[error("Canvas host collision shape must be mesh-based, got {found:?}")]
    NotMeshBased { found: CollisionShape },

    #[error("Canvas host has no StandardMaterial")]
    MissingMaterial,
}

/// Validate the collision shapes gathered from a canvas host.
pub fn validate_collision_shapes(shapes: &[CollisionShape]) -> Result<(), HostValidationError> {
    match shapes {
        [] => Err(HostValidationError::NoCollisionShape),
        [shape] if shape.is_mesh_based() => Ok(()),
        [shape] => Err(HostValidationError::NotMeshBased { found: *shape }),
        _ => Err(HostValidationError::MultipleCollisionShapes {
            count: shapes.len(),
        }),
    }
}
