//! Systems that attach, paint and tear down canvases.

use std::collections::HashSet;

use bevy::prelude::*;

use super::texture_canvas::{CanvasHost, CanvasInit, TextureCanvas};
use super::validation::{CollisionShape, HostValidationError};
use super::{
    CanvasCommand, CanvasRegistry, InertCanvas, PaintOutcome, PaintRequest, PaintableCanvas,
};
use crate::compositor::{
    CompositeProgram, DefaultCompositePrograms, PaintContext, PaintStrokeCompositor,
    TemporarySurfacePool,
};
use crate::error::CanvasError;
use crate::plugin::TexturePaintSettings;

/// System set for texture paint systems. Its systems run chained in the
/// order teardown, attach, commands, paint.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TexturePaintSystems;

/// Tear down canvases whose [`PaintableCanvas`] was removed or whose entity
/// was despawned.
pub fn release_removed_canvases(
    mut commands: Commands,
    mut removed: RemovedComponents<PaintableCanvas>,
    mut registry: ResMut<CanvasRegistry>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    cameras: Query<&Camera>,
) {
    let render_targets = active_render_targets(&cameras);

    for entity in removed.read() {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.remove::<InertCanvas>();
        }

        let Some(mut canvas) = registry.remove(entity) else {
            continue;
        };
        let material = materials.get_mut(canvas.material_id());
        canvas.teardown(material, &mut images, |id| render_targets.contains(&id));
        debug!("Tore down canvas on {}", entity);
    }
}

/// Attach a [`TextureCanvas`] to every new [`PaintableCanvas`] entity whose
/// material and textures are loaded.
///
/// The entity's material is cloned first so the canvas only ever rebinds its
/// own instance. Hosts that fail validation get [`InertCanvas`].
pub fn attach_canvases(
    mut commands: Commands,
    hosts: Query<
        (
            Entity,
            &PaintableCanvas,
            Option<&MeshMaterial3d<StandardMaterial>>,
            Option<&CollisionShape>,
            Option<&Children>,
        ),
        Without<InertCanvas>,
    >,
    child_shapes: Query<&CollisionShape>,
    mut registry: ResMut<CanvasRegistry>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    defaults: Res<DefaultCompositePrograms>,
    settings: Res<TexturePaintSettings>,
) {
    for (entity, paintable, mesh_material, shape, children) in &hosts {
        if registry.contains(entity) {
            continue;
        }

        let Some(mesh_material) = mesh_material else {
            make_inert(
                &mut commands,
                entity,
                HostValidationError::MissingMaterial.into(),
            );
            continue;
        };

        let Some(original) = materials.get(&mesh_material.0) else {
            // Material still loading
            continue;
        };
        let sources_loaded = [paintable.slots.color, paintable.slots.normal]
            .into_iter()
            .filter_map(|slot| slot.get(original))
            .all(|handle| images.contains(handle));
        if !sources_loaded {
            continue;
        }
        let original = original.clone();

        let mut shapes: Vec<CollisionShape> = shape.into_iter().copied().collect();
        if let Some(children) = children {
            shapes.extend(child_shapes.iter_many(children.iter()).copied());
        }

        let instance = materials.add(original);
        let Some(material) = materials.get_mut(&instance) else {
            continue;
        };

        let compositor = PaintStrokeCompositor::new(
            paintable
                .color_program
                .clone()
                .unwrap_or_else(|| defaults.color.clone()),
            paintable
                .normal_program
                .clone()
                .unwrap_or_else(|| defaults.normal.clone()),
        );
        let host = CanvasHost {
            owner: entity,
            shapes: &shapes,
            material: instance.id(),
        };

        match TextureCanvas::initialize(
            host,
            paintable.slots,
            compositor,
            material,
            &mut images,
            settings.default_canvas_size,
        ) {
            CanvasInit::Active(canvas) => {
                info!(
                    "Attached canvas to {} ({})",
                    entity,
                    if canvas.surfaces().normal_surface().is_some() {
                        "color + normal"
                    } else {
                        "color only"
                    }
                );
                commands.entity(entity).insert(MeshMaterial3d(instance));
                registry.insert(canvas);
            }
            CanvasInit::Inert(reason) => {
                materials.remove(&instance);
                make_inert(&mut commands, entity, reason);
            }
        }
    }
}

/// Apply [`CanvasCommand`]s in the order they were written.
pub fn apply_canvas_commands(
    mut canvas_commands: MessageReader<CanvasCommand>,
    mut registry: ResMut<CanvasRegistry>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    cameras: Query<&Camera>,
) {
    if canvas_commands.is_empty() {
        return;
    }
    let render_targets = active_render_targets(&cameras);
    let is_render_target = |id: AssetId<Image>| render_targets.contains(&id);

    for command in canvas_commands.read() {
        match *command {
            CanvasCommand::Reset(entity) => {
                let Some(canvas) = registry.get_mut(entity) else {
                    warn!("Reset requested for {}, which has no canvas", entity);
                    continue;
                };
                let Some(material) = materials.get_mut(canvas.material_id()) else {
                    warn!("Canvas material of {} no longer exists", entity);
                    continue;
                };
                match canvas.reset(material, &mut images, is_render_target) {
                    Ok(()) => info!("Reset canvas on {}", entity),
                    Err(error) => error!("Failed to reset canvas on {}: {}", entity, error),
                }
            }
            CanvasCommand::Release(entity) => {
                if let Some(canvas) = registry.get_mut(entity) {
                    let material = materials.get_mut(canvas.material_id());
                    canvas.release(material, &mut images, is_render_target);
                    debug!("Released canvas surfaces on {}", entity);
                }
            }
        }
    }
}

/// Paint every [`PaintRequest`] and report a [`PaintOutcome`] for each.
pub fn apply_paint_requests(
    mut requests: MessageReader<PaintRequest>,
    mut outcomes: MessageWriter<PaintOutcome>,
    mut registry: ResMut<CanvasRegistry>,
    mut images: ResMut<Assets<Image>>,
    mut programs: ResMut<Assets<CompositeProgram>>,
    mut pool: ResMut<TemporarySurfacePool>,
) {
    for request in requests.read() {
        let target = request.hit.target;
        let result = match registry.get_mut(target) {
            Some(canvas) => canvas.try_paint(
                &request.hit,
                request.brush.as_ref(),
                PaintContext {
                    images: &mut *images,
                    programs: &mut *programs,
                    pool: &mut *pool,
                },
            ),
            None => Err(CanvasError::UnknownCanvas { target }),
        };

        match &result {
            Ok(_) | Err(CanvasError::InvalidTarget { .. }) => {}
            Err(CanvasError::UnknownCanvas { .. }) => {
                debug!("Ignoring paint on {}: no canvas attached", target);
            }
            Err(error) => error!("Paint on {} failed: {}", target, error),
        }
        outcomes.write(PaintOutcome { target, result });
    }
}

fn make_inert(commands: &mut Commands, entity: Entity, reason: CanvasError) {
    warn!("Canvas on {} is inert: {}", entity, reason);
    commands.entity(entity).insert(InertCanvas { reason });
}

/// Images currently rendered into by an active camera.
fn active_render_targets(cameras: &Query<&Camera>) -> HashSet<AssetId<Image>> {
    cameras
        .iter()
        .filter(|camera| camera.is_active)
        .filter_map(|camera| camera.target.as_image())
        .map(|handle| handle.id())
        .collect()
}
