//! The read → composite → write-back cycle of one paint stroke.

use bevy::prelude::*;

use super::pool::{TemporarySurfacePool, texel_count};
use super::program::{
    BrushImages, ColorCompositeParams, CompositeProgram, NormalCompositeParams, ProgramKind,
};
use crate::brush::Brush;
use crate::error::CanvasError;
use crate::surface::CanvasSurfaces;
use crate::texture::{self, COLOR_SURFACE_FORMAT, NORMAL_SURFACE_FORMAT, image_size};

/// Mutable engine state a stroke needs.
pub struct PaintContext<'a> {
    pub images: &'a mut Assets<Image>,
    pub programs: &'a mut Assets<CompositeProgram>,
    pub pool: &'a mut TemporarySurfacePool,
}

/// Which passes of a stroke wrote to a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintReport {
    pub color: bool,
    pub normal: bool,
}

/// Binds brush state onto the color and normal programs and composites
/// strokes onto a canvas's surfaces.
#[derive(Clone, Debug)]
pub struct PaintStrokeCompositor {
    color_program: Handle<CompositeProgram>,
    normal_program: Handle<CompositeProgram>,
}

impl PaintStrokeCompositor {
    pub fn new(
        color_program: Handle<CompositeProgram>,
        normal_program: Handle<CompositeProgram>,
    ) -> Self {
        Self {
            color_program,
            normal_program,
        }
    }

    pub fn color_program(&self) -> &Handle<CompositeProgram> {
        &self.color_program
    }

    pub fn normal_program(&self) -> &Handle<CompositeProgram> {
        &self.normal_program
    }

    /// Stamp `brush` at `uv` onto `surfaces`.
    ///
    /// One scratch target is leased for the whole stroke, with budget
    /// reserved for the larger of the two surfaces it will visit. Failing to
    /// lease it aborts before any surface is touched. Color and normal passes
    /// are independent; a pass whose brush texture or surface is missing is
    /// skipped, not an error.
    pub fn composite(
        &self,
        surfaces: &CanvasSurfaces,
        brush: &Brush,
        uv: Vec2,
        ctx: PaintContext<'_>,
    ) -> Result<PaintReport, CanvasError> {
        let PaintContext {
            images,
            programs,
            pool,
        } = ctx;

        let color_surface = surfaces
            .color_surface()
            .ok_or(CanvasError::SurfaceReleased)?;
        let size = images
            .get(color_surface)
            .map(image_size)
            .ok_or(CanvasError::SurfaceReleased)?;

        let normal_target = match (&brush.normal_texture, surfaces.normal_surface()) {
            (Some(normal_texture), Some(normal_surface)) => images
                .get(normal_surface)
                .map(|image| (normal_texture, normal_surface, image_size(image))),
            _ => None,
        };
        let reserve = normal_target.map_or(0, |(_, _, normal_size)| texel_count(normal_size));

        if brush.color_texture.is_some() {
            self.check_program(programs, &self.color_program, ProgramKind::Color)?;
        }
        if normal_target.is_some() {
            self.check_program(programs, &self.normal_program, ProgramKind::Normal)?;
        }

        let mut scratch = pool.acquire_reserved(size, COLOR_SURFACE_FORMAT, reserve)?;
        let mut report = PaintReport::default();

        if let Some(brush_texture) = &brush.color_texture {
            let program = programs
                .get_mut(&self.color_program)
                .ok_or(CanvasError::ProgramMissing)?;
            program.bind_color(ColorCompositeParams {
                uv,
                brush_texture: brush_texture.clone(),
                scale: brush.scale,
                tint: brush.tint,
                mode: brush.color_blend,
            })?;
            program.select_blend(brush.color_blend);

            report.color = composite_pass(
                program,
                color_surface,
                BrushHandles {
                    mask: Some(brush_texture),
                    normal: None,
                },
                images,
                &mut scratch,
            )?;
        }

        if let Some((normal_texture, normal_surface, normal_size)) = normal_target {
            // Within the reservation, so this cannot fail after the color pass.
            scratch.fit(normal_size, NORMAL_SURFACE_FORMAT)?;

            let program = programs
                .get_mut(&self.normal_program)
                .ok_or(CanvasError::ProgramMissing)?;
            program.bind_normal(NormalCompositeParams {
                uv,
                brush_texture: brush.color_texture.clone(),
                brush_normal_texture: normal_texture.clone(),
                scale: brush.scale,
                blend_strength: brush.normal_blend_strength,
                mode: brush.normal_blend,
            })?;
            program.select_blend(brush.normal_blend);

            report.normal = composite_pass(
                program,
                normal_surface,
                BrushHandles {
                    mask: brush.color_texture.as_ref(),
                    normal: Some(normal_texture),
                },
                images,
                &mut scratch,
            )?;
        }

        Ok(report)
    }

    fn check_program(
        &self,
        programs: &Assets<CompositeProgram>,
        handle: &Handle<CompositeProgram>,
        kind: ProgramKind,
    ) -> Result<(), CanvasError> {
        programs
            .get(handle)
            .ok_or(CanvasError::ProgramMissing)?
            .expect_kind(kind)
    }
}

struct BrushHandles<'a> {
    mask: Option<&'a Handle<Image>>,
    normal: Option<&'a Handle<Image>>,
}

/// Render `surface` through `program` into `scratch`, then copy `scratch`
/// back into `surface`.
///
/// Returns `Ok(false)` without writing when a brush image is still loading.
fn composite_pass(
    program: &CompositeProgram,
    surface: &Handle<Image>,
    brush: BrushHandles<'_>,
    images: &mut Assets<Image>,
    scratch: &mut Image,
) -> Result<bool, CanvasError> {
    let format = scratch.texture_descriptor.format;
    {
        let mask = match brush.mask {
            Some(handle) => match images.get(handle) {
                Some(image) => Some(texture::to_surface_format(image, COLOR_SURFACE_FORMAT)?),
                None => {
                    debug!("Brush texture {:?} not loaded; skipping pass", handle.id());
                    return Ok(false);
                }
            },
            None => None,
        };
        let normal = match brush.normal {
            Some(handle) => match images.get(handle) {
                Some(image) => Some(texture::to_surface_format(image, NORMAL_SURFACE_FORMAT)?),
                None => {
                    debug!("Brush normal {:?} not loaded; skipping pass", handle.id());
                    return Ok(false);
                }
            },
            None => None,
        };

        let source = images.get(surface).ok_or(CanvasError::SurfaceReleased)?;
        let source = texture::to_surface_format(source, format)?;
        program.render(
            &source,
            BrushImages {
                mask: mask.as_deref(),
                normal: normal.as_deref(),
            },
            scratch,
        )?;
    }

    let target = images.get_mut(surface).ok_or(CanvasError::SurfaceReleased)?;
    texture::blit(scratch, target)?;
    Ok(true)
}
