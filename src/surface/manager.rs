//! Writable per-instance copies of a mesh's color and normal textures.

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

use super::slots::CanvasSlots;
use crate::error::CanvasError;
use crate::texture::{
    self, COLOR_SURFACE_FORMAT, NORMAL_SURFACE_FORMAT, PLACEHOLDER_COLOR, image_size,
};

/// Original textures a canvas copies from.
#[derive(Clone, Debug, Default)]
pub struct CanvasSources {
    pub color: Option<Handle<Image>>,
    pub normal: Option<Handle<Image>>,
}

impl CanvasSources {
    /// Capture the textures currently bound to `slots` on `material`.
    pub fn from_material(material: &StandardMaterial, slots: CanvasSlots) -> Self {
        Self {
            color: slots.color.get(material).cloned(),
            normal: slots.normal.get(material).cloned(),
        }
    }
}

/// The paintable surface pair of one mesh instance.
///
/// Holds one color surface and, when the source material had one, one normal
/// surface. Both are independent copies of the captured sources; the material
/// handed to [`attach`](Self::attach) is rebound to them and never points back
/// at the sources while the surfaces are alive.
#[derive(Debug)]
pub struct CanvasSurfaces {
    sources: CanvasSources,
    placeholder: bool,
    slots: CanvasSlots,
    color: Option<Handle<Image>>,
    normal: Option<Handle<Image>>,
}

impl CanvasSurfaces {
    /// Copy `sources` into fresh surfaces and rebind `material` to them.
    ///
    /// A missing color source is replaced by an opaque `default_size`
    /// placeholder that also serves as the reset source. Nothing stays
    /// allocated when this returns an error.
    pub fn attach(
        mut sources: CanvasSources,
        slots: CanvasSlots,
        material: &mut StandardMaterial,
        images: &mut Assets<Image>,
        default_size: UVec2,
    ) -> Result<Self, CanvasError> {
        let placeholder = sources.color.is_none();
        if placeholder {
            let blank = texture::new_surface(default_size, COLOR_SURFACE_FORMAT, PLACEHOLDER_COLOR);
            sources.color = Some(images.add(blank));
        }

        let mut surfaces = Self {
            sources,
            placeholder,
            slots,
            color: None,
            normal: None,
        };

        if let Err(error) = surfaces.allocate(images) {
            surfaces.release(images, |_| false);
            surfaces.drop_placeholder(images);
            return Err(error);
        }
        surfaces.bind(material);

        Ok(surfaces)
    }

    /// Release both surfaces.
    ///
    /// A surface is skipped when it is already gone or when
    /// `is_render_target` reports it as an active render target; a skipped
    /// render target stays allocated and bound. Calling this again is a no-op.
    pub fn release(
        &mut self,
        images: &mut Assets<Image>,
        is_render_target: impl Fn(AssetId<Image>) -> bool,
    ) {
        release_surface(&mut self.color, images, &is_render_target);
        release_surface(&mut self.normal, images, &is_render_target);
    }

    /// Discard every stroke by releasing the surfaces and copying the
    /// captured sources again.
    ///
    /// Surfaces kept alive because they are active render targets are
    /// overwritten in place, so the canvas never holds more than one pair.
    pub fn reset(
        &mut self,
        material: &mut StandardMaterial,
        images: &mut Assets<Image>,
        is_render_target: impl Fn(AssetId<Image>) -> bool,
    ) -> Result<(), CanvasError> {
        self.release(images, is_render_target);
        self.allocate(images)?;
        self.bind(material);
        Ok(())
    }

    /// Point `material`'s slots back at the original textures.
    ///
    /// A synthesized placeholder is unbound rather than restored.
    pub fn restore(&self, material: &mut StandardMaterial) {
        let color = if self.placeholder {
            None
        } else {
            self.sources.color.clone()
        };
        self.slots.color.bind(material, color);
        if self.sources.normal.is_some() {
            self.slots.normal.bind(material, self.sources.normal.clone());
        }
    }

    /// Point slots whose surface has been released back at their source.
    ///
    /// Slots of surfaces kept alive as render targets stay on the surface.
    /// The placeholder source stays bound until
    /// [`drop_placeholder`](Self::drop_placeholder).
    pub fn rebind_released(&self, material: &mut StandardMaterial) {
        if self.color.is_none() {
            self.slots.color.bind(material, self.sources.color.clone());
        }
        if self.normal.is_none() && self.sources.normal.is_some() {
            self.slots.normal.bind(material, self.sources.normal.clone());
        }
    }

    /// Remove the synthesized placeholder source, if any.
    pub fn drop_placeholder(&mut self, images: &mut Assets<Image>) {
        if self.placeholder {
            if let Some(handle) = self.sources.color.take() {
                images.remove(&handle);
            }
            self.placeholder = false;
        }
    }

    pub fn color_surface(&self) -> Option<&Handle<Image>> {
        self.color.as_ref()
    }

    pub fn normal_surface(&self) -> Option<&Handle<Image>> {
        self.normal.as_ref()
    }

    pub fn sources(&self) -> &CanvasSources {
        &self.sources
    }

    pub fn slots(&self) -> CanvasSlots {
        self.slots
    }

    /// Check if the color source was synthesized.
    pub fn has_placeholder_source(&self) -> bool {
        self.placeholder
    }

    /// Check if no surface is held.
    pub fn is_released(&self) -> bool {
        self.color.is_none() && self.normal.is_none()
    }

    /// Copy sources into the surfaces, allocating any that are missing.
    fn allocate(&mut self, images: &mut Assets<Image>) -> Result<(), CanvasError> {
        let color_source = self.sources.color.clone().ok_or(CanvasError::SourceNotLoaded)?;
        copy_into(&mut self.color, &color_source, COLOR_SURFACE_FORMAT, images)?;

        if let Some(normal_source) = self.sources.normal.clone() {
            copy_into(&mut self.normal, &normal_source, NORMAL_SURFACE_FORMAT, images)?;
        }
        Ok(())
    }

    fn bind(&self, material: &mut StandardMaterial) {
        self.slots.color.bind(material, self.color.clone());
        if self.normal.is_some() {
            self.slots.normal.bind(material, self.normal.clone());
        }
    }
}

/// Copy `source` into `surface`, reusing an existing surface of the same size.
fn copy_into(
    surface: &mut Option<Handle<Image>>,
    source: &Handle<Image>,
    format: TextureFormat,
    images: &mut Assets<Image>,
) -> Result<(), CanvasError> {
    let copy = {
        let source_image = images.get(source).ok_or(CanvasError::SourceNotLoaded)?;
        let source_image = texture::to_surface_format(source_image, format)?;
        let mut copy = texture::new_surface(image_size(&source_image), format, [0; 4]);
        texture::blit(&source_image, &mut copy)?;
        copy
    };

    if let Some(existing) = surface.as_ref() {
        if let Some(image) = images.get_mut(existing) {
            if image_size(image) == image_size(&copy) {
                return texture::blit(&copy, image);
            }
        }
        images.remove(existing);
    }

    *surface = Some(images.add(copy));
    Ok(())
}

fn release_surface(
    surface: &mut Option<Handle<Image>>,
    images: &mut Assets<Image>,
    is_render_target: &impl Fn(AssetId<Image>) -> bool,
) {
    let Some(handle) = surface.as_ref() else {
        return;
    };

    if !images.contains(handle) {
        *surface = None;
        return;
    }

    if is_render_target(handle.id()) {
        debug!("Keeping surface {:?}: it is an active render target", handle.id());
        return;
    }

    images.remove(handle);
    *surface = None;
}
