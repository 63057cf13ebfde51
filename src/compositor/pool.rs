//! Process-wide pool of temporary composite targets.

use std::ops::{Deref, DerefMut};

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

use crate::error::CanvasError;
use crate::texture::{self, image_size};

/// Scratch images leased to paint strokes.
///
/// Leases are bounded by a texel budget; a request that would exceed it fails
/// with [`CanvasError::ResourceExhausted`] instead of allocating. Returned
/// images are kept for reuse, up to `max_idle` of them.
#[derive(Resource, Debug)]
pub struct TemporarySurfacePool {
    texel_budget: u64,
    leased_texels: u64,
    max_idle: usize,
    idle: Vec<Image>,
}

impl Default for TemporarySurfacePool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TEXEL_BUDGET, Self::DEFAULT_MAX_IDLE)
    }
}

impl TemporarySurfacePool {
    /// Two 4096² scratch targets.
    pub const DEFAULT_TEXEL_BUDGET: u64 = 2 * 4096 * 4096;
    pub const DEFAULT_MAX_IDLE: usize = 2;

    pub fn new(texel_budget: u64, max_idle: usize) -> Self {
        Self {
            texel_budget,
            leased_texels: 0,
            max_idle,
            idle: Vec::new(),
        }
    }

    /// Lease a scratch image of `size` and `format`.
    ///
    /// The image goes back to the pool when the returned guard drops, on
    /// every exit path of the caller.
    pub fn acquire(
        &mut self,
        size: UVec2,
        format: TextureFormat,
    ) -> Result<TemporarySurface<'_>, CanvasError> {
        self.acquire_reserved(size, format, texel_count(size))
    }

    /// Lease a scratch image of `size`, reserving at least `reserve` texels.
    ///
    /// [`TemporarySurface::fit`] never fails for sizes within the
    /// reservation, so a caller that reserves its largest size up front
    /// cannot run out of budget halfway through.
    pub fn acquire_reserved(
        &mut self,
        size: UVec2,
        format: TextureFormat,
        reserve: u64,
    ) -> Result<TemporarySurface<'_>, CanvasError> {
        let texels = texel_count(size).max(reserve);
        self.reserve(texels)?;
        let image = self.take_idle(size, format);
        Ok(TemporarySurface {
            pool: self,
            image,
            texels,
        })
    }

    /// Texels currently leased out.
    pub fn leased_texels(&self) -> u64 {
        self.leased_texels
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    pub fn texel_budget(&self) -> u64 {
        self.texel_budget
    }

    fn available(&self) -> u64 {
        self.texel_budget.saturating_sub(self.leased_texels)
    }

    fn reserve(&mut self, texels: u64) -> Result<(), CanvasError> {
        let available = self.available();
        if texels > available {
            return Err(CanvasError::ResourceExhausted {
                requested: texels,
                available,
            });
        }
        self.leased_texels += texels;
        Ok(())
    }

    fn take_idle(&mut self, size: UVec2, format: TextureFormat) -> Image {
        match self.idle.iter().position(|image| image_size(image) == size) {
            Some(index) => {
                let mut image = self.idle.swap_remove(index);
                image.texture_descriptor.format = format;
                image
            }
            None => texture::new_surface(size, format, [0; 4]),
        }
    }

    fn give_back(&mut self, image: Image, texels: u64) {
        self.leased_texels = self.leased_texels.saturating_sub(texels);
        if self.idle.len() < self.max_idle {
            self.idle.push(image);
        }
    }
}

/// A leased scratch image. Dereferences to [`Image`].
#[derive(Debug)]
pub struct TemporarySurface<'a> {
    pool: &'a mut TemporarySurfacePool,
    image: Image,
    texels: u64,
}

impl TemporarySurface<'_> {
    /// Reshape the lease to `size` and `format`, reallocating when the size
    /// changes. Sizes beyond the reservation are checked against the budget
    /// first.
    pub fn fit(&mut self, size: UVec2, format: TextureFormat) -> Result<(), CanvasError> {
        if image_size(&self.image) == size {
            self.image.texture_descriptor.format = format;
            return Ok(());
        }

        let texels = texel_count(size);
        if texels <= self.texels {
            self.image = texture::new_surface(size, format, [0; 4]);
            return Ok(());
        }

        self.pool.leased_texels = self.pool.leased_texels.saturating_sub(self.texels);
        if let Err(error) = self.pool.reserve(texels) {
            self.pool.leased_texels += self.texels;
            return Err(error);
        }
        self.texels = texels;
        self.image = texture::new_surface(size, format, [0; 4]);
        Ok(())
    }
}

impl Deref for TemporarySurface<'_> {
    type Target = Image;

    fn deref(&self) -> &Image {
        &self.image
    }
}

impl DerefMut for TemporarySurface<'_> {
    fn deref_mut(&mut self) -> &mut Image {
        &mut self.image
    }
}

impl Drop for TemporarySurface<'_> {
    fn drop(&mut self) {
        let image = std::mem::take(&mut self.image);
        self.pool.give_back(image, self.texels);
    }
}

pub(crate) fn texel_count(size: UVec2) -> u64 {
    size.x as u64 * size.y as u64
}
