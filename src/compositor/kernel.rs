//! CPU reference kernels for the color and normal composite programs.
//!
//! A stamp is the brush texture scaled by the brush scale and centered on the
//! stroke UV. Brush texels are sampled nearest-neighbor; texels outside the
//! footprint are copied through.

use bevy::math::{URect, UVec2, Vec2};

use super::program::{ColorCompositeParams, NormalCompositeParams};
use crate::brush::{ColorBlendMode, NormalBlendMode};

/// Brush texels plus their dimensions.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stamp<'a> {
    texels: &'a [[u8; 4]],
    size: UVec2,
}

impl<'a> Stamp<'a> {
    pub(crate) fn new(texels: &'a [[u8; 4]], size: UVec2) -> Self {
        Self { texels, size }
    }

    #[inline]
    fn sample(&self, local: Vec2) -> [u8; 4] {
        let texel = (local * self.size.as_vec2())
            .as_uvec2()
            .min(self.size.saturating_sub(UVec2::ONE));
        self.texels[(texel.y * self.size.x + texel.x) as usize]
    }
}

/// Placement of a stamp on a surface, in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Footprint {
    origin: Vec2,
    size: Vec2,
}

impl Footprint {
    pub(crate) fn new(uv: Vec2, surface: UVec2, stamp: UVec2, scale: f32) -> Self {
        let size = stamp.as_vec2() * scale.max(0.0);
        let center = uv * surface.as_vec2();
        Self {
            origin: center - size * 0.5,
            size,
        }
    }

    /// Surface pixels the footprint may touch, clamped to the surface.
    pub(crate) fn bounds(&self, surface: UVec2) -> Option<URect> {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return None;
        }
        let min = self.origin.floor().max(Vec2::ZERO);
        let max = (self.origin + self.size).ceil().min(surface.as_vec2());
        if min.x >= max.x || min.y >= max.y {
            return None;
        }
        Some(URect::from_corners(min.as_uvec2(), max.as_uvec2()))
    }

    /// Position of the pixel center `(x, y)` inside the stamp, in `[0, 1)²`.
    #[inline]
    pub(crate) fn local(&self, x: u32, y: u32) -> Option<Vec2> {
        let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let local = (center - self.origin) / self.size;
        (local.x >= 0.0 && local.x < 1.0 && local.y >= 0.0 && local.y < 1.0).then_some(local)
    }
}

pub(crate) fn composite_color(
    source: &[[u8; 4]],
    size: UVec2,
    brush: Stamp<'_>,
    params: &ColorCompositeParams,
    target: &mut [[u8; 4]],
) {
    target.copy_from_slice(source);

    let footprint = Footprint::new(params.uv, size, brush.size, params.scale);
    let Some(bounds) = footprint.bounds(size) else {
        return;
    };

    let tint = params.tint.to_srgba();
    let tint_rgb = [tint.red, tint.green, tint.blue];

    for y in bounds.min.y..bounds.max.y {
        for x in bounds.min.x..bounds.max.x {
            let Some(local) = footprint.local(x, y) else {
                continue;
            };
            let texel = brush.sample(local);
            let opacity = unorm(texel[3]) * tint.alpha;
            if opacity <= 0.0 {
                continue;
            }

            let index = (y * size.x + x) as usize;
            let dst = source[index];
            let paint = match params.mode {
                ColorBlendMode::UseColor => tint_rgb,
                ColorBlendMode::UseBrush => [unorm(texel[0]), unorm(texel[1]), unorm(texel[2])],
                ColorBlendMode::Neutral => [
                    unorm(texel[0]) * tint_rgb[0],
                    unorm(texel[1]) * tint_rgb[1],
                    unorm(texel[2]) * tint_rgb[2],
                ],
            };

            let mut out = [0u8; 4];
            for channel in 0..3 {
                out[channel] = to_unorm8(lerp(unorm(dst[channel]), paint[channel], opacity));
            }
            let alpha = unorm(dst[3]);
            out[3] = to_unorm8(alpha + opacity * (1.0 - alpha));
            target[index] = out;
        }
    }
}

pub(crate) fn composite_normal(
    source: &[[u8; 4]],
    size: UVec2,
    mask: Option<Stamp<'_>>,
    normal: Stamp<'_>,
    params: &NormalCompositeParams,
    target: &mut [[u8; 4]],
) {
    target.copy_from_slice(source);

    let stamp_size = mask.map_or(normal.size, |m| m.size);
    let footprint = Footprint::new(params.uv, size, stamp_size, params.scale);
    let Some(bounds) = footprint.bounds(size) else {
        return;
    };
    let strength = params.blend_strength.clamp(0.0, 1.0);

    for y in bounds.min.y..bounds.max.y {
        for x in bounds.min.x..bounds.max.x {
            let Some(local) = footprint.local(x, y) else {
                continue;
            };
            let coverage = mask.map_or(1.0, |m| unorm(m.sample(local)[3]));
            let weight = coverage * strength;
            if weight <= 0.0 {
                continue;
            }

            let index = (y * size.x + x) as usize;
            let dst = source[index];
            let brush = normal.sample(local);

            let mut out = dst;
            for channel in 0..3 {
                let current = unorm(dst[channel]);
                let painted = unorm(brush[channel]);
                let goal = match params.mode {
                    NormalBlendMode::UseBrush => painted,
                    NormalBlendMode::Min => current.min(painted),
                    NormalBlendMode::Max => current.max(painted),
                };
                out[channel] = to_unorm8(lerp(current, goal, weight));
            }
            target[index] = out;
        }
    }
}

#[inline]
fn unorm(value: u8) -> f32 {
    value as f32 / 255.0
}

#[inline]
fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
