//! Brush descriptors consumed by the paint stroke compositor.
//!
//! A [`Brush`] is read-only input: the compositor never mutates it and never
//! keeps it beyond a single paint call.

mod modes;

use bevy::prelude::*;

pub use modes::{BlendKeyword, ColorBlendMode, NormalBlendMode};

/// Brush data contract for a single paint stroke.
///
/// # Example
///
/// ```ignore
/// use bevy_texture_paint::prelude::*;
///
/// let brush = Brush::new(asset_server.load("brushes/round.png"))
///     .with_normal_texture(asset_server.load("brushes/round_normal.png"))
///     .with_color_blend(ColorBlendMode::UseBrush)
///     .with_scale(2.0);
/// ```
#[derive(Clone, Debug)]
pub struct Brush {
    /// Stamp texture. Its alpha channel masks both color and normal passes.
    ///
    /// When `None` the color pass is skipped.
    pub color_texture: Option<Handle<Image>>,

    /// Normal stamp texture. When `None` the normal pass is skipped.
    pub normal_texture: Option<Handle<Image>>,

    /// Footprint multiplier applied to the brush texture's pixel size.
    ///
    /// Default: 1.0
    pub scale: f32,

    /// Control color used by [`ColorBlendMode::UseColor`] and
    /// [`ColorBlendMode::Neutral`]. Its alpha scales stroke opacity.
    ///
    /// Default: white
    pub tint: Color,

    pub color_blend: ColorBlendMode,

    pub normal_blend: NormalBlendMode,

    /// Weight of the normal pass, clamped to `0.0..=1.0`.
    ///
    /// Default: 1.0
    pub normal_blend_strength: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color_texture: None,
            normal_texture: None,
            scale: 1.0,
            tint: Color::WHITE,
            color_blend: ColorBlendMode::default(),
            normal_blend: NormalBlendMode::default(),
            normal_blend_strength: 1.0,
        }
    }
}

impl Brush {
    /// Create a brush stamping `color_texture`.
    pub fn new(color_texture: Handle<Image>) -> Self {
        Self {
            color_texture: Some(color_texture),
            ..default()
        }
    }

    pub fn with_normal_texture(mut self, normal_texture: Handle<Image>) -> Self {
        self.normal_texture = Some(normal_texture);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_tint(mut self, tint: impl Into<Color>) -> Self {
        self.tint = tint.into();
        self
    }

    pub fn with_color_blend(mut self, mode: ColorBlendMode) -> Self {
        self.color_blend = mode;
        self
    }

    pub fn with_normal_blend(mut self, mode: NormalBlendMode) -> Self {
        self.normal_blend = mode;
        self
    }

    pub fn with_normal_blend_strength(mut self, strength: f32) -> Self {
        self.normal_blend_strength = strength;
        self
    }

    /// Check if this brush paints color.
    pub fn paints_color(&self) -> bool {
        self.color_texture.is_some()
    }

    /// Check if this brush paints normals.
    pub fn paints_normals(&self) -> bool {
        self.normal_texture.is_some()
    }
}
