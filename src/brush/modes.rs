//! Blend-mode categories and their shader keywords.

use bevy::prelude::*;

/// A blend-mode category whose variants map onto mutually exclusive shader
/// keywords.
///
/// [`KEYWORDS`](Self::KEYWORDS) lists every keyword the category owns. A
/// composite program clears exactly this list before enabling the keyword of
/// the selected variant, so keywords from other categories survive.
pub trait BlendKeyword: Copy + Eq + std::fmt::Debug + 'static {
    /// All keywords owned by this category.
    const KEYWORDS: &'static [&'static str];

    /// Keyword enabled for this variant.
    fn keyword(self) -> &'static str;
}

/// How brush color combines with the existing color surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum ColorBlendMode {
    /// Paint the brush tint, masked by brush alpha.
    #[default]
    UseColor,
    /// Paint the brush texture's own color.
    UseBrush,
    /// Paint the brush texture modulated by the tint.
    Neutral,
}

impl ColorBlendMode {
    pub const KEYWORD_CONTROL_COLOR: &'static str = "PAINT_COLOR_CONTROL";
    pub const KEYWORD_BRUSH_COLOR: &'static str = "PAINT_COLOR_BRUSH";
    pub const KEYWORD_NEUTRAL: &'static str = "PAINT_COLOR_NEUTRAL";

    /// Map a raw mode value from brush data. Unknown values fall back to
    /// [`ColorBlendMode::UseColor`].
    pub const fn from_index(index: u32) -> Self {
        match index {
            1 => Self::UseBrush,
            2 => Self::Neutral,
            _ => Self::UseColor,
        }
    }

    pub const fn index(self) -> u32 {
        match self {
            Self::UseColor => 0,
            Self::UseBrush => 1,
            Self::Neutral => 2,
        }
    }
}

impl BlendKeyword for ColorBlendMode {
    const KEYWORDS: &'static [&'static str] = &[
        Self::KEYWORD_CONTROL_COLOR,
        Self::KEYWORD_BRUSH_COLOR,
        Self::KEYWORD_NEUTRAL,
    ];

    fn keyword(self) -> &'static str {
        match self {
            Self::UseColor => Self::KEYWORD_CONTROL_COLOR,
            Self::UseBrush => Self::KEYWORD_BRUSH_COLOR,
            Self::Neutral => Self::KEYWORD_NEUTRAL,
        }
    }
}

/// How brush normals combine with the existing normal surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum NormalBlendMode {
    /// Blend toward the brush normal.
    #[default]
    UseBrush,
    /// Blend toward the per-channel minimum of surface and brush.
    Min,
    /// Blend toward the per-channel maximum of surface and brush.
    Max,
}

impl NormalBlendMode {
    pub const KEYWORD_BRUSH_NORMAL: &'static str = "PAINT_NORMAL_BRUSH";
    pub const KEYWORD_MIN: &'static str = "PAINT_NORMAL_MIN";
    pub const KEYWORD_MAX: &'static str = "PAINT_NORMAL_MAX";

    /// Map a raw mode value from brush data. Unknown values fall back to
    /// [`NormalBlendMode::UseBrush`].
    pub const fn from_index(index: u32) -> Self {
        match index {
            1 => Self::Min,
            2 => Self::Max,
            _ => Self::UseBrush,
        }
    }

    pub const fn index(self) -> u32 {
        match self {
            Self::UseBrush => 0,
            Self::Min => 1,
            Self::Max => 2,
        }
    }
}

impl BlendKeyword for NormalBlendMode {
    const KEYWORDS: &'static [&'static str] = &[
        Self::KEYWORD_BRUSH_NORMAL,
        Self::KEYWORD_MIN,
        Self::KEYWORD_MAX,
    ];

    fn keyword(self) -> &'static str {
        match self {
            Self::UseBrush => Self::KEYWORD_BRUSH_NORMAL,
            Self::Min => Self::KEYWORD_MIN,
            Self::Max => Self::KEYWORD_MAX,
        }
    }
}
