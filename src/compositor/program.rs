//! Composite programs: bound brush parameters plus blend keywords.

use std::borrow::Cow;
use std::collections::BTreeSet;

use bevy::prelude::*;
use bevy::shader::ShaderDefVal;

use super::kernel;
use crate::brush::{BlendKeyword, ColorBlendMode, NormalBlendMode};
use crate::error::CanvasError;
use crate::texture::{image_size, pixels, pixels_mut};

/// Which surface a program composites onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub enum ProgramKind {
    Color,
    Normal,
}

/// Parameters bound onto the color program before a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorCompositeParams {
    /// Stroke center in texture space, `[0, 1]²`, origin top-left.
    pub uv: Vec2,
    pub brush_texture: Handle<Image>,
    pub scale: f32,
    pub tint: Color,
    pub mode: ColorBlendMode,
}

/// Parameters bound onto the normal program before a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalCompositeParams {
    pub uv: Vec2,
    /// Mask texture. Its alpha limits where normals are written; without it
    /// the whole stamp footprint is written.
    pub brush_texture: Option<Handle<Image>>,
    pub brush_normal_texture: Handle<Image>,
    pub scale: f32,
    pub blend_strength: f32,
    pub mode: NormalBlendMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum CompositeParams {
    #[default]
    Unbound,
    Color(ColorCompositeParams),
    Normal(NormalCompositeParams),
}

/// Brush images resolved for one pass.
#[derive(Clone, Copy, Debug)]
pub struct BrushImages<'a> {
    pub mask: Option<&'a Image>,
    pub normal: Option<&'a Image>,
}

/// A compositing program shared by every canvas that references it.
///
/// Keywords are the program's specialization state. The compositor only ever
/// touches the keywords of the blend category it selects (see
/// [`select_blend`](Self::select_blend)); keywords enabled by other code stay
/// as they are.
#[derive(Asset, TypePath, Clone, Debug)]
pub struct CompositeProgram {
    label: Cow<'static, str>,
    kind: ProgramKind,
    keywords: BTreeSet<Cow<'static, str>>,
    params: CompositeParams,
}

impl CompositeProgram {
    pub fn new(kind: ProgramKind) -> Self {
        let label = match kind {
            ProgramKind::Color => "color_composite",
            ProgramKind::Normal => "normal_composite",
        };
        Self {
            label: Cow::Borrowed(label),
            kind,
            keywords: BTreeSet::new(),
            params: CompositeParams::Unbound,
        }
    }

    /// Program that composites brush color onto color surfaces.
    pub fn color() -> Self {
        Self::new(ProgramKind::Color)
    }

    /// Program that composites brush normals onto normal surfaces.
    pub fn normal() -> Self {
        Self::new(ProgramKind::Normal)
    }

    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn params(&self) -> &CompositeParams {
        &self.params
    }

    pub fn enable_keyword(&mut self, keyword: impl Into<Cow<'static, str>>) {
        self.keywords.insert(keyword.into());
    }

    /// Returns `true` if the keyword was enabled.
    pub fn disable_keyword(&mut self, keyword: &str) -> bool {
        self.keywords.remove(keyword)
    }

    pub fn is_keyword_enabled(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.as_ref())
    }

    /// Clear every keyword of `M`'s category, then enable `mode`'s keyword.
    pub fn select_blend<M: BlendKeyword>(&mut self, mode: M) {
        for keyword in M::KEYWORDS {
            self.keywords.remove(*keyword);
        }
        self.keywords.insert(Cow::Borrowed(mode.keyword()));
    }

    /// Enabled keywords belonging to `M`'s category.
    pub fn active_blend_keywords<M: BlendKeyword>(&self) -> Vec<&'static str> {
        M::KEYWORDS
            .iter()
            .copied()
            .filter(|k| self.keywords.contains(*k))
            .collect()
    }

    /// Enabled keywords as shader defs, for pipeline specialization.
    pub fn shader_defs(&self) -> Vec<ShaderDefVal> {
        self.keywords
            .iter()
            .map(|k| ShaderDefVal::Bool(k.to_string(), true))
            .collect()
    }

    pub fn bind_color(&mut self, params: ColorCompositeParams) -> Result<(), CanvasError> {
        self.expect_kind(ProgramKind::Color)?;
        self.params = CompositeParams::Color(params);
        Ok(())
    }

    pub fn bind_normal(&mut self, params: NormalCompositeParams) -> Result<(), CanvasError> {
        self.expect_kind(ProgramKind::Normal)?;
        self.params = CompositeParams::Normal(params);
        Ok(())
    }

    /// Composite `brush` over `source` into `target` with the bound
    /// parameters.
    ///
    /// Every texel of `target` is written: texels outside the stamp footprint
    /// receive the source unchanged. `source` and `target` must be distinct
    /// images of equal size.
    pub fn render(
        &self,
        source: &Image,
        brush: BrushImages<'_>,
        target: &mut Image,
    ) -> Result<(), CanvasError> {
        let size = image_size(source);
        let target_size = image_size(target);
        if size != target_size {
            return Err(CanvasError::SizeMismatch {
                expected: target_size,
                found: size,
            });
        }

        let src = pixels(source)?;
        match &self.params {
            CompositeParams::Unbound => Err(CanvasError::ProgramUnbound {
                label: self.label.to_string(),
            }),
            CompositeParams::Color(params) => {
                let mask = brush.mask.ok_or(CanvasError::MissingBrushTexture)?;
                let stamp = kernel::Stamp::new(pixels(mask)?, image_size(mask));
                kernel::composite_color(src, size, stamp, params, pixels_mut(target)?);
                Ok(())
            }
            CompositeParams::Normal(params) => {
                let normal = brush.normal.ok_or(CanvasError::MissingBrushTexture)?;
                let normal_stamp = kernel::Stamp::new(pixels(normal)?, image_size(normal));
                let mask_stamp = match brush.mask {
                    Some(mask) => Some(kernel::Stamp::new(pixels(mask)?, image_size(mask))),
                    None => None,
                };
                kernel::composite_normal(
                    src,
                    size,
                    mask_stamp,
                    normal_stamp,
                    params,
                    pixels_mut(target)?,
                );
                Ok(())
            }
        }
    }

    pub(crate) fn expect_kind(&self, expected: ProgramKind) -> Result<(), CanvasError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(CanvasError::ProgramKindMismatch {
                expected,
                found: self.kind,
            })
        }
    }
}
