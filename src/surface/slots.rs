//! Material texture slots a canvas redirects to its surfaces.

use std::str::FromStr;

use bevy::prelude::*;
use thiserror::Error;

/// A texture binding on [`StandardMaterial`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum TextureSlot {
    #[default]
    BaseColor,
    NormalMap,
    Emissive,
    MetallicRoughness,
    Occlusion,
}

/// Returned when a slot name does not match any [`TextureSlot`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown texture slot '{0}'")]
pub struct UnknownTextureSlot(pub String);

impl TextureSlot {
    /// Field name of this slot on [`StandardMaterial`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::BaseColor => "base_color_texture",
            Self::NormalMap => "normal_map_texture",
            Self::Emissive => "emissive_texture",
            Self::MetallicRoughness => "metallic_roughness_texture",
            Self::Occlusion => "occlusion_texture",
        }
    }

    /// Texture currently bound to this slot.
    pub fn get(self, material: &StandardMaterial) -> Option<&Handle<Image>> {
        self.field(material).as_ref()
    }

    /// Point this slot at `texture`.
    pub fn bind(self, material: &mut StandardMaterial, texture: Option<Handle<Image>>) {
        *self.field_mut(material) = texture;
    }

    fn field(self, material: &StandardMaterial) -> &Option<Handle<Image>> {
        match self {
            Self::BaseColor => &material.base_color_texture,
            Self::NormalMap => &material.normal_map_texture,
            Self::Emissive => &material.emissive_texture,
            Self::MetallicRoughness => &material.metallic_roughness_texture,
            Self::Occlusion => &material.occlusion_texture,
        }
    }

    fn field_mut(self, material: &mut StandardMaterial) -> &mut Option<Handle<Image>> {
        match self {
            Self::BaseColor => &mut material.base_color_texture,
            Self::NormalMap => &mut material.normal_map_texture,
            Self::Emissive => &mut material.emissive_texture,
            Self::MetallicRoughness => &mut material.metallic_roughness_texture,
            Self::Occlusion => &mut material.occlusion_texture,
        }
    }
}

impl FromStr for TextureSlot {
    type Err = UnknownTextureSlot;

    /// Accepts the material field name, with or without the `_texture`
    /// suffix (`"base_color_texture"`, `"normal_map"`, ...).
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let trimmed = name.trim();
        let key = trimmed.strip_suffix("_texture").unwrap_or(trimmed);
        match key {
            "base_color" => Ok(Self::BaseColor),
            "normal_map" => Ok(Self::NormalMap),
            "emissive" => Ok(Self::Emissive),
            "metallic_roughness" => Ok(Self::MetallicRoughness),
            "occlusion" => Ok(Self::Occlusion),
            _ => Err(UnknownTextureSlot(name.to_string())),
        }
    }
}

/// Which material slots hold the paintable color and normal textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct CanvasSlots {
    pub color: TextureSlot,
    pub normal: TextureSlot,
}

impl Default for CanvasSlots {
    fn default() -> Self {
        Self {
            color: TextureSlot::BaseColor,
            normal: TextureSlot::NormalMap,
        }
    }
}

impl CanvasSlots {
    /// Resolve slot names, e.g. from a scene or config file.
    pub fn from_names(color: &str, normal: &str) -> Result<Self, UnknownTextureSlot> {
        Ok(Self {
            color: color.parse()?,
            normal: normal.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot_names() {
        assert_eq!("base_color_texture".parse(), Ok(TextureSlot::BaseColor));
        assert_eq!("normal_map".parse(), Ok(TextureSlot::NormalMap));
        assert_eq!(" emissive_texture ".parse(), Ok(TextureSlot::Emissive));
        assert_eq!(
            "_MainTex".parse::<TextureSlot>(),
            Err(UnknownTextureSlot("_MainTex".to_string()))
        );
    }

    #[test]
    fn test_slot_name_parses_back() {
        for slot in [
            TextureSlot::BaseColor,
            TextureSlot::NormalMap,
            TextureSlot::Emissive,
            TextureSlot::MetallicRoughness,
            TextureSlot::Occlusion,
        ] {
            assert_eq!(slot.name().parse(), Ok(slot));
        }
    }

    #[test]
    fn test_bind_and_get() {
        let mut material = StandardMaterial::default();
        let handle: Handle<Image> = Handle::default();

        TextureSlot::Emissive.bind(&mut material, Some(handle.clone()));

        assert_eq!(TextureSlot::Emissive.get(&material), Some(&handle));
        assert!(TextureSlot::BaseColor.get(&material).is_none());

        TextureSlot::Emissive.bind(&mut material, None);
        assert!(material.emissive_texture.is_none());
    }

    #[test]
    fn test_canvas_slots_from_names() {
        let slots = CanvasSlots::from_names("emissive", "normal_map_texture").unwrap();
        assert_eq!(slots.color, TextureSlot::Emissive);
        assert_eq!(slots.normal, TextureSlot::NormalMap);

        assert!(CanvasSlots::from_names("albedo", "normal_map").is_err());
    }
}
