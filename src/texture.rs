//! Pixel access helpers for writable RGBA8 paint surfaces.
//!
//! Paint surfaces keep their pixel data in the main world so strokes can be
//! composited on the CPU copy; Bevy re-uploads any image touched through
//! [`Assets::get_mut`](bevy::asset::Assets::get_mut) before the next frame.

use std::borrow::Cow;

use bevy::asset::RenderAssetUsages;
use bevy::color::Srgba;
use bevy::image::Image;
use bevy::math::UVec2;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages};

use crate::error::CanvasError;

/// Format of color surfaces and the scratch buffer used for color passes.
pub const COLOR_SURFACE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// Format of normal surfaces. Normal data is linear.
pub const NORMAL_SURFACE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// Fill value of the placeholder color source (opaque white).
pub const PLACEHOLDER_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Allocate a writable 2D surface filled with `fill`.
pub fn new_surface(size: UVec2, format: TextureFormat, fill: [u8; 4]) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &fill,
        format,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    image.texture_descriptor.usage = TextureUsages::TEXTURE_BINDING
        | TextureUsages::COPY_SRC
        | TextureUsages::COPY_DST
        | TextureUsages::RENDER_ATTACHMENT;
    image
}

/// Width and height of an image.
#[inline]
pub fn image_size(image: &Image) -> UVec2 {
    let size = image.texture_descriptor.size;
    UVec2::new(size.width, size.height)
}

/// Whether `format` stores one RGBA8 texel per four bytes.
pub fn is_rgba8(format: TextureFormat) -> bool {
    matches!(
        format,
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb
    )
}

/// View `image` in `format`, converting when the stored format differs.
///
/// An sRGB-tagged image viewed as linear RGBA8 is relabeled without touching
/// its bytes; normal maps loaded with the default sRGB flag keep their
/// encoded values this way. A linear RGBA8 image viewed as sRGB has its color
/// channels encoded so it decodes to the same values.
pub fn to_surface_format(image: &Image, format: TextureFormat) -> Result<Cow<'_, Image>, CanvasError> {
    let found = image.texture_descriptor.format;
    if found == format {
        return Ok(Cow::Borrowed(image));
    }

    match (found, format) {
        (TextureFormat::Rgba8UnormSrgb, TextureFormat::Rgba8Unorm) => {
            let mut relabeled = image.clone();
            relabeled.texture_descriptor.format = format;
            return Ok(Cow::Owned(relabeled));
        }
        (TextureFormat::Rgba8Unorm, TextureFormat::Rgba8UnormSrgb) => {
            return encode_srgb(image).map(Cow::Owned);
        }
        _ => {}
    }

    if image.data.is_none() {
        return Err(CanvasError::NoPixelData);
    }

    image
        .convert(format)
        .map(Cow::Owned)
        .ok_or(CanvasError::UnsupportedFormat { found })
}

/// Borrow the top mip level of an RGBA8 image as pixels.
pub fn pixels(image: &Image) -> Result<&[[u8; 4]], CanvasError> {
    let count = checked_texel_count(image)?;
    let data = image.data.as_deref().ok_or(CanvasError::NoPixelData)?;
    let texels: &[[u8; 4]] =
        bytemuck::try_cast_slice(data).map_err(|_| CanvasError::NoPixelData)?;
    texels.get(..count).ok_or(CanvasError::NoPixelData)
}

/// Mutably borrow the top mip level of an RGBA8 image as pixels.
pub fn pixels_mut(image: &mut Image) -> Result<&mut [[u8; 4]], CanvasError> {
    let count = checked_texel_count(image)?;
    let data = image.data.as_deref_mut().ok_or(CanvasError::NoPixelData)?;
    let texels: &mut [[u8; 4]] =
        bytemuck::try_cast_slice_mut(data).map_err(|_| CanvasError::NoPixelData)?;
    texels.get_mut(..count).ok_or(CanvasError::NoPixelData)
}

/// Full-frame copy of `source` into `target`.
///
/// Both images must share dimensions and be RGBA8.
pub fn blit(source: &Image, target: &mut Image) -> Result<(), CanvasError> {
    let expected = image_size(target);
    let found = image_size(source);
    if expected != found {
        return Err(CanvasError::SizeMismatch { expected, found });
    }

    let src = pixels(source)?;
    let dst = pixels_mut(target)?;
    dst.copy_from_slice(src);
    Ok(())
}

/// Copy of a linear RGBA8 image with its color channels sRGB-encoded.
/// Alpha is linear in both formats and is copied as is.
fn encode_srgb(image: &Image) -> Result<Image, CanvasError> {
    let table: [u8; 256] = std::array::from_fn(|value| {
        let encoded = Srgba::gamma_function_inverse(value as f32 / 255.0);
        (encoded.clamp(0.0, 1.0) * 255.0).round() as u8
    });

    let mut encoded = image.clone();
    encoded.texture_descriptor.format = TextureFormat::Rgba8UnormSrgb;
    for texel in pixels_mut(&mut encoded)? {
        for channel in &mut texel[..3] {
            *channel = table[*channel as usize];
        }
    }
    Ok(encoded)
}

fn checked_texel_count(image: &Image) -> Result<usize, CanvasError> {
    let format = image.texture_descriptor.format;
    if !is_rgba8(format) {
        return Err(CanvasError::UnsupportedFormat { found: format });
    }
    let size = image_size(image);
    Ok(size.x as usize * size.y as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_filled() {
        let image = new_surface(UVec2::new(4, 2), COLOR_SURFACE_FORMAT, [1, 2, 3, 4]);

        assert_eq!(image_size(&image), UVec2::new(4, 2));
        let texels = pixels(&image).unwrap();
        assert_eq!(texels.len(), 8);
        assert!(texels.iter().all(|p| *p == [1, 2, 3, 4]));
        assert!(
            image
                .texture_descriptor
                .usage
                .contains(TextureUsages::RENDER_ATTACHMENT)
        );
    }

    #[test]
    fn test_blit_copies_every_texel() {
        let source = new_surface(UVec2::new(8, 8), COLOR_SURFACE_FORMAT, [9, 8, 7, 255]);
        let mut target = new_surface(UVec2::new(8, 8), COLOR_SURFACE_FORMAT, [0; 4]);

        blit(&source, &mut target).unwrap();

        assert_eq!(target.data, source.data);
    }

    #[test]
    fn test_blit_rejects_size_mismatch() {
        let source = new_surface(UVec2::new(8, 8), COLOR_SURFACE_FORMAT, [0; 4]);
        let mut target = new_surface(UVec2::new(4, 8), COLOR_SURFACE_FORMAT, [0; 4]);

        let err = blit(&source, &mut target).unwrap_err();
        assert_eq!(
            err,
            CanvasError::SizeMismatch {
                expected: UVec2::new(4, 8),
                found: UVec2::new(8, 8),
            }
        );
    }

    #[test]
    fn test_srgb_relabel_keeps_bytes() {
        let image = new_surface(UVec2::new(2, 2), COLOR_SURFACE_FORMAT, [128, 128, 255, 255]);

        let linear = to_surface_format(&image, NORMAL_SURFACE_FORMAT).unwrap();

        assert_eq!(linear.texture_descriptor.format, NORMAL_SURFACE_FORMAT);
        assert_eq!(linear.data, image.data);
    }

    #[test]
    fn test_linear_color_is_encoded() {
        let image = new_surface(UVec2::new(2, 2), NORMAL_SURFACE_FORMAT, [0, 128, 255, 77]);

        let srgb = to_surface_format(&image, COLOR_SURFACE_FORMAT).unwrap();

        assert_eq!(srgb.texture_descriptor.format, COLOR_SURFACE_FORMAT);
        let texel = pixels(&srgb).unwrap()[0];
        assert_eq!(texel[0], 0);
        assert_eq!(texel[1], 188);
        assert_eq!(texel[2], 255);
        assert_eq!(texel[3], 77);
    }

    #[test]
    fn test_pixels_rejects_non_rgba8() {
        let image = Image::new_fill(
            Extent3d {
                width: 2,
                height: 2,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &[0; 2],
            TextureFormat::Rg8Unorm,
            RenderAssetUsages::MAIN_WORLD,
        );

        assert!(matches!(
            pixels(&image),
            Err(CanvasError::UnsupportedFormat { .. })
        ));
    }
}
