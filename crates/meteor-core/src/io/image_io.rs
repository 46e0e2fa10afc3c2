use std::path::Path;

use image::{ImageBuffer, ImageFormat, Luma, Rgb};
use ndarray::Array3;

use crate::error::{MeteorError, Result};

/// Save a (height, width, channels) sample grid as PNG.
///
/// Samples are clamped to the range of `bit_depth` (8 → u8, anything deeper
/// → u16). One channel is written as grayscale, three as RGB.
pub fn save_png(data: &Array3<f32>, bit_depth: u8, path: &Path) -> Result<()> {
    let (h, w, channels) = data.dim();
    let (width, height) = (w as u32, h as u32);
    let bad_dims = || MeteorError::InvalidDimensions { width, height };

    match (channels, bit_depth <= 8) {
        (1, true) => {
            let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, to_u8(data))
                .ok_or_else(bad_dims)?;
            img.save_with_format(path, ImageFormat::Png)?;
        }
        (1, false) => {
            let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, to_u16(data))
                .ok_or_else(bad_dims)?;
            img.save_with_format(path, ImageFormat::Png)?;
        }
        (3, true) => {
            let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, to_u8(data))
                .ok_or_else(bad_dims)?;
            img.save_with_format(path, ImageFormat::Png)?;
        }
        (3, false) => {
            let img = ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(width, height, to_u16(data))
                .ok_or_else(bad_dims)?;
            img.save_with_format(path, ImageFormat::Png)?;
        }
        _ => return Err(bad_dims()),
    }
    Ok(())
}

// Array3 iteration is row-major, which is exactly the interleaved pixel order.
fn to_u8(data: &Array3<f32>) -> Vec<u8> {
    data.iter().map(|&v| v.clamp(0.0, 255.0) as u8).collect()
}

fn to_u16(data: &Array3<f32>) -> Vec<u16> {
    data.iter().map(|&v| v.clamp(0.0, 65535.0) as u16).collect()
}

/// Load a PNG written by [`save_png`] back into 8-bit samples, shape
/// (height, width, channels).
pub fn load_png_u8(path: &Path) -> Result<Array3<u8>> {
    let img = image::open(path)?;
    let (data, channels) = match img.color().channel_count() {
        1 => (img.to_luma8().into_raw(), 1),
        _ => (img.to_rgb8().into_raw(), 3),
    };
    let (w, h) = (img.width(), img.height());
    Array3::from_shape_vec((h as usize, w as usize, channels), data).map_err(|_| {
        MeteorError::InvalidDimensions {
            width: w,
            height: h,
        }
    })
}
