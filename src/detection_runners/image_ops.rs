//! Frame to model-input conversion.

use anyhow::{bail, Result};
use fast_image_resize::{images::Image as FirImage, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{imageops, RgbImage};
use ndarray::Array4;
use crate::data::{FrameFit, PreprocessConfig};

/// Builds the `[1, height, width, 3]` input tensor for one RGB frame.
///
/// Frames already at the model size are used as-is, others are cropped or
/// resized according to `config.fit`. Every channel value becomes
/// `(v - mean) / std`.
pub fn prepare_input(frame: &RgbImage, config: &PreprocessConfig) -> Result<Array4<f32>> {
    let (width, height) = (config.width, config.height);

    let pixels = if frame.dimensions() == (width, height) {
        frame.as_raw().clone()
    } else {
        match config.fit {
            FrameFit::Crop => crop_top_left(frame, width, height)?.into_raw(),
            FrameFit::Resize => resize_image(frame, width, height)?,
        }
    };

    let (mean, std) = (config.mean, config.std);
    let values: Vec<f32> = pixels.iter().map(|&v| (v as f32 - mean) / std).collect();
    let input = Array4::from_shape_vec((1, height as usize, width as usize, 3), values)?;
    Ok(input)
}

/// Keeps the region starting at the top-left pixel, top row first.
fn crop_top_left(frame: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (w0, h0) = frame.dimensions();
    if w0 < width || h0 < height {
        bail!("Frame {}x{} is smaller than the model input {}x{}", w0, h0, width, height);
    }
    Ok(imageops::crop_imm(frame, 0, 0, width, height).to_image())
}

fn resize_image(frame: &RgbImage, width: u32, height: u32) -> Result<Vec<u8>> {
    let (w0, h0) = frame.dimensions();
    let src = FirImage::from_vec_u8(w0, h0, frame.as_raw().clone(), PixelType::U8x3)?;
    let mut dst = FirImage::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut resizer = Resizer::new();
    resizer.resize(&src, &mut dst, &options)?;

    Ok(dst.buffer().to_vec())
}
