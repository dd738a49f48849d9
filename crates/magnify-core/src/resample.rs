//! Local upscaling with the `image` crate's resampling filters.
//!
//! The kernels themselves belong to `image::imageops`; this module only
//! picks a filter per [`Method`], resizes by an integer factor, and
//! encodes the result as PNG so it can be displayed and downloaded.

use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder};

use crate::source::SourceImage;
use crate::types::{Dimensions, Method, ScaleFactor, UpscaleError, UpscaledImage};

/// Resampling filter for a local method.
///
/// Returns `None` for [`Method::Ai`], which has no local counterpart.
#[must_use]
pub const fn filter_for(method: Method) -> Option<FilterType> {
    match method {
        // Smoothing disabled.
        Method::Nearest => Some(FilterType::Nearest),
        Method::Bilinear => Some(FilterType::Triangle),
        Method::Bicubic => Some(FilterType::CatmullRom),
        Method::Ai => None,
    }
}

/// Decode raw image bytes.
///
/// # Errors
///
/// Returns [`UpscaleError::EmptyInput`] if `bytes` is empty and
/// [`UpscaleError::Decode`] if the data is not a supported image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, UpscaleError> {
    if bytes.is_empty() {
        return Err(UpscaleError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Resize `image` to exactly `scale` times its size on both axes.
///
/// # Errors
///
/// Returns [`UpscaleError::TooLarge`] if the output size overflows.
pub fn upscale_image(
    image: &DynamicImage,
    filter: FilterType,
    scale: ScaleFactor,
) -> Result<DynamicImage, UpscaleError> {
    let dimensions = Dimensions::new(image.width(), image.height());
    let target = dimensions
        .scaled(scale)
        .ok_or(UpscaleError::TooLarge { dimensions, scale })?;
    Ok(image.resize_exact(target.width, target.height, filter))
}

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns [`UpscaleError::Encode`] if PNG encoding fails.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, UpscaleError> {
    let rgba = image.to_rgba8();
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| UpscaleError::Encode(e.to_string()))?;
    Ok(png_bytes)
}

/// Upscale a source image locally and encode the result as PNG.
///
/// # Errors
///
/// Returns [`UpscaleError::Decode`] / [`UpscaleError::EmptyInput`] for an
/// undecodable source, [`UpscaleError::TooLarge`] on size overflow, and
/// [`UpscaleError::Encode`] if PNG encoding fails. Calling this with
/// [`Method::Ai`] is a programming error reported as
/// [`UpscaleError::Encode`].
pub fn resample_local(
    source: &SourceImage,
    method: Method,
    scale: ScaleFactor,
) -> Result<UpscaledImage, UpscaleError> {
    let filter = filter_for(method)
        .ok_or_else(|| UpscaleError::Encode(format!("{method} has no local resampler")))?;

    let decoded = decode(source.bytes())?;
    let original_dimensions = Dimensions::new(decoded.width(), decoded.height());
    let upscaled = upscale_image(&decoded, filter, scale)?;
    let upscaled_dimensions = Dimensions::new(upscaled.width(), upscaled.height());
    let bytes = encode_png(&upscaled)?;

    Ok(UpscaledImage {
        source: source.clone(),
        method,
        original_dimensions,
        upscaled_dimensions,
        bytes,
        mime_type: "image/png".to_owned(),
    })
}
