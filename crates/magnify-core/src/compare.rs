//! Rasterise a before/after comparison frame.
//!
//! Produces the same picture the interactive slider shows: both images
//! fit-centred in a `width` x `height` canvas, the upscaled image to the
//! left of the divider, the original to the right, and a divider line.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::slider::{ContainerRect, FitRect, SliderLayout};
use crate::types::{Dimensions, UpscaleError};

/// Canvas background behind letterboxed images.
const BACKGROUND: Rgba<u8> = Rgba([17, 24, 39, 255]);
/// Divider line colour.
const DIVIDER: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Divider line width in pixels.
const DIVIDER_WIDTH: u32 = 2;

/// Render a comparison frame with the divider at `fraction` (clamped to
/// `[0, 1]`).
///
/// # Errors
///
/// Returns [`UpscaleError::EmptyInput`] if the canvas or either image has
/// a zero dimension.
pub fn render_comparison(
    before: &DynamicImage,
    after: &DynamicImage,
    width: u32,
    height: u32,
    fraction: f64,
) -> Result<RgbaImage, UpscaleError> {
    let rect = ContainerRect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let layout = SliderLayout::compute(
        rect,
        Dimensions::new(before.width(), before.height()),
        Dimensions::new(after.width(), after.height()),
        fraction,
    )
    .ok_or(UpscaleError::EmptyInput)?;

    let before_layer = place(before, layout.before, width, height);
    let after_layer = place(after, layout.after, width, height);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let divider_x = layout.divider_x.round().clamp(0.0, f64::from(width)) as u32;
    let half = DIVIDER_WIDTH / 2;

    let mut output = RgbaImage::new(width, height);
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        *pixel = if x + half >= divider_x && x < divider_x + (DIVIDER_WIDTH - half) {
            DIVIDER
        } else if x < divider_x {
            *after_layer.get_pixel(x, y)
        } else {
            *before_layer.get_pixel(x, y)
        };
    }
    Ok(output)
}

/// Draw `image` scaled into `fit` on a background-filled canvas.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn place(image: &DynamicImage, fit: FitRect, width: u32, height: u32) -> RgbaImage {
    let draw_w = (fit.width.round() as u32).clamp(1, width);
    let draw_h = (fit.height.round() as u32).clamp(1, height);
    let scaled = imageops::resize(&image.to_rgba8(), draw_w, draw_h, FilterType::CatmullRom);

    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
    imageops::overlay(
        &mut canvas,
        &scaled,
        fit.x.round() as i64,
        fit.y.round() as i64,
    );
    canvas
}
