//! Grayscale conversion and error-diffusion dithering of the source photo.

use image::{GrayImage, Luma, RgbImage, imageops};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DitheringMethod {
    #[default]
    FloydSteinberg,
    Stucki,
}

/// `(dx, dy, weight)` taps spreading the error to unvisited neighbours.
type Kernel = &'static [(i32, i32, f64)];

const FLOYD_STEINBERG: Kernel = &[
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

const STUCKI: Kernel = &[
    (1, 0, 8.0 / 42.0),
    (2, 0, 4.0 / 42.0),
    (-2, 1, 2.0 / 42.0),
    (-1, 1, 4.0 / 42.0),
    (0, 1, 8.0 / 42.0),
    (1, 1, 4.0 / 42.0),
    (2, 1, 2.0 / 42.0),
    (-2, 2, 1.0 / 42.0),
    (-1, 2, 2.0 / 42.0),
    (0, 2, 4.0 / 42.0),
    (1, 2, 2.0 / 42.0),
    (2, 2, 1.0 / 42.0),
];

/// 8-bit luma of an RGB image.
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    imageops::grayscale(img)
}

pub fn dither(img: &RgbImage, method: DitheringMethod) -> GrayImage {
    let gray = to_grayscale(img);
    match method {
        DitheringMethod::FloydSteinberg => floyd_steinberg(&gray),
        DitheringMethod::Stucki => stucki(&gray),
    }
}

pub fn floyd_steinberg(img: &GrayImage) -> GrayImage {
    diffuse(img, FLOYD_STEINBERG, 1)
}

pub fn stucki(img: &GrayImage) -> GrayImage {
    diffuse(img, STUCKI, 2)
}

/// Binarize: values up to and including `t` become black, the rest white.
pub fn threshold(img: &GrayImage, t: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([if img.get_pixel(x, y)[0] <= t { 0 } else { 255 }])
    })
}

/// Error diffusion over a zero-padded copy, cropped back to the input size.
///
/// Every write to a neighbour is truncated back to 8 bits, so the error
/// carried forward is quantized at each step.
fn diffuse(img: &GrayImage, kernel: Kernel, padding: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut padded = GrayImage::new(width + 2 * padding, height + 2 * padding);
    imageops::replace(&mut padded, img, i64::from(padding), i64::from(padding));

    for y in padding..height + padding {
        for x in padding..width + padding {
            let old = f64::from(padded.get_pixel(x, y)[0]) / 255.0;
            let new = if old >= 0.5 { 1.0 } else { 0.0 };
            padded.put_pixel(x, y, Luma([if old >= 0.5 { 255 } else { 0 }]));
            let error = old - new;

            for &(dx, dy, weight) in kernel {
                let nx = x.wrapping_add_signed(dx);
                let ny = y.wrapping_add_signed(dy);
                let neighbour = padded.get_pixel_mut(nx, ny);
                let value = f64::from(neighbour[0]) / 255.0 + weight * error;
                neighbour[0] = (value * 255.0) as u8;
            }
        }
    }

    imageops::crop_imm(&padded, padding, padding, width, height).to_image()
}
