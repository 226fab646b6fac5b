//! Silhouette detection on solid renderings of the scene.

use crate::stipple::dither::to_grayscale;
use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDetectionMethod {
    #[default]
    Sobel,
    Canny,
}

/// Hysteresis thresholds used by [`canny`] when called through [`detect_edges`].
pub const CANNY_LOW: i32 = 50;
pub const CANNY_HIGH: i32 = 150;

/// Edge mask of an RGB rendering; non-zero pixels are edges.
pub fn detect_edges(img: &RgbImage, method: EdgeDetectionMethod) -> GrayImage {
    let gray = to_grayscale(img);
    match method {
        EdgeDetectionMethod::Sobel => sobel(&gray),
        EdgeDetectionMethod::Canny => canny(&gray, CANNY_LOW, CANNY_HIGH),
    }
}

/// Mirror an out-of-range index back inside `0..n` without repeating the
/// border pixel.
const fn reflect_101(i: i64, n: i64) -> u32 {
    if n <= 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= n {
        i = 2 * n - 2 - i;
    }
    i as u32
}

/// Horizontal and vertical 3x3 Sobel responses at every pixel.
fn gradients(img: &GrayImage) -> (Vec<i32>, Vec<i32>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let at = |x: i64, y: i64| i32::from(img.get_pixel(reflect_101(x, w), reflect_101(y, h))[0]);

    let mut gx = Vec::with_capacity((w * h) as usize);
    let mut gy = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            gx.push(
                (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1)),
            );
            gy.push(
                (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1)),
            );
        }
    }
    (gx, gy)
}

/// Average of the saturated absolute Sobel responses.
pub fn sobel(img: &GrayImage) -> GrayImage {
    let (gx, gy) = gradients(img);
    let width = img.width() as usize;
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let k = y as usize * width + x as usize;
        let ax = gx[k].unsigned_abs().min(255) as f64;
        let ay = gy[k].unsigned_abs().min(255) as f64;
        Luma([(0.5 * ax + 0.5 * ay).round() as u8])
    })
}

/// Canny edges: L1 gradient magnitude, non-maximum suppression along four
/// directions, then hysteresis between `low` and `high`.
pub fn canny(img: &GrayImage, low: i32, high: i32) -> GrayImage {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let (gx, gy) = gradients(img);
    let magnitude: Vec<i32> = gx.iter().zip(&gy).map(|(x, y)| x.abs() + y.abs()).collect();
    let mag = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
            0
        } else {
            magnitude[y as usize * w + x as usize]
        }
    };

    // tan(22.5°) and tan(67.5°)
    const TAN_22: f64 = 0.414_213_562_373_095;
    const TAN_67: f64 = 2.414_213_562_373_095;

    let mut strong = Vec::new();
    let mut candidate = vec![false; w * h];
    for y in 0..h {
        for x in 0..w {
            let k = y * w + x;
            let m = magnitude[k];
            if m <= low {
                continue;
            }
            let (ax, ay) = (f64::from(gx[k].abs()), f64::from(gy[k].abs()));
            let (xi, yi) = (x as isize, y as isize);
            let (a, b) = if ay <= ax * TAN_22 {
                (mag(xi - 1, yi), mag(xi + 1, yi))
            } else if ay >= ax * TAN_67 {
                (mag(xi, yi - 1), mag(xi, yi + 1))
            } else if (gx[k] < 0) == (gy[k] < 0) {
                (mag(xi - 1, yi - 1), mag(xi + 1, yi + 1))
            } else {
                (mag(xi + 1, yi - 1), mag(xi - 1, yi + 1))
            };
            if m > a && m >= b {
                candidate[k] = true;
                if m > high {
                    strong.push(k);
                }
            }
        }
    }

    let mut edges = vec![false; w * h];
    for &k in &strong {
        edges[k] = true;
    }
    while let Some(k) = strong.pop() {
        let (x, y) = ((k % w) as isize, (k / w) as isize);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if candidate[n] && !edges[n] {
                    edges[n] = true;
                    strong.push(n);
                }
            }
        }
    }

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([if edges[y as usize * w + x as usize] { 255 } else { 0 }])
    })
}
