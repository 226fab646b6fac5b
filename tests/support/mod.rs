//! Test support library
//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use image::{Rgb, RgbImage};
use nalgebra::Point3;
use std::path::PathBuf;
use stipplecsg::ExactMesh;
use stipplecsg::float_types::Real;
use stipplecsg::stipple::classifier::BACKGROUND_MARKER;

/// Colour used for pixels an entity rendering covers.
pub const COVERED: Rgb<u8> = Rgb([0, 200, 0]);

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Axis-aligned box spanning `min..max`, faces wound outward.
pub fn axis_box(min: [Real; 3], max: [Real; 3]) -> ExactMesh {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 == 0 { min[0] } else { max[0] },
            if i & 2 == 0 { min[1] } else { max[1] },
            if i & 4 == 0 { min[2] } else { max[2] },
        )
    };
    let vertices = (0..8).map(corner).collect();
    let faces = vec![
        vec![0, 4, 6, 2],
        vec![1, 3, 7, 5],
        vec![0, 1, 5, 4],
        vec![2, 6, 7, 3],
        vec![0, 2, 3, 1],
        vec![4, 5, 7, 6],
    ];
    ExactMesh::from_faces(vertices, faces).expect("box faces are valid")
}

/// Rendering that covers the columns in `covered` and marks the rest as
/// background.
pub fn column_band(width: u32, height: u32, covered: std::ops::Range<u32>) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if covered.contains(&x) { COVERED } else { BACKGROUND_MARKER }
    })
}

/// A file path inside a per-process scratch directory.
pub fn scratch_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stipplecsg-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("scratch directory");
    dir.join(name)
}
