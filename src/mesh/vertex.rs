//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::Real;
use nalgebra::{Matrix4, Point3, Vector3};

/// A vertex of a solid polygon, holding position and normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl Vertex {
    /// Create a new [`Vertex`].
    ///
    /// The normal is stored verbatim, so orient it the way the owning
    /// polygon winds.
    pub const fn new(pos: Point3<Real>, normal: Vector3<Real>) -> Self {
        Vertex { pos, normal }
    }

    /// Flip vertex normal
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    ///
    /// Normals are interpolated as well.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        let new_pos = self.pos + (other.pos - self.pos) * t;
        let new_normal = self.normal + (other.normal - self.normal) * t;
        Vertex::new(new_pos, new_normal)
    }

    /// Move the vertex by `mat`, carrying the normal with `normal_mat`
    /// (the inverse transpose of `mat`).
    pub fn transform(&mut self, mat: &Matrix4<Real>, normal_mat: &Matrix4<Real>) {
        self.pos = mat.transform_point(&self.pos);
        let normal = normal_mat.transform_vector(&self.normal);
        if let Some(unit) = normal.try_normalize(Real::EPSILON) {
            self.normal = unit;
        }
    }
}
