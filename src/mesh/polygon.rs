//! Convex planar polygons, the unit of work of the BSP boolean.

use crate::aabb::Aabb;
use crate::float_types::Real;
use crate::mesh::plane::Plane;
use crate::mesh::vertex::Vertex;
use nalgebra::{Matrix4, Point3};

/// A convex polygon, defined by a list of vertices and its supporting plane.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,
}

impl Polygon {
    /// Create a polygon from vertices, or `None` when the vertices do not
    /// span a plane.
    pub fn new(vertices: Vec<Vertex>) -> Option<Self> {
        let plane = Plane::from_vertices(&vertices)?;
        Some(Polygon { vertices, plane })
    }

    /// Polygon from a loop of points; every vertex gets the plane normal.
    pub fn from_points(points: &[Point3<Real>]) -> Option<Self> {
        let vertices: Vec<Vertex> = points
            .iter()
            .map(|p| Vertex::new(*p, nalgebra::Vector3::zeros()))
            .collect();
        let mut polygon = Self::new(vertices)?;
        let normal = polygon.plane.normal();
        polygon.vertices.iter_mut().for_each(|v| v.normal = normal);
        Some(polygon)
    }

    /// Polygon that reuses an already known plane (split fragments).
    pub const fn with_plane(vertices: Vec<Vertex>, plane: Plane) -> Self {
        Polygon { vertices, plane }
    }

    /// Reverses winding order, flips vertices normals, and flips the plane normal
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.vertices.iter_mut().for_each(|v| v.flip());
        self.plane.flip();
    }

    /// Return an iterator over paired vertices each forming an edge of the polygon
    pub fn edges(&self) -> impl Iterator<Item = (&Vertex, &Vertex)> {
        self.vertices
            .iter()
            .zip(self.vertices.iter().cycle().skip(1))
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.pos))
            .unwrap_or_else(|| Aabb::new(Point3::origin(), Point3::origin()))
    }

    /// Contribution of this polygon to the enclosed signed volume
    /// (divergence theorem over a triangle fan).
    pub fn signed_volume(&self) -> Real {
        let Some(first) = self.vertices.first() else {
            return 0.0;
        };
        self.vertices
            .windows(2)
            .skip(1)
            .map(|pair| {
                first
                    .pos
                    .coords
                    .dot(&pair[0].pos.coords.cross(&pair[1].pos.coords))
            })
            .sum::<Real>()
            / 6.0
    }

    /// Apply an affine transform; `normal_mat` is the inverse transpose of `mat`.
    pub fn transform(&mut self, mat: &Matrix4<Real>, normal_mat: &Matrix4<Real>) {
        self.vertices
            .iter_mut()
            .for_each(|v| v.transform(mat, normal_mat));
        if let Some(plane) = self.plane.transformed(mat, normal_mat) {
            self.plane = plane;
        }
    }
}
