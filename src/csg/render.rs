//! Flat line/triangle/normal lists derived from a mesh for display.

use crate::float_types::Real;
use crate::mesh::ExactMesh;
use nalgebra::{Matrix3, Point3, Vector3};
use tracing::error;

/// Flat-shaded render data for one entity, in entity-local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderBuffers {
    /// Segment end points, two per face edge. Shared edges appear twice.
    pub lines: Vec<Point3<Real>>,
    /// Three points per triangle.
    pub triangles: Vec<Point3<Real>>,
    /// One normal per entry of `triangles`.
    pub normals: Vec<Vector3<Real>>,
}

impl RenderBuffers {
    /// Derive wireframe and solid buffers for `mesh`.
    ///
    /// Triangles and normals are left empty, and an error is logged, if any
    /// face is not a triangle.
    pub fn from_mesh(mesh: &ExactMesh, name: &str) -> Self {
        let vertices = mesh.vertices();
        let faces = mesh.faces();

        let lines = faces
            .iter()
            .flat_map(|face| {
                (0..face.len()).flat_map(move |k| {
                    [vertices[face[k]], vertices[face[(k + 1) % face.len()]]]
                })
            })
            .collect();

        if faces.iter().any(|face| face.len() != 3) {
            error!(entity = name, "cannot generate triangles because a face is not triangular");
            return RenderBuffers {
                lines,
                ..Default::default()
            };
        }

        let mut triangles = Vec::with_capacity(faces.len() * 3);
        let mut normals = Vec::with_capacity(faces.len() * 3);
        for face in faces {
            let (v1, v2, v3) = (vertices[face[0]], vertices[face[1]], vertices[face[2]]);
            let normal = flat_normal(&v1, &v2, &v3);
            triangles.extend([v1, v2, v3]);
            normals.extend([normal; 3]);
        }

        RenderBuffers {
            lines,
            triangles,
            normals,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.triangles.is_empty()
    }
}

/// Face normal, negated when the vertex matrix has a negative determinant.
fn flat_normal(v1: &Point3<Real>, v2: &Point3<Real>, v3: &Point3<Real>) -> Vector3<Real> {
    let e1 = (v2 - v1).normalize();
    let e2 = (v3 - v1).normalize();
    let normal = e1.cross(&e2).normalize();
    let det = Matrix3::from_columns(&[v1.coords, v2.coords, v3.coords]).determinant();
    if det < 0.0 { -normal } else { normal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::primitive::{Prism, Primitive};

    #[test]
    fn prism_buffers() {
        let mesh = Prism::new(2.0).mesh().expect("prism");
        let buffers = RenderBuffers::from_mesh(&mesh, "Prism");
        assert_eq!(buffers.lines.len(), 12 * 3 * 2);
        assert_eq!(buffers.triangle_count(), 12);
        assert_eq!(buffers.normals.len(), buffers.triangles.len());
    }

    #[test]
    fn quad_face_empties_triangles_but_keeps_lines() {
        let mesh = ExactMesh::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2, 3]],
        )
        .expect("quad");
        let buffers = RenderBuffers::from_mesh(&mesh, "quad");
        assert_eq!(buffers.lines.len(), 8);
        assert!(buffers.triangles.is_empty());
        assert!(buffers.normals.is_empty());
    }

    #[test]
    fn normal_flips_with_negative_determinant() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::new(0.0, 1.0, 0.0);
        let c = Point3::new(0.0, 0.0, 1.0);
        let n = flat_normal(&a, &b, &c);
        assert!(n.x > 0.0);
        let flipped = flat_normal(&a, &c, &b);
        assert!(flipped.x > 0.0);
    }
}
