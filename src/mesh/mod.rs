//! `ExactMesh`: an indexed boundary representation paired with a lazily
//! derived BSP solid used for boolean combination.

use crate::aabb::Aabb;
use crate::errors::GeometryError;
use crate::float_types::Real;
use crate::mesh::bsp::Node;
use crate::mesh::polygon::Polygon;
use crate::traits::CSGOps;
use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

pub mod boundary;
pub mod bsp;
#[cfg(feature = "parallel")]
pub mod bsp_parallel;
pub mod manifold;
pub mod plane;
pub mod polygon;
pub mod vertex;

/// Boolean operator codes, numbered as they are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOperator {
    Difference = 0,
    Intersection = 1,
    Union = 2,
}

impl BooleanOperator {
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Operator for a persisted code, `None` for unknown codes.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(BooleanOperator::Difference),
            1 => Some(BooleanOperator::Intersection),
            2 => Some(BooleanOperator::Union),
            _ => None,
        }
    }
}

/// Parametric shapes that build their own boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Prism,
    Cylinder,
}

/// Flat copy of a mesh boundary: positions plus faces as index loops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Point3<Real>>,
    pub faces: Vec<Vec<usize>>,
}

/// A closed polyhedral surface.
///
/// `vertices`/`faces` hold the boundary representation. The solid used by
/// the boolean operations is derived from it on first use and cached; it is
/// always oriented outward. Cloning deep-copies both.
#[derive(Debug, Clone, Default)]
pub struct ExactMesh {
    vertices: Vec<Point3<Real>>,
    faces: Vec<Vec<usize>>,

    /// Lazily derived convex polygons fed to the BSP tree.
    solid: OnceLock<Vec<Polygon>>,

    /// Lazily evaluated closed-manifold test.
    simple: OnceLock<bool>,

    /// Lazily calculated AABB that spans `vertices`.
    bounding_box: OnceLock<Aabb>,
}

impl ExactMesh {
    /// Append a vertex, returning its index.
    pub fn add_vertex(&mut self, point: Point3<Real>) -> usize {
        self.vertices.push(point);
        self.invalidate_caches();
        self.vertices.len() - 1
    }

    /// Append a face given as a loop of vertex indices.
    pub fn add_face(&mut self, face: Vec<usize>) -> Result<(), GeometryError> {
        let face_index = self.faces.len();
        if face.len() < 3 {
            return Err(GeometryError::InvalidGeometry {
                face: face_index,
                vertices: face.len(),
            });
        }
        if let Some(&index) = face.iter().find(|&&i| i >= self.vertices.len()) {
            return Err(GeometryError::FaceIndexOutOfRange {
                face: face_index,
                index,
                vertex_count: self.vertices.len(),
            });
        }
        self.faces.push(face);
        self.invalidate_caches();
        Ok(())
    }

    /// Build a closed surface from explicit vertex and face lists.
    ///
    /// Degenerate faces fail with [`GeometryError::InvalidGeometry`]. A surface
    /// that is not closed and manifold is still returned, flagged by
    /// [`ExactMesh::is_simple`] and reported through `tracing`.
    pub fn from_primitive(
        kind: PrimitiveKind,
        vertices: Vec<Point3<Real>>,
        faces: Vec<Vec<usize>>,
    ) -> Result<ExactMesh, GeometryError> {
        let mesh = Self::from_faces(vertices, faces).inspect_err(|error| {
            warn!(?kind, %error, "primitive rejected");
        })?;
        if !mesh.is_simple() {
            warn!(?kind, faces = mesh.faces.len(), "surface is not simple, booleans on it are undefined");
        }
        Ok(mesh)
    }

    /// Same as [`ExactMesh::from_primitive`] without the diagnostics, for
    /// surfaces of unknown origin.
    pub fn from_faces(
        vertices: Vec<Point3<Real>>,
        faces: Vec<Vec<usize>>,
    ) -> Result<ExactMesh, GeometryError> {
        let mut mesh = ExactMesh {
            vertices,
            ..Default::default()
        };
        mesh.faces.reserve(faces.len());
        for face in faces {
            mesh.add_face(face)?;
        }
        Ok(mesh)
    }

    fn invalidate_caches(&mut self) {
        self.solid = OnceLock::new();
        self.simple = OnceLock::new();
        self.bounding_box = OnceLock::new();
    }

    pub fn vertices(&self) -> &[Point3<Real>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh without faces encloses nothing.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// `true` when the boundary is a closed, consistently oriented 2-manifold.
    pub fn is_simple(&self) -> bool {
        *self.simple.get_or_init(|| self.is_manifold())
    }

    /// Fresh copies of the boundary, owned by the caller.
    pub fn extract_buffers(&self) -> MeshBuffers {
        MeshBuffers {
            positions: self.vertices.clone(),
            faces: self.faces.clone(),
        }
    }

    /// Points of face `face` in winding order.
    pub fn face_points(&self, face: usize) -> impl Iterator<Item = &Point3<Real>> + '_ {
        self.faces
            .get(face)
            .into_iter()
            .flatten()
            .map(|&i| &self.vertices[i])
    }

    /// Signed enclosed volume; negative when the faces wind inward.
    pub fn signed_volume(&self) -> Real {
        self.faces
            .iter()
            .map(|face| {
                let origin = self.vertices[face[0]].coords;
                face.windows(2)
                    .skip(1)
                    .map(|pair| {
                        origin.dot(
                            &self.vertices[pair[0]]
                                .coords
                                .cross(&self.vertices[pair[1]].coords),
                        )
                    })
                    .sum::<Real>()
            })
            .sum::<Real>()
            / 6.0
    }

    /// Enclosed volume regardless of winding.
    pub fn volume(&self) -> Real {
        self.signed_volume().abs()
    }

    /// The solid representation, derived from the boundary on first use.
    pub fn solid(&self) -> &[Polygon] {
        self.solid.get_or_init(|| {
            let mut polygons: Vec<Polygon> = self
                .faces
                .iter()
                .filter_map(|face| {
                    let points: Vec<Point3<Real>> =
                        face.iter().map(|&i| self.vertices[i]).collect();
                    Polygon::from_points(&points)
                })
                .collect();
            let volume: Real = polygons.iter().map(Polygon::signed_volume).sum();
            if volume < 0.0 {
                polygons.iter_mut().for_each(Polygon::flip);
            }
            polygons
        })
    }

    /// Apply a 4x4 affine transform to every vertex.
    ///
    /// A solid that was already derived is transformed in place instead of
    /// being rebuilt from the boundary.
    pub fn apply_transform(&mut self, mat: &Matrix4<Real>) {
        self.vertices
            .iter_mut()
            .for_each(|p| *p = mat.transform_point(p));
        self.bounding_box = OnceLock::new();

        let normal_mat = match mat.try_inverse() {
            Some(inverse) => inverse.transpose(),
            None => {
                warn!("singular transform, solid normals left untouched");
                Matrix4::identity()
            },
        };
        let mirrored = mat.fixed_view::<3, 3>(0, 0).determinant() < 0.0;
        if let Some(solid) = self.solid.get_mut() {
            for polygon in solid.iter_mut() {
                polygon.transform(mat, &normal_mat);
                // a reflection turns outward faces inward
                if mirrored {
                    polygon.flip();
                }
            }
        }
    }

    /// Combine two solids with a boolean operator.
    ///
    /// Problems never abort the edit: a non-simple operand or a result that
    /// cannot be turned back into a closed surface both give an empty mesh
    /// and a warning.
    #[instrument(skip(self, other), fields(left_faces = self.faces.len(), right_faces = other.faces.len()))]
    pub fn boolean_combine(&self, other: &ExactMesh, op: BooleanOperator) -> ExactMesh {
        // an empty operand encloses nothing, no BSP work needed
        match (op, self.is_empty(), other.is_empty()) {
            (BooleanOperator::Union, true, _) => return other.clone(),
            (BooleanOperator::Union | BooleanOperator::Difference, _, true) => return self.clone(),
            (BooleanOperator::Difference, true, _) => return ExactMesh::default(),
            (BooleanOperator::Intersection, true, _) | (BooleanOperator::Intersection, _, true) => {
                return ExactMesh::default();
            },
            _ => {},
        }

        for (side, operand) in [("left", self), ("right", other)] {
            if !operand.is_simple() {
                warn!(side, "boolean operand is not a simple surface, result left empty");
                return ExactMesh::default();
            }
        }

        let polygons = match op {
            BooleanOperator::Union => union_polygons(self.solid(), other.solid()),
            BooleanOperator::Difference => difference_polygons(self.solid(), other.solid()),
            BooleanOperator::Intersection => intersection_polygons(self.solid(), other.solid()),
        };

        match boundary::from_solid(polygons, op) {
            // a shell that encloses nothing, e.g. coincident faces of A - A
            Ok(mesh) if mesh.volume() <= crate::float_types::tolerance() => {
                debug!(faces = mesh.face_count(), "boolean result encloses no volume");
                ExactMesh::default()
            },
            Ok(mesh) => {
                debug!(vertices = mesh.vertex_count(), faces = mesh.face_count(), "boolean result");
                mesh
            },
            Err(error) => {
                warn!(%error, "boolean result discarded");
                ExactMesh::default()
            },
        }
    }

    /// Assemble a mesh from already validated parts.
    pub(crate) fn from_parts(
        vertices: Vec<Point3<Real>>,
        faces: Vec<Vec<usize>>,
        solid: Option<Vec<Polygon>>,
    ) -> ExactMesh {
        let mesh = ExactMesh {
            vertices,
            faces,
            ..Default::default()
        };
        if let Some(solid) = solid {
            let _ = mesh.solid.set(solid);
        }
        mesh
    }
}

/// Split polygons into (may_touch, cannot_touch) using bounding‑box tests
fn partition_polys(polys: &[Polygon], other_bb: Option<Aabb>) -> (Vec<Polygon>, Vec<Polygon>) {
    let Some(other_bb) = other_bb else {
        return (Vec::new(), polys.to_vec());
    };
    let other_bb = other_bb.loosened(crate::float_types::tolerance());
    polys
        .iter()
        .cloned()
        .partition(|p| p.bounding_box().intersects(&other_bb))
}

fn solid_bounds(polys: &[Polygon]) -> Option<Aabb> {
    Aabb::from_points(polys.iter().flat_map(|p| p.vertices.iter().map(|v| &v.pos)))
}

fn union_polygons(left: &[Polygon], right: &[Polygon]) -> Vec<Polygon> {
    // avoid splitting obvious non‑intersecting faces
    let (a_clip, a_passthru) = partition_polys(left, solid_bounds(right));
    let (b_clip, b_passthru) = partition_polys(right, solid_bounds(left));

    let mut a = Node::from_polygons(&a_clip);
    let mut b = Node::from_polygons(&b_clip);

    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(&b.all_polygons());

    let mut final_polys = a.all_polygons();
    final_polys.extend(a_passthru);
    final_polys.extend(b_passthru);
    final_polys
}

fn difference_polygons(left: &[Polygon], right: &[Polygon]) -> Vec<Polygon> {
    let (a_clip, a_passthru) = partition_polys(left, solid_bounds(right));
    let (b_clip, _b_passthru) = partition_polys(right, solid_bounds(left));

    let mut a = Node::from_polygons(&a_clip);
    let mut b = Node::from_polygons(&b_clip);

    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(&b.all_polygons());
    a.invert();

    let mut final_polys = a.all_polygons();
    final_polys.extend(a_passthru);
    final_polys
}

fn intersection_polygons(left: &[Polygon], right: &[Polygon]) -> Vec<Polygon> {
    let mut a = Node::from_polygons(left);
    let mut b = Node::from_polygons(right);

    a.invert();
    b.clip_to(&a);
    b.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    a.build(&b.all_polygons());
    a.invert();

    a.all_polygons()
}

impl CSGOps for ExactMesh {
    fn new() -> Self {
        ExactMesh::default()
    }

    /// ```text
    /// let c = a.union(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |       +----+
    ///     +----+--+    |       +----+       |
    ///          |   b   |            |   c   |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    fn union(&self, other: &ExactMesh) -> ExactMesh {
        self.boolean_combine(other, BooleanOperator::Union)
    }

    /// ```text
    /// let c = a.difference(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |    +--+
    ///     +----+--+    |       +----+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn difference(&self, other: &ExactMesh) -> ExactMesh {
        self.boolean_combine(other, BooleanOperator::Difference)
    }

    /// ```text
    /// let c = a.intersection(b);
    ///     +-------+
    ///     |       |
    ///     |   a   |
    ///     |    +--+----+   =   +--+
    ///     +----+--+    |       +--+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn intersection(&self, other: &ExactMesh) -> ExactMesh {
        self.boolean_combine(other, BooleanOperator::Intersection)
    }

    fn transform(&self, mat: &Matrix4<Real>) -> ExactMesh {
        let mut mesh = self.clone();
        mesh.apply_transform(mat);
        mesh
    }

    fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            Aabb::from_points(&self.vertices)
                .unwrap_or_else(|| Aabb::new(Point3::origin(), Point3::origin()))
        })
    }

    fn invalidate_bounding_box(&mut self) {
        self.bounding_box = OnceLock::new();
    }

    /// Flip inside vs. outside by reversing every face.
    fn inverse(&self) -> ExactMesh {
        let faces = self
            .faces
            .iter()
            .map(|face| face.iter().rev().copied().collect())
            .collect();
        ExactMesh::from_parts(self.vertices.clone(), faces, None)
    }
}
