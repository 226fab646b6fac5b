use crate::float_types::{QUANTIZATION_FACTOR, Real};
use crate::mesh::ExactMesh;
use hashbrown::HashMap;
use nalgebra::Point3;

/// Position snapped to the welding lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct QuantizedPoint(i64, i64, i64);

impl QuantizedPoint {
    pub(crate) fn new(p: &Point3<Real>) -> Self {
        QuantizedPoint(
            (p.x * QUANTIZATION_FACTOR).round() as i64,
            (p.y * QUANTIZATION_FACTOR).round() as i64,
            (p.z * QUANTIZATION_FACTOR).round() as i64,
        )
    }
}

/// `true` when every edge of the face loops is shared by exactly two faces
/// that traverse it in opposite directions.
pub(crate) fn faces_are_manifold(vertices: &[Point3<Real>], faces: &[Vec<usize>]) -> bool {
    if faces.is_empty() {
        return false;
    }
    let keys: Vec<QuantizedPoint> = vertices.iter().map(QuantizedPoint::new).collect();
    let mut edge_counts: HashMap<(QuantizedPoint, QuantizedPoint), u32> = HashMap::new();

    for face in faces {
        for (k, &i0) in face.iter().enumerate() {
            let i1 = face[(k + 1) % face.len()];
            let (p0, p1) = (keys[i0], keys[i1]);
            if p0 == p1 {
                // zero-length edge
                return false;
            }
            let count = edge_counts.entry((p0, p1)).or_insert(0);
            *count += 1;
            if *count > 1 {
                // two faces run the same way along this edge
                return false;
            }
        }
    }

    edge_counts
        .keys()
        .all(|&(p0, p1)| edge_counts.contains_key(&(p1, p0)))
}

impl ExactMesh {
    /// Checks if the boundary is a closed manifold.
    ///
    /// ### Returns
    /// Returns `true` if every edge appears exactly 2 times, once in each
    /// direction.
    ///
    /// ### Notes:
    /// - Opposite traversal also means neighbouring faces agree on orientation.
    /// - Zero-length edges make the surface non-manifold.
    /// - Positions are compared after snapping with `QUANTIZATION_FACTOR`.
    pub fn is_manifold(&self) -> bool {
        faces_are_manifold(self.vertices(), self.faces())
    }
}
