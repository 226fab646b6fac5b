//! Turning the polygon soup of a BSP boolean back into an indexed,
//! triangulated boundary.

use crate::errors::GeometryError;
use crate::float_types::{QUANTIZATION_FACTOR, Real};
use crate::mesh::manifold::{QuantizedPoint, faces_are_manifold};
use crate::mesh::polygon::Polygon;
use crate::mesh::{BooleanOperator, ExactMesh};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

/// Distance under which a welded vertex is considered to sit on an edge.
const ON_EDGE: Real = 10.0 / QUANTIZATION_FACTOR;

/// Weld, repair and triangulate `polygons`, then require a closed manifold.
pub(crate) fn from_solid(
    polygons: Vec<Polygon>,
    op: BooleanOperator,
) -> Result<ExactMesh, GeometryError> {
    let mut welded: HashMap<QuantizedPoint, usize> = HashMap::new();
    let mut positions: Vec<Point3<Real>> = Vec::new();
    let mut rings: Vec<(Vec<usize>, Vector3<Real>)> = Vec::with_capacity(polygons.len());

    for polygon in &polygons {
        let mut ring: Vec<usize> = Vec::with_capacity(polygon.vertices.len());
        for vertex in &polygon.vertices {
            let index = *welded
                .entry(QuantizedPoint::new(&vertex.pos))
                .or_insert_with(|| {
                    positions.push(vertex.pos);
                    positions.len() - 1
                });
            if ring.last() != Some(&index) {
                ring.push(index);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() >= 3 {
            rings.push((ring, polygon.plane.normal()));
        }
    }

    if rings.is_empty() {
        return Ok(ExactMesh::default());
    }

    let mut faces: Vec<Vec<usize>> = Vec::new();
    for (ring, normal) in &rings {
        let ring = split_t_junctions(ring, &positions);
        faces.extend(ear_clip(&ring, &positions, normal).into_iter().map(Vec::from));
    }

    let (positions, faces) = compact(positions, faces);
    if !faces_are_manifold(&positions, &faces) {
        return Err(GeometryError::NonManifoldResult(op));
    }
    Ok(ExactMesh::from_parts(positions, faces, None))
}

/// Insert every welded vertex lying inside an edge of `ring` into that edge.
fn split_t_junctions(ring: &[usize], positions: &[Point3<Real>]) -> Vec<usize> {
    let mut out = Vec::with_capacity(ring.len());
    for (k, &a) in ring.iter().enumerate() {
        let b = ring[(k + 1) % ring.len()];
        out.push(a);

        let (pa, pb) = (positions[a], positions[b]);
        let edge = pb - pa;
        let length_sq = edge.norm_squared();
        if length_sq <= ON_EDGE * ON_EDGE {
            continue;
        }
        let margin = ON_EDGE / length_sq.sqrt();

        let mut between: Vec<(Real, usize)> = positions
            .iter()
            .enumerate()
            .filter(|(c, _)| !ring.contains(c))
            .filter_map(|(c, pc)| {
                let t = (pc - pa).dot(&edge) / length_sq;
                if t <= margin || t >= 1.0 - margin {
                    return None;
                }
                let foot = pa + edge * t;
                ((pc - foot).norm() < ON_EDGE).then_some((t, c))
            })
            .collect();
        between.sort_by(|x, y| x.0.total_cmp(&y.0));
        out.extend(between.into_iter().map(|(_, c)| c));
    }
    out
}

/// Triangulate a planar ring wound counter-clockwise around `normal`.
///
/// Only strictly convex ears are cut, so collinear vertices introduced by
/// T-junction repair never end up in a sliver. Falls back to a fan if no
/// ear can be found.
fn ear_clip(ring: &[usize], positions: &[Point3<Real>], normal: &Vector3<Real>) -> Vec<[usize; 3]> {
    let mut remaining = ring.to_vec();
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));

    while remaining.len() > 3 {
        let n = remaining.len();
        let ear = (0..n).find(|&k| {
            let (i0, i1, i2) = (remaining[(k + n - 1) % n], remaining[k], remaining[(k + 1) % n]);
            let (a, b, c) = (positions[i0], positions[i1], positions[i2]);
            if (b - a).cross(&(c - b)).dot(normal) <= ON_EDGE * ON_EDGE {
                return false;
            }
            !remaining
                .iter()
                .filter(|&&i| i != i0 && i != i1 && i != i2)
                .any(|&i| in_triangle(&positions[i], &a, &b, &c, normal))
        });

        match ear {
            Some(k) => {
                triangles.push([remaining[(k + n - 1) % n], remaining[k], remaining[(k + 1) % n]]);
                remaining.remove(k);
            },
            None => {
                for k in 1..n - 1 {
                    triangles.push([remaining[0], remaining[k], remaining[k + 1]]);
                }
                return triangles;
            },
        }
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

/// Closed point-in-triangle test in the plane with the given normal.
fn in_triangle(
    p: &Point3<Real>,
    a: &Point3<Real>,
    b: &Point3<Real>,
    c: &Point3<Real>,
    normal: &Vector3<Real>,
) -> bool {
    let eps = -(ON_EDGE * ON_EDGE);
    (b - a).cross(&(p - a)).dot(normal) >= eps
        && (c - b).cross(&(p - b)).dot(normal) >= eps
        && (a - c).cross(&(p - c)).dot(normal) >= eps
}

/// Drop unreferenced vertices and renumber faces.
fn compact(
    positions: Vec<Point3<Real>>,
    faces: Vec<Vec<usize>>,
) -> (Vec<Point3<Real>>, Vec<Vec<usize>>) {
    let mut remap: Vec<Option<usize>> = vec![None; positions.len()];
    let mut kept = Vec::with_capacity(positions.len());
    let faces = faces
        .into_iter()
        .map(|face| {
            face.into_iter()
                .map(|i| {
                    *remap[i].get_or_insert_with(|| {
                        kept.push(positions[i]);
                        kept.len() - 1
                    })
                })
                .collect()
        })
        .collect();
    (kept, faces)
}
