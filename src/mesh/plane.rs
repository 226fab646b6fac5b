//! Oriented planes and the side-of-plane predicate used by the BSP tree.

use crate::float_types::{Real, tolerance};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Matrix4, Point3, Vector3};

// Plane classification bits, combined with `|` over a polygon's vertices
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane `n · p = w` with unit normal `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

impl Plane {
    /// Plane through three points, normal following the right-hand rule
    /// `(p2 - p1) × (p3 - p1)`. Returns `None` for collinear points.
    pub fn from_points(p1: Point3<Real>, p2: Point3<Real>, p3: Point3<Real>) -> Option<Self> {
        let normal = (p2 - p1).cross(&(p3 - p1));
        let normal = normal.try_normalize(Real::EPSILON)?;
        Some(Plane {
            normal,
            w: normal.dot(&p1.coords),
        })
    }

    /// Best-fit plane of a convex polygon: Newell's normal, which does not
    /// depend on which three vertices happen to come first.
    pub fn from_vertices(vertices: &[Vertex]) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let newell = vertices
            .iter()
            .zip(vertices.iter().cycle().skip(1))
            .fold(Vector3::zeros(), |acc, (curr, next)| {
                acc + curr.pos.coords.cross(&next.pos.coords)
            });
        let normal = newell.try_normalize(Real::EPSILON)?;
        let centroid = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.pos.coords)
            / vertices.len() as Real;
        Some(Plane {
            normal,
            w: normal.dot(&centroid),
        })
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    /// Flip the plane (reverse normal and offset)
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Signed distance of `point` from the plane, positive in front.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point with the exact `orient3d` predicate.
    ///
    /// The predicate runs on three points spanning the plane with an
    /// orthonormal basis, so its magnitude is the point's distance and the
    /// tolerance band absorbs round-off from constructed split vertices.
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let p0 = Point3::from(self.normal * self.w);

        let mut u = if self.normal.z.abs() > self.normal.x.abs()
            || self.normal.z.abs() > self.normal.y.abs()
        {
            Vector3::x().cross(&self.normal)
        } else {
            Vector3::z().cross(&self.normal)
        };
        u.normalize_mut();
        let v = self.normal.cross(&u).normalize();

        let point_a = p0;
        let point_b = p0 + u;
        let point_c = p0 + v;

        let sign = robust::orient3d(
            robust::Coord3D { x: point_a.x, y: point_a.y, z: point_a.z },
            robust::Coord3D { x: point_b.x, y: point_b.y, z: point_b.z },
            robust::Coord3D { x: point_c.x, y: point_c.y, z: point_c.z },
            robust::Coord3D { x: point.x, y: point.y, z: point.z },
        );

        // orient3d > 0 means the point is below (a, b, c), i.e. behind the normal
        let band = tolerance() as f64;
        if sign > band {
            BACK
        } else if sign < -band {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Bitmask of the vertex classifications of `polygon`.
    pub fn classify_polygon(&self, polygon: &Polygon) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// Classify another plane's facing relative to this one, used to route
    /// coplanar polygons.
    pub fn orient_plane(&self, other: &Plane) -> i8 {
        if self.normal.dot(&other.normal) > 0.0 {
            FRONT
        } else {
            BACK
        }
    }

    /// Split `polygon` by this plane.
    ///
    /// Returns four buckets:
    /// `(coplanar_front, coplanar_back, front, back)`.
    #[allow(clippy::type_complexity)]
    pub fn split_polygon(
        &self,
        polygon: &Polygon,
    ) -> (Vec<Polygon>, Vec<Polygon>, Vec<Polygon>, Vec<Polygon>) {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(&v.pos))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.orient_plane(&polygon.plane) == FRONT {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let mut split_front = Vec::<Vertex>::new();
                let mut split_back = Vec::<Vertex>::new();
                let count = polygon.vertices.len();

                for i in 0..count {
                    let j = (i + 1) % count;
                    let type_i = types[i];
                    let type_j = types[j];
                    let vertex_i = &polygon.vertices[i];
                    let vertex_j = &polygon.vertices[j];

                    if type_i != BACK {
                        split_front.push(vertex_i.clone());
                    }
                    if type_i != FRONT {
                        split_back.push(vertex_i.clone());
                    }

                    if (type_i | type_j) == SPANNING {
                        let denom = self.normal.dot(&(vertex_j.pos - vertex_i.pos));
                        if denom.abs() > Real::EPSILON {
                            let t = (self.w - self.normal.dot(&vertex_i.pos.coords)) / denom;
                            let vertex_new = vertex_i.interpolate(vertex_j, t);
                            split_front.push(vertex_new.clone());
                            split_back.push(vertex_new);
                        }
                    }
                }

                // Fragments keep the parent's plane so coplanar routing stays stable
                if split_front.len() >= 3 {
                    front.push(Polygon::with_plane(split_front, polygon.plane.clone()));
                }
                if split_back.len() >= 3 {
                    back.push(Polygon::with_plane(split_back, polygon.plane.clone()));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }

    /// The plane carried through an affine transform. `normal_mat` is the
    /// inverse transpose of `mat`.
    pub fn transformed(&self, mat: &Matrix4<Real>, normal_mat: &Matrix4<Real>) -> Option<Plane> {
        let point = mat.transform_point(&Point3::from(self.normal * self.w));
        let normal = normal_mat
            .transform_vector(&self.normal)
            .try_normalize(Real::EPSILON)?;
        Some(Plane {
            normal,
            w: normal.dot(&point.coords),
        })
    }
}
