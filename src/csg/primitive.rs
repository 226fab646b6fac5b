//! Parametric solids driven by their control points.

use crate::csg::control_point::{Constraints, ControlPoint};
use crate::errors::GeometryError;
use crate::float_types::{Real, TAU};
use crate::mesh::{ExactMesh, PrimitiveKind};
use nalgebra::Point3;

/// A solid whose boundary is a pure function of its control points.
pub trait Primitive {
    const KIND: PrimitiveKind;

    /// Control points in persistence order.
    fn control_points(&self) -> &[ControlPoint];

    fn control_points_mut(&mut self) -> &mut [ControlPoint];

    /// Vertices and triangular faces of the closed surface.
    fn boundary(&self) -> (Vec<Point3<Real>>, Vec<Vec<usize>>);

    /// Shape-specific fix-ups after control point `dragged` moved.
    fn constrain(&mut self, dragged: usize);

    /// Rebuild the solid from the current control points.
    fn mesh(&self) -> Result<ExactMesh, GeometryError> {
        let (vertices, faces) = self.boundary();
        ExactMesh::from_primitive(Self::KIND, vertices, faces)
    }

    fn position(&self) -> Point3<Real> {
        self.control_points()[0].local_pos
    }
}

/// Emit the two triangles of every lateral quad between two rings of `n`
/// vertices, the top ring starting at index `n`.
fn lateral_faces(n: usize, faces: &mut Vec<Vec<usize>>) {
    for i in 0..n {
        let next = (i + 1) % n;
        faces.push(vec![i, next, n + next]);
        faces.push(vec![i, n + next, n + i]);
    }
}

/// A box-like prism with a parallelogram base.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    control_points: [ControlPoint; 5],
}

impl Prism {
    pub const POSITION: usize = 0;
    pub const ROTATE_Y: usize = 1;
    pub const RESIZE_X: usize = 2;
    pub const RESIZE_Z: usize = 3;
    pub const RESIZE_HEIGHT: usize = 4;

    /// Cube of edge `size` spanning negative x and z from the origin.
    pub fn new(size: Real) -> Self {
        let resize_base = Constraints::RESIZE_X | Constraints::RESIZE_Z;
        Prism {
            control_points: [
                ControlPoint::at(0.0, 0.0, 0.0, Constraints::TRANSLATION),
                ControlPoint::at(size / 2.0, 0.0, 0.0, Constraints::ROTATION_Y),
                ControlPoint::at(-size, 0.0, 0.0, resize_base),
                ControlPoint::at(0.0, 0.0, -size, resize_base),
                ControlPoint::at(0.0, size, 0.0, Constraints::RESIZE_Y),
            ],
        }
    }

    pub const fn from_control_points(control_points: [ControlPoint; 5]) -> Self {
        Prism { control_points }
    }

    fn corners(&self) -> [Point3<Real>; 4] {
        let p = self.control_points[Self::POSITION].local_pos;
        let rx = self.control_points[Self::RESIZE_X].local_pos.coords;
        let rz = self.control_points[Self::RESIZE_Z].local_pos.coords;
        [p, p + rz, p + rx + rz, p + rx]
    }
}

impl Primitive for Prism {
    const KIND: PrimitiveKind = PrimitiveKind::Prism;

    fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    fn control_points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.control_points
    }

    fn boundary(&self) -> (Vec<Point3<Real>>, Vec<Vec<usize>>) {
        let height = self.control_points[Self::RESIZE_HEIGHT].local_pos.coords;
        let bottom = self.corners();
        let mut vertices = bottom.to_vec();
        vertices.extend(bottom.iter().map(|corner| corner + height));

        let n = bottom.len() as isize;
        let mut faces = Vec::with_capacity(12);
        for i in 0..n - 2 {
            faces.push(vec![
                0,
                (-1 - i).rem_euclid(n) as usize,
                (-2 - i).rem_euclid(n) as usize,
            ]);
        }
        for i in 0..n - 2 {
            faces.push(vec![
                n as usize,
                (n + (1 + i).rem_euclid(n)) as usize,
                (n + (2 + i).rem_euclid(n)) as usize,
            ]);
        }
        lateral_faces(n as usize, &mut faces);
        (vertices, faces)
    }

    /// Keep the two base handles from crossing each other's line.
    fn constrain(&mut self, dragged: usize) {
        let rx = self.control_points[Self::RESIZE_X].local_pos;
        let rz = self.control_points[Self::RESIZE_Z].local_pos;
        match dragged {
            Self::RESIZE_X if rz.x != 0.0 => {
                let max_z = rx.x * (rz.z / rz.x);
                if rx.z < max_z {
                    self.control_points[Self::RESIZE_X].local_pos.z = max_z + 1.0;
                }
            },
            Self::RESIZE_Z if rx.x != 0.0 => {
                let min_z = rz.x * (rx.z / rx.x);
                if rz.z > min_z {
                    self.control_points[Self::RESIZE_Z].local_pos.z = min_z - 1.0;
                }
            },
            _ => {},
        }
    }
}

/// A truncated cone sampled with [`Cylinder::SIDES`] segments per circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    control_points: [ControlPoint; 5],
}

impl Cylinder {
    pub const SIDES: usize = 36;

    pub const POSITION: usize = 0;
    pub const ROTATE_Y: usize = 1;
    pub const RESIZE_RADIUS_BOTTOM: usize = 2;
    pub const RESIZE_RADIUS_TOP: usize = 3;
    pub const RESIZE_HEIGHT: usize = 4;

    /// Cylinder of diameter and height `size` standing on the origin.
    pub fn new(size: Real) -> Self {
        let radius = size / 2.0;
        Cylinder {
            control_points: [
                ControlPoint::at(0.0, 0.0, 0.0, Constraints::TRANSLATION),
                ControlPoint::at(size, 0.0, 0.0, Constraints::ROTATION_Y),
                ControlPoint::at(-radius, 0.0, 0.0, Constraints::RESIZE_X),
                ControlPoint::at(-radius, size, 0.0, Constraints::RESIZE_X),
                ControlPoint::at(0.0, size, 0.0, Constraints::RESIZE_Y),
            ],
        }
    }

    pub const fn from_control_points(control_points: [ControlPoint; 5]) -> Self {
        Cylinder { control_points }
    }

    /// Signed bottom radius, negative for the default handle layout.
    pub fn radius_bottom(&self) -> Real {
        self.control_points[Self::RESIZE_RADIUS_BOTTOM].local_pos.x - self.position().x
    }

    pub fn radius_top(&self) -> Real {
        self.control_points[Self::RESIZE_RADIUS_TOP].local_pos.x - self.position().x
    }

    pub fn height(&self) -> Real {
        self.control_points[Self::RESIZE_HEIGHT].local_pos.y - self.position().y
    }
}

impl Primitive for Cylinder {
    const KIND: PrimitiveKind = PrimitiveKind::Cylinder;

    fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    fn control_points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.control_points
    }

    fn boundary(&self) -> (Vec<Point3<Real>>, Vec<Vec<usize>>) {
        let n = Self::SIDES;
        let p = self.position();
        let (rb, rt, h) = (self.radius_bottom(), self.radius_top(), self.height());
        let ring = |radius: Real, y: Real| {
            (0..n).map(move |i| {
                let theta = TAU / n as Real * i as Real;
                Point3::new(p.x + radius * theta.cos(), p.y + y, p.z + radius * theta.sin())
            })
        };

        let mut vertices: Vec<Point3<Real>> = Vec::with_capacity(2 * n + 2);
        vertices.extend(ring(rb, 0.0));
        vertices.extend(ring(rt, h));
        vertices.push(p);
        vertices.push(self.control_points[Self::RESIZE_HEIGHT].local_pos);

        let mut faces = Vec::with_capacity(4 * n);
        let ni = n as isize;
        for i in 0..ni {
            faces.push(vec![
                2 * n,
                (-i).rem_euclid(ni) as usize,
                (-1 - i).rem_euclid(ni) as usize,
            ]);
        }
        for i in 0..n {
            faces.push(vec![2 * n + 1, n + i, n + (i + 1) % n]);
        }
        lateral_faces(n, &mut faces);
        (vertices, faces)
    }

    /// The top radius handle rides along with the height handle.
    fn constrain(&mut self, dragged: usize) {
        if dragged == Self::RESIZE_HEIGHT {
            let y = self.control_points[Self::RESIZE_HEIGHT].local_pos.y;
            self.control_points[Self::RESIZE_RADIUS_TOP].local_pos.y = y;
        }
    }
}
