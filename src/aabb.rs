use crate::float_types::Real;
use nalgebra::Point3;

/// Axis-aligned bounding box of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// Smallest box enclosing `points`, or `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<Real>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self::new(first, first), |mut aabb, p| {
            aabb.mins = aabb.mins.inf(p);
            aabb.maxs = aabb.maxs.sup(p);
            aabb
        }))
    }

    /// Closed overlap test, boxes that only touch intersect.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.maxs.x >= other.mins.x
            && self.mins.x <= other.maxs.x
            && self.maxs.y >= other.mins.y
            && self.mins.y <= other.maxs.y
            && self.maxs.z >= other.mins.z
            && self.mins.z <= other.maxs.z
    }

    /// Same box grown by `margin` on every side.
    #[inline]
    pub fn loosened(&self, margin: Real) -> Self {
        Self::new(
            self.mins - nalgebra::Vector3::repeat(margin),
            self.maxs + nalgebra::Vector3::repeat(margin),
        )
    }

    #[inline]
    pub fn center(&self) -> Point3<Real> {
        nalgebra::center(&self.mins, &self.maxs)
    }
}
