//! Draggable handles that parameterize an entity.

use crate::float_types::Real;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Degrees of freedom a control point drives, as a bit set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constraints(u32);

impl Constraints {
    pub const NONE: Constraints = Constraints(0);
    pub const TRANSLATION_X: Constraints = Constraints(1);
    pub const TRANSLATION_Y: Constraints = Constraints(2);
    pub const TRANSLATION_Z: Constraints = Constraints(4);
    pub const RESIZE_X: Constraints = Constraints(8);
    pub const RESIZE_Y: Constraints = Constraints(16);
    pub const RESIZE_Z: Constraints = Constraints(32);
    pub const ROTATION_X: Constraints = Constraints(64);
    pub const ROTATION_Y: Constraints = Constraints(128);
    pub const ROTATION_Z: Constraints = Constraints(256);
    pub const SCALE_X: Constraints = Constraints(512);
    pub const SCALE_Y: Constraints = Constraints(1024);
    pub const SCALE_Z: Constraints = Constraints(2048);

    pub const TRANSLATION: Constraints =
        Constraints(Self::TRANSLATION_X.0 | Self::TRANSLATION_Y.0 | Self::TRANSLATION_Z.0);
    pub const RESIZE: Constraints =
        Constraints(Self::RESIZE_X.0 | Self::RESIZE_Y.0 | Self::RESIZE_Z.0);
    pub const ROTATION: Constraints =
        Constraints(Self::ROTATION_X.0 | Self::ROTATION_Y.0 | Self::ROTATION_Z.0);
    pub const SCALE: Constraints = Constraints(Self::SCALE_X.0 | Self::SCALE_Y.0 | Self::SCALE_Z.0);

    pub const fn from_bits(bits: u32) -> Self {
        Constraints(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// All bits of `other` are set.
    pub const fn contains(self, other: Constraints) -> bool {
        self.0 & other.0 == other.0
    }

    /// At least one bit of `other` is set.
    pub const fn intersects(self, other: Constraints) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Constraints {
    type Output = Constraints;

    fn bitor(self, rhs: Constraints) -> Constraints {
        Constraints(self.0 | rhs.0)
    }
}

/// A handle in entity-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub local_pos: Point3<Real>,
    pub constraints: Constraints,
}

impl ControlPoint {
    pub const fn new(local_pos: Point3<Real>, constraints: Constraints) -> Self {
        ControlPoint { local_pos, constraints }
    }

    pub fn at(x: Real, y: Real, z: Real, constraints: Constraints) -> Self {
        ControlPoint::new(Point3::new(x, y, z), constraints)
    }

    pub const fn is_constrained_as(&self, constraints: Constraints) -> bool {
        self.constraints.contains(constraints)
    }

    pub const fn is_constrained_as_any(&self, constraints: Constraints) -> bool {
        self.constraints.intersects(constraints)
    }
}
