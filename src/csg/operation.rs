//! Boolean combination of two operand entities.

use crate::csg::control_point::{Constraints, ControlPoint};
use crate::csg::node::NodeId;
use crate::float_types::Real;
use crate::mesh::{BooleanOperator, ExactMesh};
use nalgebra::Matrix4;
use tracing::warn;

/// An operation node. Operands are handles into the owning tree, never
/// owned meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: BooleanOperator,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    control_points: [ControlPoint; 2],
}

impl Operation {
    pub const POSITION: usize = 0;
    pub const ROTATE_Y: usize = 1;

    pub fn new(operator: BooleanOperator) -> Self {
        Operation {
            operator,
            left: None,
            right: None,
            control_points: [
                ControlPoint::at(0.0, 0.0, 0.0, Constraints::TRANSLATION),
                ControlPoint::at(200.0, 0.0, 0.0, Constraints::ROTATION_Y),
            ],
        }
    }

    pub fn with_control_points(operator: BooleanOperator, control_points: [ControlPoint; 2]) -> Self {
        Operation {
            control_points,
            ..Operation::new(operator)
        }
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    pub fn control_points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.control_points
    }

    /// Number of filled operand slots.
    pub fn operand_count(&self) -> usize {
        usize::from(self.left.is_some()) + usize::from(self.right.is_some())
    }

    /// Fill the first free slot, left before right. Returns `false` when
    /// both are taken.
    pub fn attach(&mut self, operand: NodeId) -> bool {
        if self.left.is_none() {
            self.left = Some(operand);
        } else if self.right.is_none() {
            self.right = Some(operand);
        } else {
            return false;
        }
        true
    }

    /// Clear the slot holding `operand`. Removing the left operand promotes
    /// the right one.
    pub fn detach(&mut self, operand: NodeId) {
        if self.right == Some(operand) {
            self.right = None;
        } else if self.left == Some(operand) {
            self.left = self.right.take();
        }
    }
}

/// Combine two operand meshes in the left operand's frame.
///
/// The left mesh is used as is, the right one is moved by
/// `inverse(left_model) * right_model`.
pub fn combine(
    operator: BooleanOperator,
    left: (&ExactMesh, &Matrix4<Real>),
    right: (&ExactMesh, &Matrix4<Real>),
) -> ExactMesh {
    let Some(left_inverse) = left.1.try_inverse() else {
        warn!("left operand has a singular model matrix, result left empty");
        return ExactMesh::default();
    };
    let mut right_mesh = right.0.clone();
    right_mesh.apply_transform(&(left_inverse * right.1));
    left.0.boolean_combine(&right_mesh, operator)
}
