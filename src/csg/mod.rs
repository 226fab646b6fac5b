//! The editable scene: parametric primitives, boolean operations and the
//! tree that keeps operation results in sync with their operands.

pub mod control_point;
pub mod node;
pub mod operation;
pub mod primitive;
pub mod render;
pub mod scene;
pub mod tree;

pub use control_point::{Constraints, ControlPoint};
pub use node::{CsgNode, EntityType, NodeId, NodeKind, PaintMode};
pub use operation::Operation;
pub use primitive::{Cylinder, Primitive, Prism};
pub use render::RenderBuffers;
pub use scene::{SceneControlPoint, SceneNode};
pub use tree::CsgTree;

pub use crate::mesh::{BooleanOperator, PrimitiveKind};
