//! Error types for geometry, tree edits, scene persistence and stippling

use crate::float_types::Real;
use crate::mesh::BooleanOperator;
use std::fmt::Display;

/// Problems raised while building or combining an [`ExactMesh`](crate::mesh::ExactMesh)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// (InvalidGeometry) A face references fewer than three vertices
    InvalidGeometry { face: usize, vertices: usize },
    /// (FaceIndexOutOfRange) A face references a vertex that does not exist
    FaceIndexOutOfRange { face: usize, index: usize, vertex_count: usize },
    /// (NonManifoldResult) A boolean result could not be turned back into a closed surface
    NonManifoldResult(BooleanOperator),
    /// (MissingOperand) A boolean operation is waiting for one of its operands
    MissingOperand,
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::InvalidGeometry { face, vertices } => write!(f, "(InvalidGeometry) Face {} has {} vertices, at least 3 are required", face, vertices),
            GeometryError::FaceIndexOutOfRange { face, index, vertex_count } => write!(f, "(FaceIndexOutOfRange) Face {} references vertex {} (vertex count = {})", face, index, vertex_count),
            GeometryError::NonManifoldResult(op) => write!(f, "(NonManifoldResult) The {:?} result is not a closed manifold surface", op),
            GeometryError::MissingOperand => write!(f, "(MissingOperand) The operation needs two operands"),
        }
    }
}

/// Rejected edits on a [`CsgTree`](crate::csg::CsgTree)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node is not part of this tree")]
    UnknownNode,
    #[error("the root node cannot be moved, deleted or edited")]
    RootIsImmutable,
    #[error("primitives cannot host children")]
    NotAContainer,
    #[error("the operation already has a left and a right operand")]
    OperandSlotsFull,
    #[error("a node cannot be grafted under its own descendant")]
    WouldCreateCycle,
    #[error("the node is not an operation")]
    NotAnOperation,
    #[error("control point {index} does not exist (the entity has {count})")]
    ControlPointOutOfRange { index: usize, count: usize },
}

/// Failures while reading or writing a persisted scene
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not access scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown entity type code {0}")]
    UnknownEntityType(i32),
    #[error("the document root must be a root entity, found type code {0}")]
    RootExpected(i32),
    #[error("entity type code {0} cannot appear below the root")]
    UnexpectedEntityType(i32),
    #[error("operation '{name}' has unknown operator code {code}")]
    InvalidOperator { name: String, code: i32 },
    #[error("'{name}' has {found} control points, {expected} were expected")]
    ControlPointCount { name: String, expected: usize, found: usize },
    #[error("'{name}' has {found} children, at most {allowed} are allowed")]
    TooManyChildren { name: String, allowed: usize, found: usize },
    #[error("'{name}' has a non-finite model matrix or control point")]
    NonFinite { name: String },
}

/// Failures of the stippling pipeline
#[derive(Debug, thiserror::Error)]
pub enum StippleError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("the sprite sheet does not contain any sprite")]
    EmptySpriteSheet,
    #[error("image is {found:?} but {expected:?} was expected")]
    ImageSizeMismatch { expected: (u32, u32), found: (u32, u32) },
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("could not access file: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("the dot generation worker stopped before finishing")]
    WorkerDisconnected,
}

/// Rejected insertions into the [`SpatialIndex`](crate::stipple::quadtree::SpatialIndex)
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum IndexError {
    #[error("dot at ({x}, {y}) lies outside the canvas")]
    OutOfCanvas { x: Real, y: Real },
}
