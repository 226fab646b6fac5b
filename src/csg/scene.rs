//! JSON persistence of a [`CsgTree`].
//!
//! Every entity becomes a [`SceneNode`] carrying its type code, name,
//! visibility, operator, row-major model matrix, control points (in the
//! fixed per-kind order) and per-entity stippling overrides. Import is
//! all-or-nothing: the whole document is checked before anything is added
//! to the tree.

use crate::csg::control_point::{Constraints, ControlPoint};
use crate::csg::node::{CsgNode, EntityType, NodeId, NodeKind};
use crate::csg::operation::Operation;
use crate::csg::primitive::{Cylinder, Prism};
use crate::csg::tree::CsgTree;
use crate::errors::SceneError;
use crate::float_types::Real;
use crate::mesh::BooleanOperator;
use crate::stipple::config::EntityConfiguration;
use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One persisted entity and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(rename = "type")]
    pub entity_type: i32,
    pub name: String,
    pub visible: bool,
    pub is_operation: bool,
    /// Operator code, `-1` for anything but an operation.
    pub operation: i32,
    /// Model matrix, row-major.
    pub model: [Real; 16],
    pub control_points: Vec<SceneControlPoint>,
    #[serde(default)]
    pub configuration: EntityConfiguration,
    #[serde(default)]
    pub children: Vec<SceneNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneControlPoint {
    pub x: Real,
    pub y: Real,
    pub z: Real,
    pub constraints: u32,
}

impl From<&ControlPoint> for SceneControlPoint {
    fn from(cp: &ControlPoint) -> Self {
        SceneControlPoint {
            x: cp.local_pos.x,
            y: cp.local_pos.y,
            z: cp.local_pos.z,
            constraints: cp.constraints.bits(),
        }
    }
}

impl From<&SceneControlPoint> for ControlPoint {
    fn from(cp: &SceneControlPoint) -> Self {
        ControlPoint::new(Point3::new(cp.x, cp.y, cp.z), Constraints::from_bits(cp.constraints))
    }
}

impl SceneNode {
    fn from_entity(tree: &CsgTree, node: &CsgNode) -> Self {
        let model = node.model();
        SceneNode {
            entity_type: node.entity_type().code(),
            name: node.name.clone(),
            visible: node.visible,
            is_operation: node.is_operation(),
            operation: node.operation().map_or(-1, |op| op.operator.code()),
            model: std::array::from_fn(|k| model[(k / 4, k % 4)]),
            control_points: node.control_points().iter().map(SceneControlPoint::from).collect(),
            configuration: node.configuration,
            children: node
                .children()
                .iter()
                .filter_map(|&child| tree.get(child))
                .map(|child| SceneNode::from_entity(tree, child))
                .collect(),
        }
    }

    fn model_matrix(&self) -> Matrix4<Real> {
        Matrix4::from_row_slice(&self.model)
    }

    /// Control points as a fixed-size array, `None` on a count mismatch.
    fn control_point_array<const N: usize>(&self) -> Option<[ControlPoint; N]> {
        if self.control_points.len() != N {
            return None;
        }
        Some(std::array::from_fn(|k| ControlPoint::from(&self.control_points[k])))
    }

    fn is_finite(&self) -> bool {
        self.model.iter().all(|v| v.is_finite())
            && self
                .control_points
                .iter()
                .all(|cp| cp.x.is_finite() && cp.y.is_finite() && cp.z.is_finite())
    }

    /// Check this node and everything below it.
    fn validate(&self, is_root: bool) -> Result<(), SceneError> {
        let entity_type = EntityType::from_code(self.entity_type)
            .ok_or(SceneError::UnknownEntityType(self.entity_type))?;

        if is_root {
            if entity_type != EntityType::Root {
                return Err(SceneError::RootExpected(self.entity_type));
            }
        } else {
            if !self.is_finite() {
                return Err(SceneError::NonFinite { name: self.name.clone() });
            }
            let (expected_points, allowed_children) = match entity_type {
                EntityType::Prism | EntityType::Cylinder => (5, 0),
                EntityType::Operation => {
                    if BooleanOperator::from_code(self.operation).is_none() {
                        return Err(SceneError::InvalidOperator {
                            name: self.name.clone(),
                            code: self.operation,
                        });
                    }
                    (2, 2)
                },
                EntityType::Root | EntityType::Abstract => {
                    return Err(SceneError::UnexpectedEntityType(self.entity_type));
                },
            };
            if self.control_points.len() != expected_points {
                return Err(SceneError::ControlPointCount {
                    name: self.name.clone(),
                    expected: expected_points,
                    found: self.control_points.len(),
                });
            }
            if self.children.len() > allowed_children {
                return Err(SceneError::TooManyChildren {
                    name: self.name.clone(),
                    allowed: allowed_children,
                    found: self.children.len(),
                });
            }
        }

        self.children.iter().try_for_each(|child| child.validate(false))
    }

    /// Entity payload of an already validated node.
    fn node_kind(&self) -> Option<NodeKind> {
        match EntityType::from_code(self.entity_type)? {
            EntityType::Prism => Some(NodeKind::Prism(Prism::from_control_points(
                self.control_point_array()?,
            ))),
            EntityType::Cylinder => Some(NodeKind::Cylinder(Cylinder::from_control_points(
                self.control_point_array()?,
            ))),
            EntityType::Operation => Some(NodeKind::Operation(Operation::with_control_points(
                BooleanOperator::from_code(self.operation)?,
                self.control_point_array()?,
            ))),
            EntityType::Root | EntityType::Abstract => None,
        }
    }
}

impl CsgTree {
    /// Snapshot of the whole tree, root included.
    pub fn to_scene(&self) -> SceneNode {
        SceneNode::from_entity(self, self.root_node())
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(&self.to_scene())?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Build a fresh tree from a scene document.
    pub fn from_scene(scene: &SceneNode) -> Result<Self, SceneError> {
        let mut tree = CsgTree::new();
        tree.import_scene(scene)?;
        Ok(tree)
    }

    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Self::from_scene(&serde_json::from_str(json)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Graft the document's first-level entities under the current root.
    ///
    /// Nothing is added if any part of the document is malformed.
    pub fn import_scene(&mut self, scene: &SceneNode) -> Result<(), SceneError> {
        scene.validate(true)?;
        let root = self.root();
        let imported: Vec<NodeId> = scene
            .children
            .iter()
            .filter_map(|child| self.build_scene_node(child, root))
            .collect();
        for &id in &imported {
            self.recompute_subtree(id);
        }
        debug!(entities = imported.len(), "scene imported");
        Ok(())
    }

    fn build_scene_node(&mut self, scene: &SceneNode, host: NodeId) -> Option<NodeId> {
        let mut node = CsgNode::new(scene.name.clone(), scene.node_kind()?);
        node.visible = scene.visible;
        node.configuration = scene.configuration;
        node.model = scene.model_matrix();

        self.reserve_serial(&scene.name);
        let id = self.insert_under(node, host);
        for child in &scene.children {
            self.build_scene_node(child, id);
        }
        if self.get(id).is_some_and(|n| !n.is_operation()) {
            self.recompute_node(id);
        }
        Some(id)
    }
}
