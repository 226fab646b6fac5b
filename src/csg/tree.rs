//! The scene tree: a root container owning subtrees of entities, with
//! operations recomputed from their operands after every edit.

use crate::csg::control_point::Constraints;
use crate::csg::node::{CsgNode, NodeId, NodeKind, PaintMode};
use crate::csg::operation::{self, Operation};
use crate::csg::primitive::{Cylinder, Primitive, Prism};
use crate::csg::render::RenderBuffers;
use crate::errors::{GeometryError, TreeError};
use crate::float_types::Real;
use crate::mesh::{BooleanOperator, ExactMesh, PrimitiveKind};
use crate::stipple::config::EntityConfiguration;
use nalgebra::{Point3, Vector3};
use slotmap::SlotMap;
use std::collections::VecDeque;
use tracing::{debug, instrument, warn};

/// Arena of entities addressed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct CsgTree {
    nodes: SlotMap<NodeId, CsgNode>,
    root: NodeId,
    selected: Option<NodeId>,
    next_serial: u64,
}

impl Default for CsgTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CsgTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(CsgNode::new("Root node", NodeKind::Root));
        CsgTree {
            nodes,
            root,
            selected: None,
            next_serial: 1,
        }
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &CsgNode {
        &self.nodes[self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&CsgNode> {
        self.nodes.get(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&CsgNode, TreeError> {
        self.nodes.get(id).ok_or(TreeError::UnknownNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut CsgNode, TreeError> {
        self.nodes.get_mut(id).ok_or(TreeError::UnknownNode)
    }

    /// Editable node other than the root.
    fn entity_mut(&mut self, id: NodeId) -> Result<&mut CsgNode, TreeError> {
        if id == self.root {
            return Err(TreeError::RootIsImmutable);
        }
        self.node_mut(id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when only the root is left.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn next_name(&mut self, prefix: &str) -> String {
        let name = format!("{prefix} {}", self.next_serial);
        self.next_serial += 1;
        name
    }

    /// Keep generated names clear of `name` when it ends in a serial.
    pub(crate) fn reserve_serial(&mut self, name: &str) {
        let serial = name.rsplit(' ').next().and_then(|tail| tail.parse::<u64>().ok());
        if let Some(serial) = serial {
            self.next_serial = self.next_serial.max(serial.saturating_add(1));
        }
    }

    /// Insert a fresh node as the last child of `host`, filling a free
    /// operand slot if `host` is an operation.
    pub(crate) fn insert_under(&mut self, node: CsgNode, host: NodeId) -> NodeId {
        let id = self.nodes.insert(node);
        self.nodes[id].parent = Some(host);
        self.nodes[host].children.push(id);
        if let NodeKind::Operation(op) = &mut self.nodes[host].kind {
            op.attach(id);
        }
        id
    }

    // ─── Construction ────────────────────────────────────────────────────

    /// Add a primitive of edge/diameter `size` under the root.
    pub fn add_primitive(&mut self, kind: PrimitiveKind, size: Real) -> NodeId {
        let (name, kind) = match kind {
            PrimitiveKind::Prism => (self.next_name("Prism"), NodeKind::Prism(Prism::new(size))),
            PrimitiveKind::Cylinder => {
                (self.next_name("Cylinder"), NodeKind::Cylinder(Cylinder::new(size)))
            },
        };
        let id = self.insert_under(CsgNode::new(name, kind), self.root);
        self.recompute_node(id);
        debug!(?id, "primitive added");
        id
    }

    /// Add an operation without operands under the root.
    pub fn add_operation(&mut self, operator: BooleanOperator) -> NodeId {
        let name = self.next_name("Operation");
        let id = self.insert_under(
            CsgNode::new(name, NodeKind::Operation(Operation::new(operator))),
            self.root,
        );
        debug!(?id, ?operator, "operation added");
        id
    }

    // ─── Structure edits ─────────────────────────────────────────────────

    /// `true` if `ancestor` lies on the parent chain of `node`, or is `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Move `node` with its subtree under `host`.
    ///
    /// An operation host takes the node as its left operand if it has none,
    /// otherwise as its right operand. Both old and new parents are
    /// recomputed.
    pub fn prune_and_graft(&mut self, node: NodeId, host: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootIsImmutable);
        }
        self.node(node)?;
        let host_node = self.node(host)?;
        match &host_node.kind {
            NodeKind::Prism(_) | NodeKind::Cylinder(_) => return Err(TreeError::NotAContainer),
            NodeKind::Operation(op) if op.operand_count() == 2 => {
                return Err(TreeError::OperandSlotsFull);
            },
            _ => {},
        }
        if self.is_ancestor(node, host) {
            return Err(TreeError::WouldCreateCycle);
        }

        let old_parent = self.unlink(node);
        self.nodes[node].parent = Some(host);
        self.nodes[host].children.push(node);
        if let NodeKind::Operation(op) = &mut self.nodes[host].kind {
            op.attach(node);
        }
        debug!(?node, ?host, "grafted");

        if let Some(old) = old_parent {
            self.recompute(old);
        }
        self.recompute(host);
        Ok(())
    }

    /// Move `node` back to the first level of the tree.
    pub fn detach(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.prune_and_graft(node, self.root)
    }

    /// Remove `node` from its parent's child list and operand slots.
    fn unlink(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get_mut(node)?.parent.take()?;
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&c| c != node);
            if let NodeKind::Operation(op) = &mut p.kind {
                op.detach(node);
            }
        }
        Some(parent)
    }

    /// Delete `node` and all its descendants.
    pub fn delete(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootIsImmutable);
        }
        self.node(node)?;
        if self.selected.is_some_and(|s| self.is_ancestor(node, s)) {
            self.selected = None;
        }
        let parent = self.unlink(node);
        for id in self.traverse_depth_first_from(node) {
            self.nodes.remove(id);
        }
        debug!(?node, "deleted");
        if let Some(parent) = parent {
            self.recompute(parent);
        }
        Ok(())
    }

    /// Delete everything but the root.
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|id, _| id == root);
        self.nodes[root].children.clear();
        self.selected = None;
    }

    // ─── Traversal and lookup ────────────────────────────────────────────

    pub fn traverse_breadth_first(&self) -> Vec<NodeId> {
        self.traverse_breadth_first_from(self.root)
    }

    pub fn traverse_breadth_first_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        if !self.nodes.contains_key(start) {
            return visited;
        }
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            visited.push(id);
            queue.extend(self.nodes[id].children.iter().copied());
        }
        visited
    }

    pub fn traverse_depth_first(&self) -> Vec<NodeId> {
        self.traverse_depth_first_from(self.root)
    }

    /// Pre-order traversal starting at `start`.
    pub fn traverse_depth_first_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        if !self.nodes.contains_key(start) {
            return visited;
        }
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            visited.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        visited
    }

    pub fn first_level(&self) -> &[NodeId] {
        &self.nodes[self.root].children
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse_breadth_first()
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }

    /// Visible nodes in breadth-first order.
    pub fn visible_entities(&self) -> Vec<NodeId> {
        self.traverse_breadth_first()
            .into_iter()
            .filter(|&id| self.nodes[id].visible)
            .collect()
    }

    /// `start` plus the siblings met while walking up to the root.
    ///
    /// None of these is an ancestor or descendant of `start`, so they can be
    /// shown alongside it without drawing any geometry twice.
    pub fn non_conflicting_entities(&self, start: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(start) {
            return Vec::new();
        }
        let mut result = vec![start];
        let mut coming_from = start;
        while let Some(current) = self.nodes[coming_from].parent {
            result.extend(
                self.nodes[current]
                    .children
                    .iter()
                    .copied()
                    .filter(|&c| c != coming_from),
            );
            coming_from = current;
        }
        result
    }

    // ─── Selection and per-node settings ─────────────────────────────────

    pub const fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn select(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.node(node)?;
        self.selected = Some(node);
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), TreeError> {
        self.node_mut(node)?.name = name.into();
        Ok(())
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), TreeError> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }

    pub fn set_paint_mode(&mut self, node: NodeId, paint_mode: PaintMode) -> Result<(), TreeError> {
        self.node_mut(node)?.paint_mode = paint_mode;
        Ok(())
    }

    pub fn set_entity_configuration(
        &mut self,
        node: NodeId,
        configuration: EntityConfiguration,
    ) -> Result<(), TreeError> {
        self.node_mut(node)?.configuration = configuration;
        Ok(())
    }

    /// Change the operator of an operation and recompute it.
    pub fn set_operator(&mut self, node: NodeId, operator: BooleanOperator) -> Result<(), TreeError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Operation(op) => op.operator = operator,
            _ => return Err(TreeError::NotAnOperation),
        }
        self.recompute(node);
        Ok(())
    }

    // ─── Placement ───────────────────────────────────────────────────────

    pub fn set_position(&mut self, node: NodeId, position: Point3<Real>) -> Result<(), TreeError> {
        self.entity_mut(node)?.set_position(position);
        self.recompute_parent(node);
        Ok(())
    }

    pub fn translate(&mut self, node: NodeId, offset: Vector3<Real>) -> Result<(), TreeError> {
        self.entity_mut(node)?.translate(offset);
        self.recompute_parent(node);
        Ok(())
    }

    pub fn rotate(&mut self, node: NodeId, degrees: Real, axis: &Vector3<Real>) -> Result<(), TreeError> {
        self.entity_mut(node)?.rotate(degrees, axis);
        self.recompute_parent(node);
        Ok(())
    }

    /// Snap operands onto their operation: a single child moves to the
    /// parent's position, a second child keeps its offset from the first.
    pub fn correct_entity_positions(&mut self) {
        for id in self.first_level().to_vec() {
            self.correct_subtree_positions(id);
        }
    }

    fn correct_subtree_positions(&mut self, node: NodeId) {
        let position = self.nodes[node].position();
        match self.nodes[node].children.clone().as_slice() {
            [only] => {
                self.nodes[*only].set_position(position);
                self.correct_subtree_positions(*only);
            },
            [first, second] => {
                let difference = self.nodes[*second].position() - self.nodes[*first].position();
                self.nodes[*first].set_position(position);
                self.nodes[*second].set_position(position + difference);
                self.correct_subtree_positions(*first);
                self.correct_subtree_positions(*second);
            },
            _ => {},
        }
        self.recompute_node(node);
    }

    // ─── Interaction ─────────────────────────────────────────────────────

    /// Drag control point `cp_index` of `node` to `world_point`.
    pub fn interact(
        &mut self,
        node: NodeId,
        cp_index: usize,
        world_point: Point3<Real>,
    ) -> Result<(), TreeError> {
        let entity = self.entity_mut(node)?;
        let count = entity.control_points().len();
        let cp = *entity
            .control_points()
            .get(cp_index)
            .ok_or(TreeError::ControlPointOutOfRange { index: cp_index, count })?;
        let position = entity.local_position();

        let to_local = |entity: &CsgNode| {
            entity
                .model
                .try_inverse()
                .map(|inverse| inverse.transform_point(&world_point))
        };
        let Some(mut mouse) = to_local(&*entity) else {
            warn!(?node, "singular model matrix, interaction ignored");
            return Ok(());
        };

        let axes = [
            (Constraints::TRANSLATION_X, Vector3::x()),
            (Constraints::TRANSLATION_Y, Vector3::y()),
            (Constraints::TRANSLATION_Z, Vector3::z()),
        ];
        for (axis, (constraint, unit)) in axes.into_iter().enumerate() {
            if cp.is_constrained_as(constraint) {
                entity.translate(unit * (mouse[axis] - position[axis]));
                mouse = to_local(&*entity).unwrap_or(mouse);
            }
        }

        let mut resized = false;
        let handle = &mut entity.kind.control_points_mut()[cp_index];
        if cp.is_constrained_as(Constraints::RESIZE_Y) {
            let mut new_y = mouse.y - position.y;
            if new_y <= position.y {
                new_y = 1.0;
            }
            handle.local_pos = Point3::new(0.0, new_y, 0.0);
            resized = true;
        }
        if cp.is_constrained_as(Constraints::RESIZE_X) {
            let mut new_x = mouse.x - position.x;
            if new_x >= position.x {
                new_x = -1.0;
            }
            handle.local_pos.x = new_x;
            resized = true;
        }
        if cp.is_constrained_as(Constraints::RESIZE_Z) {
            let mut new_z = mouse.z - position.z;
            if new_z >= position.z {
                new_z = -1.0;
            }
            handle.local_pos.z = new_z;
            resized = true;
        }

        if cp.is_constrained_as(Constraints::ROTATION_Y) {
            let p = entity.position();
            let handle_world = entity.model.transform_point(&cp.local_pos);
            let alpha = heading_degrees(&p, &world_point) - heading_degrees(&p, &handle_world);
            entity.rotate(-alpha, &Vector3::y());
        }

        match &mut entity.kind {
            NodeKind::Prism(prism) => prism.constrain(cp_index),
            NodeKind::Cylinder(cylinder) => cylinder.constrain(cp_index),
            NodeKind::Operation(_) | NodeKind::Root => {},
        }

        if resized {
            self.recompute(node);
        } else {
            self.recompute_parent(node);
        }
        Ok(())
    }

    // ─── Recompute ───────────────────────────────────────────────────────

    /// Rebuild `node`'s geometry, then every operation above it.
    #[instrument(skip(self))]
    pub fn recompute(&mut self, node: NodeId) {
        if !self.nodes.contains_key(node) {
            return;
        }
        self.recompute_node(node);
        self.recompute_parent(node);
    }

    /// Walk up from `node`, recomputing ancestors while they are operations.
    fn recompute_parent(&mut self, node: NodeId) {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(id) = current {
            if !self.nodes[id].is_operation() {
                break;
            }
            self.recompute_node(id);
            current = self.nodes[id].parent;
        }
    }

    /// Rebuild the mesh and render buffers of a single node.
    pub(crate) fn recompute_node(&mut self, node: NodeId) {
        let mesh = match &self.nodes[node].kind {
            NodeKind::Root => return,
            NodeKind::Prism(prism) => prism.mesh(),
            NodeKind::Cylinder(cylinder) => cylinder.mesh(),
            NodeKind::Operation(op) => self.combine_operands(op),
        };
        let entity = &mut self.nodes[node];
        entity.mesh = match mesh {
            Ok(mesh) => mesh,
            // an operation waiting for operands is a normal state
            Err(GeometryError::MissingOperand) => ExactMesh::default(),
            Err(error) => {
                warn!(name = %entity.name, %error, "geometry left empty");
                ExactMesh::default()
            },
        };
        entity.render = RenderBuffers::from_mesh(&entity.mesh, &entity.name);
        debug!(name = %entity.name, faces = entity.mesh.face_count(), "recomputed");
    }

    fn combine_operands(&self, op: &Operation) -> Result<ExactMesh, GeometryError> {
        let (Some(left), Some(right)) = (op.left, op.right) else {
            return Err(GeometryError::MissingOperand);
        };
        let (left, right) = (&self.nodes[left], &self.nodes[right]);
        Ok(operation::combine(op.operator, (&left.mesh, &left.model), (&right.mesh, &right.model)))
    }

    /// Recompute every operation below and including `start`, children
    /// first.
    pub(crate) fn recompute_subtree(&mut self, start: NodeId) {
        for id in self.traverse_depth_first_from(start).into_iter().rev() {
            if self.nodes[id].is_operation() {
                self.recompute_node(id);
            }
        }
    }
}

/// Angle of `point` around `center` in the xz plane, in degrees.
fn heading_degrees(center: &Point3<Real>, point: &Point3<Real>) -> Real {
    if point.x == center.x {
        if point.z >= center.z { 90.0 } else { -90.0 }
    } else {
        (point.z - center.z).atan2(point.x - center.x).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn graft_assigns_left_then_right() {
        let mut tree = CsgTree::new();
        let op = tree.add_operation(BooleanOperator::Union);
        let a = tree.add_primitive(PrimitiveKind::Prism, 2.0);
        let b = tree.add_primitive(PrimitiveKind::Prism, 2.0);
        let c = tree.add_primitive(PrimitiveKind::Cylinder, 2.0);

        tree.prune_and_graft(a, op).expect("left");
        tree.prune_and_graft(b, op).expect("right");
        assert_eq!(tree.prune_and_graft(c, op), Err(TreeError::OperandSlotsFull));

        let operation = tree.node(op).expect("op").operation().expect("is operation");
        assert_eq!((operation.left, operation.right), (Some(a), Some(b)));
        assert_eq!(tree.first_level(), &[op, c]);
    }

    #[test]
    fn detaching_left_promotes_right() {
        let mut tree = CsgTree::new();
        let op = tree.add_operation(BooleanOperator::Difference);
        let a = tree.add_primitive(PrimitiveKind::Prism, 2.0);
        let b = tree.add_primitive(PrimitiveKind::Prism, 1.0);
        tree.prune_and_graft(a, op).expect("left");
        tree.prune_and_graft(b, op).expect("right");

        tree.detach(a).expect("detach");
        let operation = tree.node(op).expect("op").operation().expect("is operation");
        assert_eq!((operation.left, operation.right), (Some(b), None));
        assert_eq!(tree.combine_operands(operation).err(), Some(GeometryError::MissingOperand));
        assert!(tree.node(op).expect("op").mesh().is_empty());
    }

    #[test]
    fn structural_edits_are_checked() {
        let mut tree = CsgTree::new();
        let outer = tree.add_operation(BooleanOperator::Union);
        let inner = tree.add_operation(BooleanOperator::Union);
        let prism = tree.add_primitive(PrimitiveKind::Prism, 1.0);
        tree.prune_and_graft(inner, outer).expect("nest");

        assert_eq!(tree.prune_and_graft(outer, inner), Err(TreeError::WouldCreateCycle));
        assert_eq!(tree.prune_and_graft(outer, prism), Err(TreeError::NotAContainer));
        assert_eq!(tree.prune_and_graft(tree.root(), outer), Err(TreeError::RootIsImmutable));
        assert_eq!(tree.delete(tree.root()), Err(TreeError::RootIsImmutable));
    }

    #[test]
    fn delete_removes_subtree_and_selection() {
        let mut tree = CsgTree::new();
        let op = tree.add_operation(BooleanOperator::Union);
        let a = tree.add_primitive(PrimitiveKind::Prism, 1.0);
        tree.prune_and_graft(a, op).expect("graft");
        tree.select(a).expect("select");

        tree.delete(op).expect("delete");
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.selected(), None);
        assert_eq!(tree.node(a).err(), Some(TreeError::UnknownNode));
    }

    #[test]
    fn traversals_and_siblings() {
        let mut tree = CsgTree::new();
        let op = tree.add_operation(BooleanOperator::Union);
        let a = tree.add_primitive(PrimitiveKind::Prism, 1.0);
        let b = tree.add_primitive(PrimitiveKind::Prism, 1.0);
        let lone = tree.add_primitive(PrimitiveKind::Cylinder, 1.0);
        tree.prune_and_graft(a, op).expect("left");
        tree.prune_and_graft(b, op).expect("right");

        let root = tree.root();
        assert_eq!(tree.traverse_breadth_first(), vec![root, op, lone, a, b]);
        assert_eq!(tree.traverse_depth_first(), vec![root, op, a, b, lone]);
        assert_eq!(tree.non_conflicting_entities(a), vec![a, b, lone]);
        assert_eq!(tree.find_by_name(&tree.node(lone).expect("lone").name.clone()), Some(lone));
        assert!(!tree.visible_entities().contains(&root));
    }

    #[test]
    fn operand_move_recomputes_operation() {
        let mut tree = CsgTree::new();
        let op = tree.add_operation(BooleanOperator::Union);
        let a = tree.add_primitive(PrimitiveKind::Prism, 2.0);
        let b = tree.add_primitive(PrimitiveKind::Prism, 2.0);
        tree.prune_and_graft(a, op).expect("left");
        tree.prune_and_graft(b, op).expect("right");
        assert_relative_eq!(tree.node(op).expect("op").mesh().volume(), 8.0, epsilon = 1e-6);

        tree.translate(b, Vector3::new(1.0, 0.0, 0.0)).expect("move");
        assert_relative_eq!(tree.node(op).expect("op").mesh().volume(), 12.0, epsilon = 1e-6);

        tree.set_operator(op, BooleanOperator::Intersection).expect("operator");
        assert_relative_eq!(tree.node(op).expect("op").mesh().volume(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn resize_handles_clamp() {
        let mut tree = CsgTree::new();
        let prism = tree.add_primitive(PrimitiveKind::Prism, 2.0);

        tree.interact(prism, Prism::RESIZE_HEIGHT, Point3::new(0.0, 5.0, 0.0)).expect("grow");
        assert_relative_eq!(tree.node(prism).expect("p").mesh().volume(), 20.0, epsilon = 1e-9);

        tree.interact(prism, Prism::RESIZE_HEIGHT, Point3::new(0.0, -3.0, 0.0)).expect("clamp");
        let height = tree.node(prism).expect("p").control_points()[Prism::RESIZE_HEIGHT].local_pos;
        assert_eq!(height, Point3::new(0.0, 1.0, 0.0));

        tree.interact(prism, Prism::RESIZE_X, Point3::new(4.0, 0.0, 0.0)).expect("clamp x");
        let resize_x = tree.node(prism).expect("p").control_points()[Prism::RESIZE_X].local_pos;
        assert_relative_eq!(resize_x.x, -1.0);

        assert_eq!(
            tree.interact(prism, 9, Point3::origin()),
            Err(TreeError::ControlPointOutOfRange { index: 9, count: 5 })
        );
    }

    #[test]
    fn translate_handle_moves_entity() {
        let mut tree = CsgTree::new();
        let cylinder = tree.add_primitive(PrimitiveKind::Cylinder, 2.0);
        tree.interact(cylinder, Cylinder::POSITION, Point3::new(3.0, 1.0, -2.0)).expect("drag");
        assert_relative_eq!(tree.node(cylinder).expect("c").position(), Point3::new(3.0, 1.0, -2.0));
    }

    #[test]
    fn rotate_handle_turns_about_y() {
        let mut tree = CsgTree::new();
        let prism = tree.add_primitive(PrimitiveKind::Prism, 2.0);
        // handle sits at +x; dragging it to +z is a -90° heading change
        tree.interact(prism, Prism::ROTATE_Y, Point3::new(0.0, 0.0, 1.0)).expect("rotate");
        let model = tree.node(prism).expect("p").model();
        let handle = model.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(handle, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn correct_positions_snaps_operands() {
        let mut tree = CsgTree::new();
        let op = tree.add_operation(BooleanOperator::Union);
        let a = tree.add_primitive(PrimitiveKind::Prism, 1.0);
        let b = tree.add_primitive(PrimitiveKind::Prism, 1.0);
        tree.translate(a, Vector3::new(5.0, 0.0, 0.0)).expect("a");
        tree.translate(b, Vector3::new(6.0, 0.0, 1.0)).expect("b");
        tree.prune_and_graft(a, op).expect("left");
        tree.prune_and_graft(b, op).expect("right");
        tree.translate(op, Vector3::new(0.0, 2.0, 0.0)).expect("op");

        tree.correct_entity_positions();
        assert_relative_eq!(tree.node(a).expect("a").position(), Point3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(tree.node(b).expect("b").position(), Point3::new(1.0, 2.0, 1.0));
    }
}
