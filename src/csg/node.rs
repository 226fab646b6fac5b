//! Scene entities stored in the [`CsgTree`](crate::csg::CsgTree) arena.

use crate::csg::control_point::{Constraints, ControlPoint};
use crate::csg::operation::Operation;
use crate::csg::primitive::{Cylinder, Primitive, Prism};
use crate::csg::render::RenderBuffers;
use crate::float_types::Real;
use crate::mesh::ExactMesh;
use crate::stipple::config::EntityConfiguration;
use nalgebra::{Matrix4, Point3, Rotation3, Translation3, Unit, Vector3};
use slotmap::new_key_type;

new_key_type! {
    pub struct NodeId;
}

/// Persisted entity type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Abstract = 0,
    Root = 1,
    Operation = 2,
    Cylinder = 3,
    Prism = 4,
}

impl EntityType {
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(EntityType::Abstract),
            1 => Some(EntityType::Root),
            2 => Some(EntityType::Operation),
            3 => Some(EntityType::Cylinder),
            4 => Some(EntityType::Prism),
            _ => None,
        }
    }
}

/// Which control points an entity exposes for display and picking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PaintMode {
    /// The entity alone, no handles.
    Entity,
    Translation,
    Resize,
    Rotation,
    Scale,
    #[default]
    AnyControlPoint,
}

impl PaintMode {
    /// Constraint bits a control point needs to be shown, `None` for all.
    pub const fn mask(self) -> Option<Constraints> {
        match self {
            PaintMode::Entity => Some(Constraints::NONE),
            PaintMode::Translation => Some(Constraints::TRANSLATION),
            PaintMode::Resize => Some(Constraints::RESIZE),
            PaintMode::Rotation => Some(Constraints::ROTATION),
            PaintMode::Scale => Some(Constraints::SCALE),
            PaintMode::AnyControlPoint => None,
        }
    }
}

/// What an entity is, with its shape-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Prism(Prism),
    Cylinder(Cylinder),
    Operation(Operation),
}

impl NodeKind {
    pub const fn entity_type(&self) -> EntityType {
        match self {
            NodeKind::Root => EntityType::Root,
            NodeKind::Prism(_) => EntityType::Prism,
            NodeKind::Cylinder(_) => EntityType::Cylinder,
            NodeKind::Operation(_) => EntityType::Operation,
        }
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        match self {
            NodeKind::Root => &[],
            NodeKind::Prism(p) => p.control_points(),
            NodeKind::Cylinder(c) => c.control_points(),
            NodeKind::Operation(o) => o.control_points(),
        }
    }

    pub fn control_points_mut(&mut self) -> &mut [ControlPoint] {
        match self {
            NodeKind::Root => &mut [],
            NodeKind::Prism(p) => p.control_points_mut(),
            NodeKind::Cylinder(c) => c.control_points_mut(),
            NodeKind::Operation(o) => o.control_points_mut(),
        }
    }
}

/// One entity of the scene.
#[derive(Debug, Clone)]
pub struct CsgNode {
    pub name: String,
    pub visible: bool,
    pub paint_mode: PaintMode,
    pub configuration: EntityConfiguration,
    pub(crate) kind: NodeKind,
    pub(crate) model: Matrix4<Real>,
    pub(crate) mesh: ExactMesh,
    pub(crate) render: RenderBuffers,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl CsgNode {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        CsgNode {
            name: name.into(),
            visible: !matches!(kind, NodeKind::Root),
            paint_mode: PaintMode::default(),
            configuration: EntityConfiguration::default(),
            kind,
            model: Matrix4::identity(),
            mesh: ExactMesh::default(),
            render: RenderBuffers::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub const fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    pub const fn is_operation(&self) -> bool {
        matches!(self.kind, NodeKind::Operation(_))
    }

    pub const fn operation(&self) -> Option<&Operation> {
        match &self.kind {
            NodeKind::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub const fn model(&self) -> &Matrix4<Real> {
        &self.model
    }

    /// Last computed geometry, in entity-local space.
    pub const fn mesh(&self) -> &ExactMesh {
        &self.mesh
    }

    pub const fn render_buffers(&self) -> &RenderBuffers {
        &self.render
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        self.kind.control_points()
    }

    /// Control points shown under the current paint mode.
    pub fn painted_control_points(&self) -> impl Iterator<Item = &ControlPoint> + '_ {
        let mask = self.paint_mode.mask();
        self.control_points()
            .iter()
            .filter(move |cp| mask.is_none_or(|m| cp.is_constrained_as_any(m)))
    }

    /// Local position of the entity's origin handle.
    pub fn local_position(&self) -> Point3<Real> {
        self.control_points()
            .first()
            .map_or_else(Point3::origin, |cp| cp.local_pos)
    }

    /// World position of the origin handle.
    pub fn position(&self) -> Point3<Real> {
        self.model.transform_point(&self.local_position())
    }

    /// Move the entity so its model translation becomes `position`.
    pub fn set_position(&mut self, position: Point3<Real>) {
        let old = Vector3::new(self.model[(0, 3)], self.model[(1, 3)], self.model[(2, 3)]);
        self.translate(-old);
        self.translate(position.coords);
    }

    /// Post-multiply the model by a translation.
    pub fn translate(&mut self, offset: Vector3<Real>) {
        self.model *= Translation3::from(offset).to_homogeneous();
    }

    /// Post-multiply the model by a rotation of `degrees` about `axis`.
    pub fn rotate(&mut self, degrees: Real, axis: &Vector3<Real>) {
        let Some(axis) = Unit::try_new(*axis, Real::EPSILON) else {
            return;
        };
        self.model *= Rotation3::from_axis_angle(&axis, degrees.to_radians()).to_homogeneous();
    }

    pub fn reset_model(&mut self) {
        self.model = Matrix4::identity();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn set_position_composes_in_local_frame() {
        let mut node = CsgNode::new("Prism", NodeKind::Prism(Prism::new(1.0)));
        node.set_position(Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(node.position(), Point3::new(1.0, 2.0, 3.0));

        // with a rotation, set_position moves along the rotated axes
        node.reset_model();
        node.rotate(90.0, &Vector3::y());
        node.set_position(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(node.position(), Point3::new(0.0, 0.0, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn paint_mode_filters_handles() {
        let mut node = CsgNode::new("Cylinder", NodeKind::Cylinder(Cylinder::new(1.0)));
        assert_eq!(node.painted_control_points().count(), 5);
        node.paint_mode = PaintMode::Resize;
        assert_eq!(node.painted_control_points().count(), 3);
        node.paint_mode = PaintMode::Entity;
        assert_eq!(node.painted_control_points().count(), 0);
    }

    #[test]
    fn type_codes() {
        assert_eq!(EntityType::from_code(4), Some(EntityType::Prism));
        assert_eq!(EntityType::from_code(5), None);
        assert!(!CsgNode::new("Root node", NodeKind::Root).visible);
    }
}
