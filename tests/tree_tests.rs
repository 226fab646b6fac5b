mod support;

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use stipplecsg::CsgTree;
use stipplecsg::csg::{BooleanOperator, Prism, PrimitiveKind};
use stipplecsg::errors::{SceneError, TreeError};
use stipplecsg::stipple::EntityConfiguration;

use crate::support::scratch_path;

/// `Operation 1` (union) over `Prism 2` at the origin and `Prism 3`
/// shifted by one unit along every axis.
fn overlapping_union() -> CsgTree {
    let mut tree = CsgTree::new();
    let op = tree.add_operation(BooleanOperator::Union);
    let a = tree.add_primitive(PrimitiveKind::Prism, 2.0);
    let b = tree.add_primitive(PrimitiveKind::Prism, 2.0);
    tree.prune_and_graft(a, op).expect("left operand");
    tree.prune_and_graft(b, op).expect("right operand");
    tree.translate(b, Vector3::new(1.0, 1.0, 1.0)).expect("move");
    tree
}

fn names(tree: &CsgTree) -> Vec<String> {
    tree.traverse_depth_first()
        .into_iter()
        .map(|id| tree.node(id).expect("live").name.clone())
        .collect()
}

#[test]
fn operation_follows_its_operands() {
    let mut tree = overlapping_union();
    let op = tree.find_by_name("Operation 1").expect("op");
    assert_relative_eq!(tree.node(op).expect("op").mesh().volume(), 15.0, epsilon = 1e-6);

    tree.set_operator(op, BooleanOperator::Intersection).expect("operator");
    assert_relative_eq!(tree.node(op).expect("op").mesh().volume(), 1.0, epsilon = 1e-6);

    tree.set_operator(op, BooleanOperator::Difference).expect("operator");
    assert_relative_eq!(tree.node(op).expect("op").mesh().volume(), 7.0, epsilon = 1e-6);
}

#[test]
fn nested_operations_propagate_to_the_top() {
    let mut tree = overlapping_union();
    let inner = tree.find_by_name("Operation 1").expect("inner");
    let outer = tree.add_operation(BooleanOperator::Difference);
    let drill = tree.add_primitive(PrimitiveKind::Prism, 1.0);
    tree.prune_and_graft(inner, outer).expect("left");
    tree.translate(drill, Vector3::new(-0.5, 0.5, -0.5)).expect("move drill");
    tree.prune_and_graft(drill, outer).expect("right");

    // the unit prism carves a closed cavity inside the first operand
    assert_relative_eq!(tree.node(outer).expect("outer").mesh().volume(), 14.0, epsilon = 1e-6);

    // moving a leaf deep in the tree recomputes every ancestor operation
    let a = tree.find_by_name("Prism 2").expect("a");
    tree.translate(a, Vector3::new(-10.0, 0.0, 0.0)).expect("move");
    assert_relative_eq!(tree.node(inner).expect("inner").mesh().volume(), 16.0, epsilon = 1e-6);
}

#[test]
fn structural_edits_are_checked() {
    let mut tree = overlapping_union();
    let op = tree.find_by_name("Operation 1").expect("op");
    let a = tree.find_by_name("Prism 2").expect("a");
    let extra = tree.add_primitive(PrimitiveKind::Cylinder, 1.0);

    assert_eq!(tree.prune_and_graft(extra, op), Err(TreeError::OperandSlotsFull));
    assert_eq!(tree.prune_and_graft(extra, a), Err(TreeError::NotAContainer));
    assert_eq!(tree.delete(tree.root()), Err(TreeError::RootIsImmutable));

    let outer = tree.add_operation(BooleanOperator::Union);
    let inner = tree.add_operation(BooleanOperator::Union);
    tree.prune_and_graft(inner, outer).expect("nest");
    assert_eq!(tree.prune_and_graft(outer, inner), Err(TreeError::WouldCreateCycle));

    tree.select(a).expect("select");
    tree.delete(op).expect("delete");
    assert_eq!(tree.selected(), None);
    // root, the cylinder and the two empty operations
    assert_eq!(tree.len(), 4);
    assert!(tree.find_by_name("Prism 3").is_none());

    tree.clear();
    assert!(tree.is_empty());
}

#[test]
fn control_point_drag_resizes_the_prism() {
    let mut tree = CsgTree::new();
    let prism = tree.add_primitive(PrimitiveKind::Prism, 2.0);
    tree.interact(prism, Prism::RESIZE_HEIGHT, Point3::new(0.0, 5.0, 0.0))
        .expect("drag");
    assert_relative_eq!(tree.node(prism).expect("prism").mesh().volume(), 20.0, epsilon = 1e-6);

    let err = tree.interact(prism, 9, Point3::origin()).unwrap_err();
    assert_eq!(err, TreeError::ControlPointOutOfRange { index: 9, count: 5 });
}

#[test]
fn scene_file_round_trip() {
    let mut tree = overlapping_union();
    let b = tree.find_by_name("Prism 3").expect("b");
    tree.set_visible(b, false).expect("hide");
    tree.set_entity_configuration(
        b,
        EntityConfiguration {
            internal_generation: 40,
            ..Default::default()
        },
    )
    .expect("configure");

    let path = scratch_path("scene.json");
    tree.save_json(&path).expect("saved");
    let loaded = CsgTree::load_json(&path).expect("loaded");

    assert_eq!(names(&loaded), names(&tree));
    let op = loaded.find_by_name("Operation 1").expect("op");
    assert_relative_eq!(loaded.node(op).expect("op").mesh().volume(), 15.0, epsilon = 1e-6);

    let b = loaded.node(loaded.find_by_name("Prism 3").expect("b")).expect("b");
    assert!(!b.visible);
    assert_eq!(b.configuration.internal_generation, 40);
    assert_relative_eq!(b.position(), Point3::new(1.0, 1.0, 1.0), epsilon = 1e-9);
}

#[test]
fn truncated_scene_file_is_rejected() {
    let tree = overlapping_union();
    let json = tree.to_json().expect("json");
    let path = scratch_path("truncated.json");
    std::fs::write(&path, &json[..json.len() / 2]).expect("written");
    assert!(matches!(CsgTree::load_json(&path), Err(SceneError::Json(_))));
}
