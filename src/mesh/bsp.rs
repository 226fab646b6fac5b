//! [BSP](https://en.wikipedia.org/wiki/Binary_space_partitioning) tree node structure and operations

use crate::float_types::Real;
use crate::mesh::plane::{BACK, COPLANAR, FRONT, Plane};
use crate::mesh::polygon::Polygon;

/// A BSP tree node, containing polygons plus optional front/back subtrees
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Splitting plane for this node *or* **None** for a leaf that
    /// only stores polygons.
    pub plane: Option<Plane>,

    /// Polygons in *front* half‑spaces.
    pub front: Option<Box<Node>>,

    /// Polygons in *back* half‑spaces.
    pub back: Option<Box<Node>>,

    /// Polygons that lie on `plane` (after the node has been built).
    pub polygons: Vec<Polygon>,
}

impl Node {
    /// Create a new empty BSP node
    pub const fn new() -> Self {
        Self {
            plane: None,
            front: None,
            back: None,
            polygons: Vec::new(),
        }
    }

    /// Creates a new BSP node from polygons
    pub fn from_polygons(polygons: &[Polygon]) -> Self {
        let mut node = Self::new();
        if !polygons.is_empty() {
            node.build(polygons);
        }
        node
    }

    /// Invert all polygons in the BSP tree
    #[cfg(not(feature = "parallel"))]
    pub fn invert(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.polygons.iter_mut().for_each(|p| p.flip());
            if let Some(ref mut plane) = node.plane {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
            if let Some(front) = node.front.as_mut() {
                stack.push(&mut **front);
            }
            if let Some(back) = node.back.as_mut() {
                stack.push(&mut **back);
            }
        }
    }

    /// Pick the candidate plane that splits the fewest polygons while keeping
    /// the two halves balanced.
    pub fn pick_best_splitting_plane(polygons: &[Polygon]) -> Option<Plane> {
        const K_SPANS: Real = 8.0;
        const K_BALANCE: Real = 1.0;

        let sample_size = polygons.len().min(20);
        polygons
            .iter()
            .take(sample_size)
            .map(|candidate| {
                let plane = &candidate.plane;
                let (mut num_front, mut num_back, mut num_spanning) = (0i32, 0i32, 0i32);
                for poly in polygons {
                    match plane.classify_polygon(poly) {
                        COPLANAR => {},
                        FRONT => num_front += 1,
                        BACK => num_back += 1,
                        _ => num_spanning += 1,
                    }
                }
                let score = K_SPANS * num_spanning as Real
                    + K_BALANCE * ((num_front - num_back) as Real).abs();
                (score, plane)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, plane)| plane.clone())
    }

    /// Split `polys` by `plane`, routing coplanar polygons by facing.
    fn partition(plane: &Plane, polys: &[Polygon]) -> (Vec<Polygon>, Vec<Polygon>) {
        let mut front_polys = Vec::with_capacity(polys.len());
        let mut back_polys = Vec::with_capacity(polys.len());

        for polygon in polys {
            let (coplanar_front, coplanar_back, mut front_parts, mut back_parts) =
                plane.split_polygon(polygon);

            for coplanar_poly in coplanar_front.into_iter().chain(coplanar_back) {
                if plane.orient_plane(&coplanar_poly.plane) == FRONT {
                    front_parts.push(coplanar_poly);
                } else {
                    back_parts.push(coplanar_poly);
                }
            }

            front_polys.append(&mut front_parts);
            back_polys.append(&mut back_parts);
        }
        (front_polys, back_polys)
    }

    /// Remove all polygons in `polygons` that are inside this BSP tree.
    /// Polygons ending in a missing back subtree are inside and dropped.
    pub fn clip_polygons(&self, polygons: &[Polygon]) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            let Some(plane) = node.plane.as_ref() else {
                result.extend(polys);
                continue;
            };

            let (front_polys, back_polys) = Self::partition(plane, &polys);

            match &node.front {
                Some(front_node) if !front_polys.is_empty() => {
                    stack.push((&**front_node, front_polys))
                },
                Some(_) => {},
                None => result.extend(front_polys),
            }

            if let Some(back_node) = &node.back {
                if !back_polys.is_empty() {
                    stack.push((&**back_node, back_polys));
                }
            }
        }
        result
    }

    /// Remove all polygons in this BSP tree that are inside the other BSP tree
    #[cfg(not(feature = "parallel"))]
    pub fn clip_to(&mut self, bsp: &Node) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.polygons = bsp.clip_polygons(&node.polygons);
            if let Some(front) = node.front.as_mut() {
                stack.push(&mut **front);
            }
            if let Some(back) = node.back.as_mut() {
                stack.push(&mut **back);
            }
        }
    }

    /// Return all polygons in this BSP tree
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            result.extend_from_slice(&node.polygons);
            stack.extend(
                [&node.front, &node.back]
                    .into_iter()
                    .filter_map(|child| child.as_deref()),
            );
        }
        result
    }

    /// Build a BSP tree from the given polygons
    pub fn build(&mut self, polygons: &[Polygon]) {
        if polygons.is_empty() {
            return;
        }

        let mut stack = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            if polys.is_empty() {
                continue;
            }

            if node.plane.is_none() {
                node.plane = Self::pick_best_splitting_plane(&polys);
            }
            let Some(plane) = node.plane.clone() else {
                continue;
            };

            let mut front = Vec::with_capacity(polys.len() / 2);
            let mut back = Vec::with_capacity(polys.len() / 2);

            for polygon in &polys {
                let (coplanar_front, coplanar_back, mut front_parts, mut back_parts) =
                    plane.split_polygon(polygon);

                node.polygons.extend(coplanar_front);
                node.polygons.extend(coplanar_back);
                front.append(&mut front_parts);
                back.append(&mut back_parts);
            }

            if !front.is_empty() {
                let front_node = node.front.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((&mut **front_node, front));
            }

            if !back.is_empty() {
                let back_node = node.back.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((&mut **back_node, back));
            }
        }
    }
}
