//! Fixed-depth quad-tree over the stippled canvas.
//!
//! The tree is stored as an arena. Nodes are laid out depth-first, so the
//! leaf buckets below any node form one contiguous range that each node
//! caches at construction. A query that swallows a node whole returns that
//! range without descending further.
//!
//! Quadrants are numbered 0 = bottom-left, 1 = bottom-right, 2 = top-left
//! and 3 = top-right, split at the integer midpoint. Rectangles are closed;
//! a point on a split line descends into the upper/right quadrant, so every
//! point of the root lands in exactly one leaf.

use crate::errors::IndexError;
use crate::float_types::Real;
use crate::stipple::dot::StippleDot;
use std::ops::Range;

/// Closed integer rectangle `[x0, x1] × [y0, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    /// Normalizes the corners so that `x0 <= x1` and `y0 <= y1`.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Rect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub const fn width(&self) -> u32 {
        self.x1.abs_diff(self.x0)
    }

    pub const fn height(&self) -> u32 {
        self.y1.abs_diff(self.y0)
    }

    pub fn contains_point(&self, x: Real, y: Real) -> bool {
        (self.x0 as Real..=self.x1 as Real).contains(&x)
            && (self.y0 as Real..=self.y1 as Real).contains(&y)
    }

    pub const fn contains(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && other.x1 <= self.x1 && self.y0 <= other.y0 && other.y1 <= self.y1
    }

    /// Overlap of two closed rectangles; touching edges count.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let overlap = Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (overlap.x0 <= overlap.x1 && overlap.y0 <= overlap.y1).then_some(overlap)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    pub const fn padded(&self, padding: i32) -> Rect {
        Rect {
            x0: self.x0.saturating_sub(padding),
            y0: self.y0.saturating_sub(padding),
            x1: self.x1.saturating_add(padding),
            y1: self.y1.saturating_add(padding),
        }
    }

    const fn midpoint(&self) -> (i32, i32) {
        (self.x0 + (self.x1 - self.x0) / 2, self.y0 + (self.y1 - self.y0) / 2)
    }

    /// Sub-rectangle of `quadrant` (0..4).
    pub const fn quadrant(&self, quadrant: usize) -> Rect {
        let (mx, my) = self.midpoint();
        match quadrant {
            0 => Rect { x0: self.x0, y0: self.y0, x1: mx, y1: my },
            1 => Rect { x0: mx, y0: self.y0, x1: self.x1, y1: my },
            2 => Rect { x0: self.x0, y0: my, x1: mx, y1: self.y1 },
            _ => Rect { x0: mx, y0: my, x1: self.x1, y1: self.y1 },
        }
    }

    /// Quadrant a point of this rectangle descends into.
    fn quadrant_of(&self, x: Real, y: Real) -> usize {
        let (mx, my) = self.midpoint();
        usize::from(x >= mx as Real) + 2 * usize::from(y >= my as Real)
    }
}

#[derive(Debug, Clone)]
struct QuadNode {
    area: Rect,
    /// Arena index of the first child; the four children are consecutive
    /// subtrees in quadrant order.
    children: Option<[usize; 4]>,
    /// Leaf buckets below this node.
    leaves: Range<usize>,
}

/// Spatial index of placed dots.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    nodes: Vec<QuadNode>,
    buckets: Vec<Vec<StippleDot>>,
    depth: u32,
    len: usize,
}

impl SpatialIndex {
    /// Build a complete tree of `depth` levels below the root over `area`.
    pub fn new(area: Rect, depth: u32) -> Self {
        let node_count = (4usize.pow(depth + 1) - 1) / 3;
        let mut index = SpatialIndex {
            nodes: Vec::with_capacity(node_count),
            buckets: Vec::with_capacity(4usize.pow(depth)),
            depth,
            len: 0,
        };
        index.build(area, depth);
        index
    }

    /// Append the subtree rooted at `area`, returning its arena index.
    fn build(&mut self, area: Rect, depth: u32) -> usize {
        let id = self.nodes.len();
        let first_leaf = self.buckets.len();
        self.nodes.push(QuadNode {
            area,
            children: None,
            leaves: first_leaf..first_leaf,
        });

        if depth == 0 {
            self.buckets.push(Vec::new());
        } else {
            let children = [0, 1, 2, 3].map(|q| self.build(area.quadrant(q), depth - 1));
            self.nodes[id].children = Some(children);
        }
        self.nodes[id].leaves = first_leaf..self.buckets.len();
        id
    }

    pub const fn depth(&self) -> u32 {
        self.depth
    }

    pub fn root_area(&self) -> Rect {
        self.nodes[0].area
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of stored dots.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `dot` in the leaf containing its final position.
    pub fn insert(&mut self, dot: StippleDot) -> Result<(), IndexError> {
        let p = dot.final_position();
        if !self.nodes[0].area.contains_point(p.x, p.y) {
            return Err(IndexError::OutOfCanvas { x: p.x, y: p.y });
        }
        let mut node = &self.nodes[0];
        while let Some(children) = node.children {
            node = &self.nodes[children[node.area.quadrant_of(p.x, p.y)]];
        }
        let bucket = node.leaves.start;
        self.buckets[bucket].push(dot);
        self.len += 1;
        Ok(())
    }

    /// Leaf buckets whose area touches `rect` grown by `padding` on every
    /// side. Each bucket appears at most once.
    pub fn query_padded(&self, rect: Rect, padding: i32) -> Vec<&[StippleDot]> {
        let mut ranges = Vec::new();
        if let Some(query) = self.root_area().intersection(&rect.padded(padding)) {
            self.collect(0, &query, &mut ranges);
        }
        ranges
            .into_iter()
            .flat_map(|range: Range<usize>| self.buckets[range].iter().map(Vec::as_slice))
            .collect()
    }

    fn collect(&self, id: usize, query: &Rect, out: &mut Vec<Range<usize>>) {
        let node = &self.nodes[id];
        if !node.area.intersects(query) {
            return;
        }
        match node.children {
            Some(children) if !query.contains(&node.area) => {
                for child in children {
                    self.collect(child, query, out);
                }
            },
            _ => out.push(node.leaves.clone()),
        }
    }

    pub fn dots_in_area(&self, rect: Rect) -> Vec<&[StippleDot]> {
        self.query_padded(rect, 0)
    }

    pub fn dots_in_padded_area(&self, rect: Rect, padding: i32) -> Vec<&[StippleDot]> {
        self.query_padded(rect, padding)
    }

    /// Every leaf bucket, in leaf order.
    pub fn dots_in_full_area(&self) -> Vec<&[StippleDot]> {
        self.buckets.iter().map(Vec::as_slice).collect()
    }

    /// All dots in leaf order.
    pub fn iter(&self) -> impl Iterator<Item = &StippleDot> {
        self.buckets.iter().flatten()
    }

    pub fn into_dots(self) -> Vec<StippleDot> {
        self.buckets.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Vector2};
    use proptest::prelude::*;

    fn dot(x: Real, y: Real) -> StippleDot {
        StippleDot::new(Point2::new(x, y), Vector2::new(4.0, 4.0), 0)
    }

    fn flatten(buckets: Vec<&[StippleDot]>) -> Vec<StippleDot> {
        buckets.into_iter().flatten().copied().collect()
    }

    #[test]
    fn complete_tree_shape() {
        let index = SpatialIndex::new(Rect::new(0, 0, 64, 64), 3);
        assert_eq!(index.node_count(), 1 + 4 + 16 + 64);
        assert_eq!(index.leaf_count(), 64);
        assert_eq!(index.root_area(), Rect::new(0, 0, 64, 64));
        assert!(index.is_empty());
    }

    #[test]
    fn quadrant_layout() {
        let r = Rect::new(0, 0, 9, 5);
        assert_eq!(r.quadrant(0), Rect::new(0, 0, 4, 2));
        assert_eq!(r.quadrant(1), Rect::new(4, 0, 9, 2));
        assert_eq!(r.quadrant(2), Rect::new(0, 2, 4, 5));
        assert_eq!(r.quadrant(3), Rect::new(4, 2, 9, 5));
    }

    #[test]
    fn outside_dots_are_rejected() {
        let mut index = SpatialIndex::new(Rect::new(0, 0, 10, 10), 2);
        assert_eq!(
            index.insert(dot(11.0, 3.0)),
            Err(IndexError::OutOfCanvas { x: 11.0, y: 3.0 })
        );
        assert!(index.insert(dot(10.0, 10.0)).is_ok());
        assert!(index.insert(dot(0.0, 0.0)).is_ok());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn split_line_point_is_stored_once() {
        let mut index = SpatialIndex::new(Rect::new(0, 0, 16, 16), 2);
        index.insert(dot(8.0, 8.0)).expect("inside");
        assert_eq!(flatten(index.dots_in_full_area()).len(), 1);
        // top-right leaf of the top-right quadrant is [12,16]², untouched
        assert!(flatten(index.dots_in_area(Rect::new(13, 13, 16, 16))).is_empty());
        assert_eq!(flatten(index.dots_in_area(Rect::new(8, 8, 8, 8))).len(), 1);
    }

    #[test]
    fn local_query_skips_far_leaves() {
        let mut index = SpatialIndex::new(Rect::new(0, 0, 128, 128), 4);
        index.insert(dot(2.0, 2.0)).expect("near");
        index.insert(dot(120.0, 120.0)).expect("far");
        let found = flatten(index.query_padded(Rect::new(0, 0, 4, 4), 2));
        assert_eq!(found, vec![dot(2.0, 2.0)]);
        assert!(index.query_padded(Rect::new(0, 0, 4, 4), 2).len() < index.leaf_count());
    }

    #[test]
    fn offset_dots_are_located_by_final_position() {
        let mut index = SpatialIndex::new(Rect::new(0, 0, 32, 32), 3);
        let mut shifted = dot(2.0, 2.0);
        shifted.offset = Vector2::new(25.0, 25.0);
        index.insert(shifted).expect("inside");
        assert!(flatten(index.dots_in_area(Rect::new(0, 0, 3, 3))).is_empty());
        assert_eq!(flatten(index.dots_in_area(Rect::new(26, 26, 28, 28))).len(), 1);
    }

    proptest! {
        #[test]
        fn full_query_returns_each_dot_once(
            points in prop::collection::vec((0.0..=200.0f64, 0.0..=150.0f64), 0..200),
            depth in 0u32..5,
        ) {
            let mut index = SpatialIndex::new(Rect::new(0, 0, 200, 150), depth);
            for (k, &(x, y)) in points.iter().enumerate() {
                let mut d = dot(x as Real, y as Real);
                d.sprite = k as u32;
                prop_assert!(index.insert(d).is_ok());
            }
            let mut sprites: Vec<u32> = flatten(index.query_padded(index.root_area(), 0))
                .iter()
                .map(|d| d.sprite)
                .collect();
            sprites.sort_unstable();
            prop_assert_eq!(sprites, (0..points.len() as u32).collect::<Vec<_>>());
        }

        #[test]
        fn padded_query_covers_overlapping_sprites(
            points in prop::collection::vec((0.0..=100.0f64, 0.0..=100.0f64), 1..100),
            (qx, qy, qw, qh) in (0i32..90, 0i32..90, 0i32..20, 0i32..20),
        ) {
            let mut index = SpatialIndex::new(Rect::new(0, 0, 100, 100), 4);
            for &(x, y) in &points {
                index.insert(dot(x as Real, y as Real)).expect("inside");
            }
            let query = Rect::new(qx, qy, qx + qw, qy + qh);
            let found = flatten(index.query_padded(query, 2));
            for &(x, y) in &points {
                let (x, y) = (x as Real, y as Real);
                let overlaps = x + 2.0 >= query.x0 as Real
                    && x - 2.0 <= query.x1 as Real
                    && y + 2.0 >= query.y0 as Real
                    && y - 2.0 <= query.y1 as Real;
                if overlaps {
                    prop_assert!(found.contains(&dot(x, y)));
                }
            }
        }
    }
}
