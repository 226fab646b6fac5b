//! Parallel versions of the BSP tree walks, enabled by the `parallel` feature

use crate::mesh::bsp::Node;
use rayon::join;

impl Node {
    /// Invert all polygons in the BSP tree, subtrees in parallel
    pub fn invert(&mut self) {
        self.polygons.iter_mut().for_each(|p| p.flip());
        if let Some(ref mut plane) = self.plane {
            plane.flip();
        }

        match (&mut self.front, &mut self.back) {
            (Some(front_node), Some(back_node)) => {
                join(|| front_node.invert(), || back_node.invert());
            },
            (Some(front_node), None) => front_node.invert(),
            (None, Some(back_node)) => back_node.invert(),
            (None, None) => {},
        }

        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove all polygons in this BSP tree that are inside `bsp`, clipping
    /// this node and both subtrees concurrently.
    pub fn clip_to(&mut self, bsp: &Node) {
        let polygons = std::mem::take(&mut self.polygons);
        let (front, back) = (&mut self.front, &mut self.back);

        let (clipped, _) = join(
            || bsp.clip_polygons(&polygons),
            || {
                join(
                    || {
                        if let Some(front) = front.as_mut() {
                            front.clip_to(bsp);
                        }
                    },
                    || {
                        if let Some(back) = back.as_mut() {
                            back.clip_to(bsp);
                        }
                    },
                )
            },
        );
        self.polygons = clipped;
    }
}
