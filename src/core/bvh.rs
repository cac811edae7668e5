// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;

const MAX_LEAF_SIZE: usize = 4;

#[derive(Clone)]
struct BVHNode {
    bounds: AABB,
    left: Option<usize>,
    right: Option<usize>,
    start: usize,
    count: usize,
}

impl BVHNode {
    fn leaf(bounds: AABB, start: usize, count: usize) -> Self {
        Self { bounds, left: None, right: None, start, count }
    }

    fn interior(bounds: AABB, left: usize, right: usize) -> Self {
        Self { bounds, left: Some(left), right: Some(right), start: 0, count: 0 }
    }

    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// Bounding-volume hierarchy over opaque primitives. The tree stores only
/// bounds; primitive intersection is delegated to a callback so the same
/// structure serves both shape elements and whole instances.
pub struct BVH {
    nodes: Vec<BVHNode>,
    indices: Vec<usize>,
}

impl BVH {
    pub fn build(prim_bounds: &[AABB]) -> Self {
        let mut bvh = Self {
            nodes: Vec::new(),
            indices: (0..prim_bounds.len()).collect(),
        };
        if !bvh.indices.is_empty() {
            bvh.build_node(prim_bounds, 0, prim_bounds.len());
        }
        bvh
    }

    // Median split along the longest centroid axis.
    fn build_node(&mut self, prim_bounds: &[AABB], start: usize, end: usize) -> usize {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for &idx in &self.indices[start..end] {
            bounds.expand_by_aabb(&prim_bounds[idx]);
            centroid_bounds.expand_by_point(&prim_bounds[idx].center());
        }

        let count = end - start;
        if count <= MAX_LEAF_SIZE {
            self.nodes.push(BVHNode::leaf(bounds, start, count));
            return self.nodes.len() - 1;
        }

        let axis = centroid_bounds.longest_axis();
        let mid = start + count / 2;
        self.indices[start..end].sort_unstable_by(|&a, &b| {
            let ca = prim_bounds[a].center()[axis];
            let cb = prim_bounds[b].center()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let node_index = self.nodes.len();
        self.nodes.push(BVHNode::leaf(AABB::default(), 0, 0));
        let left = self.build_node(prim_bounds, start, mid);
        let right = self.build_node(prim_bounds, mid, end);
        self.nodes[node_index] = BVHNode::interior(bounds, left, right);
        node_index
    }

    /// Nearest-hit query. The callback intersects one primitive against the
    /// (max_t-clipped) ray and returns its payload and hit distance; the
    /// traversal keeps the closest payload.
    pub fn intersect<T, F>(&self, ray: &Ray3f, mut test: F) -> Option<(usize, T)>
    where
        F: FnMut(usize, &Ray3f) -> Option<(T, Float)>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut clipped = Ray3f::new(ray.origin(), ray.dir(),
                                     Some(ray.min_t), Some(ray.max_t));
        let mut closest: Option<(usize, T)> = None;
        let mut stack = vec![0usize];

        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            if !node.bounds.ray_intersect(&clipped) {
                continue;
            }

            if node.is_leaf() {
                for &prim in &self.indices[node.start..node.start + node.count] {
                    if let Some((payload, t)) = test(prim, &clipped) {
                        if clipped.update(t) {
                            closest = Some((prim, payload));
                        }
                    }
                }
            } else {
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }

        closest
    }
}
