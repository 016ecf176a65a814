//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree built once at scene load by median split along the longest
//! bounding-box axis. Leaves store indices into the owning object union's
//! primitive list, so the tree never owns geometry.

use crate::hit::RawHit;
use crate::primitive::Primitive;
use crate::ray::Ray;
use crate::EPSILON;
use helios_math::{Aabb, Interval, Vec3};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 12;

/// BVH node - either a branch with two children or a leaf with primitive indices.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of primitives.
    Leaf { indices: Vec<usize>, bbox: Aabb },
}

impl BvhNode {
    /// Build a BVH over all primitives in the slice.
    pub fn build(primitives: &[Primitive]) -> Self {
        let indices: Vec<usize> = (0..primitives.len()).collect();
        let centroids: Vec<Vec3> = primitives.iter().map(|p| p.centroid()).collect();
        let bboxes: Vec<Aabb> = primitives.iter().map(|p| p.bounding_box()).collect();
        Self::build_node(indices, &centroids, &bboxes)
    }

    fn build_node(mut indices: Vec<usize>, centroids: &[Vec3], bboxes: &[Aabb]) -> Self {
        let bbox = indices
            .iter()
            .map(|&i| bboxes[i])
            .reduce(|a, b| Aabb::merge(&a, &b))
            .unwrap_or(Aabb::EMPTY);

        if indices.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf { indices, bbox };
        }

        let axis = bbox.longest_axis();
        indices.sort_unstable_by(|&a, &b| {
            centroids[a][axis]
                .partial_cmp(&centroids[b][axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let right_indices = indices.split_off(indices.len() / 2);
        let left = Self::build_node(indices, centroids, bboxes);
        let right = Self::build_node(right_indices, centroids, bboxes);

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox,
        }
    }

    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } => bbox,
            BvhNode::Leaf { bbox, .. } => bbox,
        }
    }

    /// Closest hit within the hierarchy, if any.
    ///
    /// Returns the distance and the index of the struck primitive in the
    /// owning union's list.
    pub fn intersect(&self, ray: &Ray, t_max: f64, primitives: &[Primitive]) -> Option<RawHit> {
        let clip = Interval::new(EPSILON, t_max);
        self.bbox().entry(ray.origin(), ray.direction(), clip)?;

        let mut best: Option<RawHit> = None;
        self.traverse(ray, t_max, primitives, &mut best);
        best
    }

    fn traverse(&self, ray: &Ray, t_max: f64, primitives: &[Primitive], best: &mut Option<RawHit>) {
        match self {
            BvhNode::Leaf { indices, .. } => {
                for &i in indices {
                    let limit = best.map_or(t_max, |h| h.distance);
                    if let Some(raw) = primitives[i].intersect(ray, limit) {
                        if raw.distance > EPSILON && raw.distance < limit {
                            *best = Some(RawHit {
                                distance: raw.distance,
                                primitive_id: i,
                            });
                        }
                    }
                }
            }
            BvhNode::Branch { left, right, .. } => {
                let limit = best.map_or(t_max, |h| h.distance);
                let clip = Interval::new(EPSILON, limit);
                let d_left = left.bbox().entry(ray.origin(), ray.direction(), clip);
                let d_right = right.bbox().entry(ray.origin(), ray.direction(), clip);

                match (d_left, d_right) {
                    (Some(dl), Some(dr)) => {
                        // Descend the nearer child first; the far child is
                        // pruned when the near descent tightens past its entry.
                        let (near, far, d_far) = if dl <= dr {
                            (left, right, dr)
                        } else {
                            (right, left, dl)
                        };
                        near.traverse(ray, t_max, primitives, best);
                        let limit = best.map_or(t_max, |h| h.distance);
                        if d_far < limit {
                            far.traverse(ray, t_max, primitives, best);
                        }
                    }
                    (Some(_), None) => left.traverse(ray, t_max, primitives, best),
                    (None, Some(_)) => right.traverse(ray, t_max, primitives, best),
                    (None, None) => {}
                }
            }
        }
    }
}
