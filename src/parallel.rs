use crate::bounds::{octant_index, Aabb};
use crate::tree::{Node, Octree};

use rayon::prelude::*;
use ultraviolet::DVec3;

impl Octree {
    /// Builds an octree over `bounds` from the given points using one rayon
    /// task per top-level octant.
    ///
    /// Insertion only ever mutates the path to its target octant, so the
    /// input can be partitioned by top-level octant and the eight subtrees
    /// built independently. Partitioning preserves the relative order of
    /// points within each octant, so the resulting tree and the rejected
    /// points are identical to those of [`from_points`](Octree::from_points).
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "octree::par_from_points"))]
    pub fn par_from_points(bounds: Aabb, points: &[DVec3]) -> (Self, Vec<DVec3>) {
        // Rejects are collected during the sequential partition pass, so
        // their order matches `from_points` exactly.
        let center = bounds.center();
        let octants = bounds.octants();

        let mut buckets: [Vec<DVec3>; 8] = std::array::from_fn(|_| Vec::new());
        let mut rejected = Vec::new();
        for &point in points {
            if bounds.contains(point) {
                buckets[octant_index(center, point)].push(point);
            } else {
                rejected.push(point);
            }
        }

        let mut children: [Node; 8] = std::array::from_fn(|_| Node::Empty);
        children
            .par_iter_mut()
            .zip(octants.par_iter().zip(buckets.par_iter()))
            .for_each(|(child, (&octant, bucket))| {
                for &point in bucket {
                    child.insert(octant, point, 1);
                }
            });

        let len = points.len() - rejected.len();

        #[cfg(feature = "tracing")]
        tracing::debug!(accepted = len, rejected = rejected.len(), "octree built");

        (Self::from_parts(bounds, children, len), rejected)
    }
}
