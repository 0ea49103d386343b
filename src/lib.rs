#![warn(missing_docs)]
//! # Pointillist
//!
//! Pointillist thins unordered 3-D point clouds: it builds an octree over a
//! caller-supplied root volume and walks it back down to a bounded depth,
//! emitting a smaller set of points that preserves spatial coverage while
//! discarding density inside small cells.
//!
//! ## How it works
//!
//! An [`Octree`] starts empty over a fixed root volume. Each inserted point
//! recurses from the root to the octant it falls in: an empty slot becomes a
//! leaf, and a second point colliding with a leaf promotes that leaf to a
//! branch of eight children, re-inserting both points one level down. Every
//! branch remembers its *representative point*, the first point ever
//! inserted into its subtree.
//!
//! [`Octree::subsample`] then walks the finished tree with a depth budget
//! that shrinks by one per level. Leaves are always emitted; a branch deeper
//! than the budget yields its representative point in place of its whole
//! subtree. Smaller budgets give coarser output, and the traversal is fully
//! deterministic for a given tree and budget.
//!
//! Reading points from files and writing the thinned output back are the
//! caller's business; this crate only consumes and produces in-memory
//! [`DVec3`](ultraviolet::DVec3) sequences.
//!
//! ## Example
//!
//! ```
//! use pointillist::prelude::*;
//! use ultraviolet::DVec3;
//!
//! let bounds = Aabb::new(DVec3::broadcast(-10.0), DVec3::broadcast(10.0));
//! let mut tree = Octree::new(bounds);
//!
//! tree.insert(DVec3::new(1.0, 1.0, 1.0))?;
//! tree.insert(DVec3::new(1.0, 1.0, 1.5))?;
//! tree.insert(DVec3::new(-5.0, -5.0, -5.0))?;
//!
//! // With no depth budget, each occupied top-level octant contributes one
//! // point: the two clustered points are folded into their representative.
//! assert_eq!(
//!     tree.subsample(0),
//!     vec![DVec3::new(-5.0, -5.0, -5.0), DVec3::new(1.0, 1.0, 1.0)],
//! );
//!
//! // A deep walk recovers every point.
//! assert_eq!(tree.subsample(10).len(), 3);
//! # Ok::<(), pointillist::tree::OutOfBounds>(())
//! ```
//!
//! Points outside the root volume are rejected, not silently dropped:
//!
//! ```
//! use pointillist::prelude::*;
//! use ultraviolet::DVec3;
//!
//! let bounds = Aabb::cube(DVec3::zero(), 10.0);
//! let stray = DVec3::new(99.0, 0.0, 0.0);
//!
//! let (tree, rejected) = Octree::from_points(bounds, [DVec3::zero(), stray]);
//! assert_eq!(tree.len(), 1);
//! assert_eq!(rejected, vec![stray]);
//! ```
//!
//! ## Features
//!
//! - `parallel` — `Octree::par_from_points`, which partitions the input by
//!   top-level octant and builds the eight subtrees on [rayon], producing a
//!   tree identical to the sequential build.
//! - `tracing` — [tracing] instrumentation of the bulk constructors.
//!
//! [rayon]: https://github.com/rayon-rs/rayon
//! [tracing]: https://github.com/tokio-rs/tracing

/// Axis-aligned bounding volumes and octant partitioning.
pub mod bounds;
/// The octree itself: insertion, leaf promotion and depth-bounded
/// subsampling.
pub mod tree;

#[cfg(feature = "parallel")]
mod parallel;

pub use bounds::Aabb;
pub use tree::{Octree, OutOfBounds};

/// Commonly used types, re-exported.
pub mod prelude {
    pub use crate::bounds::Aabb;
    pub use crate::tree::{Node, Octree, OutOfBounds};
}
