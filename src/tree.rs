use crate::bounds::{octant_index, Aabb};

use smallvec::{smallvec, SmallVec};
use thiserror::Error;
use ultraviolet::DVec3;

/// Number of midpoint subdivisions after which a colliding leaf absorbs new
/// points instead of splitting again.
///
/// Past roughly 52 halvings the midpoint of an `f64` interval can no longer
/// separate two distinct coordinates, so splitting further would recurse
/// without making progress. Duplicate points hit this cap and accumulate in
/// a single multi-point leaf; no accepted point is ever dropped.
pub const MAX_SPLIT_DEPTH: u32 = 64;

/// Error returned when a point lies outside the tree's root volume.
///
/// The offending point is carried so bulk insertion can report exactly which
/// inputs were skipped. Rejection leaves the tree untouched.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
#[error("point {0:?} lies outside the root volume")]
pub struct OutOfBounds(pub DVec3);

/// Points stored in a leaf. A single point in the common case; more only
/// when [`MAX_SPLIT_DEPTH`] collapses indiscernible points into one cell.
pub type LeafPoints = SmallVec<[DVec3; 1]>;

/// A node of the octree, one per octant slot of its parent.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// No point has landed in this octant yet.
    Empty,
    /// An occupied octant that has not been subdivided.
    Leaf(LeafPoints),
    /// A subdivided octant.
    Branch(Box<Branch>),
}

impl Node {
    /// Places `point` into this node, `bounds` being the octant slot the
    /// node occupies and `depth` its distance from the root.
    pub(crate) fn insert(&mut self, bounds: Aabb, point: DVec3, depth: u32) {
        match self {
            Node::Empty => *self = Node::Leaf(smallvec![point]),
            Node::Leaf(points) => {
                if depth >= MAX_SPLIT_DEPTH {
                    points.push(point);
                    return;
                }

                // Promotion: the prior occupant keeps representative
                // priority and is re-inserted before the new point.
                let points = std::mem::take(points);
                let mut branch = Branch::new(bounds, points[0]);
                for p in points {
                    branch.insert(p, depth);
                }
                branch.insert(point, depth);

                *self = Node::Branch(Box::new(branch));
            }
            Node::Branch(branch) => branch.insert(point, depth),
        }
    }

    fn subsample(&self, budget: u32, out: &mut Vec<DVec3>) {
        match self {
            Node::Empty => {}
            // A leaf is a single point already at maximal resolution and is
            // emitted regardless of the remaining budget.
            Node::Leaf(points) => out.extend(points.iter().copied()),
            Node::Branch(branch) => {
                if budget > 0 {
                    branch.subsample(budget - 1, out);
                } else {
                    out.push(branch.representative);
                }
            }
        }
    }
}

/// A subdivided region of the tree: a bounding volume split at its midpoint
/// into eight child [`Node`]s.
///
/// A branch is only ever created by promoting a colliding leaf and is never
/// demoted, so it always holds a representative point: the first point ever
/// inserted into its subtree, retained unchanged by everything inserted
/// beneath it afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    bounds: Aabb,
    center: DVec3,
    representative: DVec3,
    children: [Node; 8],
}

impl Branch {
    fn new(bounds: Aabb, representative: DVec3) -> Self {
        Self {
            bounds,
            center: bounds.center(),
            representative,
            children: std::array::from_fn(|_| Node::Empty),
        }
    }

    /// The volume this branch subdivides.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// The first point ever inserted into this subtree, emitted in place of
    /// the whole subtree when a traversal's depth budget runs out.
    #[inline]
    pub fn representative(&self) -> DVec3 {
        self.representative
    }

    /// The eight children of this branch, indexed by
    /// [`octant_index`](crate::bounds::octant_index).
    #[inline]
    pub fn children(&self) -> &[Node; 8] {
        &self.children
    }

    fn insert(&mut self, point: DVec3, depth: u32) {
        let index = octant_index(self.center, point);
        let bounds = self.bounds.octant(index);
        self.children[index].insert(bounds, point, depth + 1);
    }

    fn subsample(&self, budget: u32, out: &mut Vec<DVec3>) {
        for child in &self.children {
            child.subsample(budget, out);
        }
    }
}

/// An octree over a fixed root volume, built by inserting points one at a
/// time and queried with a depth-bounded [`subsample`](Octree::subsample)
/// traversal.
///
/// The root volume never grows: points outside it are rejected with
/// [`OutOfBounds`]. Size the root to cover all expected input, or collect
/// the rejects from [`from_points`](Octree::from_points) and rebuild over a
/// larger volume.
///
/// # Example
///
/// ```
/// # use pointillist::prelude::*;
/// # use ultraviolet::DVec3;
/// let mut tree = Octree::new(Aabb::cube(DVec3::zero(), 10.0));
/// tree.insert(DVec3::new(1.0, 1.0, 1.0))?;
/// tree.insert(DVec3::new(-5.0, -5.0, -5.0))?;
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree.subsample(0).len(), 2);
/// # Ok::<(), pointillist::tree::OutOfBounds>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Octree {
    bounds: Aabb,
    center: DVec3,
    children: [Node; 8],
    len: usize,
}

impl Octree {
    /// Creates an empty octree covering `bounds`.
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            center: bounds.center(),
            children: std::array::from_fn(|_| Node::Empty),
            len: 0,
        }
    }

    pub(crate) fn from_parts(bounds: Aabb, children: [Node; 8], len: usize) -> Self {
        Self {
            bounds,
            center: bounds.center(),
            children,
            len,
        }
    }

    /// Builds an octree over `bounds` from the given points, inserted in
    /// order, and returns it along with the points that were rejected for
    /// lying outside `bounds`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "octree::from_points"))]
    pub fn from_points<I>(bounds: Aabb, points: I) -> (Self, Vec<DVec3>)
    where
        I: IntoIterator<Item = DVec3>,
    {
        let mut tree = Self::new(bounds);
        let mut rejected = Vec::new();

        for point in points {
            if let Err(OutOfBounds(point)) = tree.insert(point) {
                rejected.push(point);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(accepted = tree.len, rejected = rejected.len(), "octree built");

        (tree, rejected)
    }

    /// The root volume of the tree.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// The eight top-level children, indexed by
    /// [`octant_index`](crate::bounds::octant_index).
    #[inline]
    pub fn children(&self) -> &[Node; 8] {
        &self.children
    }

    /// Number of points accepted into the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no point has been accepted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a point, recursing from the root to the octant it lands in
    /// and promoting a colliding leaf to a branch along the way.
    ///
    /// Only the path from the root to the landing node is touched. A point
    /// outside the root volume is rejected with [`OutOfBounds`] and the tree
    /// is left unmodified.
    pub fn insert(&mut self, point: DVec3) -> Result<(), OutOfBounds> {
        if !self.bounds.contains(point) {
            return Err(OutOfBounds(point));
        }

        let index = octant_index(self.center, point);
        let bounds = self.bounds.octant(index);
        self.children[index].insert(bounds, point, 1);
        self.len += 1;

        Ok(())
    }

    /// Walks the tree down to `max_depth` levels below the root and collects
    /// the downsampled output.
    ///
    /// Children are visited in octant-index order and the depth budget
    /// shrinks by one per level. Leaves are always emitted; a branch deeper
    /// than the budget contributes its representative point in place of its
    /// entire subtree. The output is a pure function of the tree and
    /// `max_depth`: with `max_depth = 0` each occupied top-level octant
    /// yields one point, and increasing the budget only ever refines the
    /// result.
    pub fn subsample(&self, max_depth: u32) -> Vec<DVec3> {
        let mut out = Vec::new();
        for child in &self.children {
            child.subsample(max_depth, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn root() -> Aabb {
        Aabb::new(DVec3::broadcast(-10.0), DVec3::broadcast(10.0))
    }

    fn random_cloud(seed: u64, len: usize) -> Vec<DVec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|_| {
                DVec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                )
            })
            .collect()
    }

    #[test]
    fn first_insert_becomes_a_leaf() {
        let mut tree = Octree::new(root());
        tree.insert(DVec3::new(1.0, 1.0, 1.0)).unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.children()[0b111],
            Node::Leaf(smallvec![DVec3::new(1.0, 1.0, 1.0)])
        );
    }

    #[test]
    fn midpoint_ties_land_in_the_all_lower_octant() {
        let mut tree = Octree::new(root());
        tree.insert(DVec3::zero()).unwrap();

        assert_eq!(tree.children()[0], Node::Leaf(smallvec![DVec3::zero()]));
    }

    #[test]
    fn out_of_bounds_is_rejected_and_leaves_the_tree_unchanged() {
        let (mut tree, _) = Octree::from_points(root(), random_cloud(1, 100));
        let before = tree.clone();
        let samples = before.subsample(3);

        let outside = DVec3::new(10.5, 0.0, 0.0);
        assert_eq!(tree.insert(outside), Err(OutOfBounds(outside)));

        assert_eq!(tree, before);
        assert_eq!(tree.subsample(3), samples);
    }

    #[test]
    fn from_points_reports_rejects_in_order() {
        let points = vec![
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(99.0, 0.0, 0.0),
            DVec3::new(-1.0, -2.0, -3.0),
            DVec3::new(0.0, -11.0, 0.0),
        ];

        let (tree, rejected) = Octree::from_points(root(), points);
        assert_eq!(tree.len(), 2);
        assert_eq!(
            rejected,
            vec![DVec3::new(99.0, 0.0, 0.0), DVec3::new(0.0, -11.0, 0.0)]
        );
    }

    #[test]
    fn promotion_keeps_the_first_point_as_representative() {
        let mut tree = Octree::new(root());
        tree.insert(DVec3::new(1.0, 1.0, 1.0)).unwrap();
        tree.insert(DVec3::new(1.0, 1.0, 1.5)).unwrap();

        let Node::Branch(branch) = &tree.children()[0b111] else {
            panic!("colliding leaf was not promoted");
        };
        assert_eq!(branch.representative(), DVec3::new(1.0, 1.0, 1.0));
        assert_eq!(branch.bounds(), root().octant(0b111));
    }

    // The three-point cloud from the worked example: two points share the
    // upper-upper-upper octant and only separate three splits further down,
    // when a cell's z midpoint falls between 1 and 1.5.
    #[test]
    fn subsample_emits_representatives_when_the_budget_runs_out() {
        let (tree, rejected) = Octree::from_points(
            root(),
            vec![
                DVec3::new(1.0, 1.0, 1.0),
                DVec3::new(1.0, 1.0, 1.5),
                DVec3::new(-5.0, -5.0, -5.0),
            ],
        );
        assert!(rejected.is_empty());

        // Budget exhausted at the promoted octant: its representative
        // stands in for both points. The lone leaf is emitted regardless.
        for depth in 0..3 {
            assert_eq!(
                tree.subsample(depth),
                vec![DVec3::new(-5.0, -5.0, -5.0), DVec3::new(1.0, 1.0, 1.0)],
            );
        }

        // Enough budget to reach the leaves: all three points come out.
        for depth in 3..6 {
            assert_eq!(
                tree.subsample(depth),
                vec![
                    DVec3::new(-5.0, -5.0, -5.0),
                    DVec3::new(1.0, 1.0, 1.0),
                    DVec3::new(1.0, 1.0, 1.5),
                ],
            );
        }
    }

    #[test]
    fn subsample_is_deterministic() {
        let (tree, _) = Octree::from_points(root(), random_cloud(7, 500));
        assert_eq!(tree.subsample(4), tree.subsample(4));

        let (rebuilt, _) = Octree::from_points(root(), random_cloud(7, 500));
        assert_eq!(tree.subsample(4), rebuilt.subsample(4));
    }

    #[test]
    fn subsample_cardinality_is_monotonic_and_bounded() {
        let (tree, _) = Octree::from_points(root(), random_cloud(42, 2000));

        let mut previous = 0;
        for depth in 0..24 {
            let len = tree.subsample(depth).len();
            assert!(len >= previous, "output shrank at depth {depth}");
            assert!(len <= tree.len());
            previous = len;
        }

        // Deep enough to reach every leaf: the full cloud comes back out.
        assert_eq!(previous, tree.len());
    }

    #[test]
    fn subsampled_points_lie_within_the_root_volume() {
        let (tree, _) = Octree::from_points(root(), random_cloud(3, 300));
        for depth in [0, 2, 8] {
            for point in tree.subsample(depth) {
                assert!(tree.bounds().contains(point));
            }
        }
    }

    #[test]
    fn duplicate_points_collapse_into_a_capped_leaf() {
        let mut tree = Octree::new(root());
        let point = DVec3::new(1.0, 2.0, 3.0);
        for _ in 0..3 {
            tree.insert(point).unwrap();
        }

        assert_eq!(tree.len(), 3);

        // All three copies survive and come back out once the budget
        // reaches the capped leaf.
        let full = tree.subsample(MAX_SPLIT_DEPTH);
        assert_eq!(full, vec![point; 3]);

        // At a shallow depth the shared representative stands in for them.
        assert_eq!(tree.subsample(0), vec![point]);
    }

    #[test]
    fn empty_tree_subsamples_to_nothing() {
        let tree = Octree::new(root());
        assert!(tree.is_empty());
        assert!(tree.subsample(0).is_empty());
        assert!(tree.subsample(10).is_empty());
    }
}
