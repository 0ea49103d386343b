use ultraviolet::DVec3;

/// An axis-aligned bounding box defined by its minimum and maximum corners.
///
/// The box is closed: [`contains`](Aabb::contains) is inclusive on all six
/// faces. Subdividing a box with [`octant`](Aabb::octant) yields eight child
/// boxes that exactly tile it at its center, overlapping only on shared
/// faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the box.
    pub min: DVec3,
    /// Maximum corner of the box.
    pub max: DVec3,
}

/// Returns the octant index of `point` relative to `center`.
///
/// Bits 0, 1 and 2 are set when the point is strictly greater than the
/// center on the x, y and z axes respectively. A coordinate exactly equal to
/// the center resolves to the lower half, so a point on the center itself
/// has index 0.
#[inline]
pub fn octant_index(center: DVec3, point: DVec3) -> usize {
    usize::from(point.x > center.x)
        | usize::from(point.y > center.y) << 1
        | usize::from(point.z > center.z) << 2
}

impl Aabb {
    /// Creates a new [`Aabb`] with the given min and max corners.
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Creates a cube of the given half-extent centered on `center`.
    #[inline]
    pub fn cube(center: DVec3, half_extent: f64) -> Self {
        Self::new(
            center - DVec3::broadcast(half_extent),
            center + DVec3::broadcast(half_extent),
        )
    }

    /// Extends the box so that it contains the given point.
    #[inline]
    pub fn extend(&mut self, point: DVec3) {
        self.min = self.min.min_by_component(point);
        self.max = self.max.max_by_component(point);
    }

    /// Creates the smallest [`Aabb`] containing the given points, or `None`
    /// when the iterator is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut result = Self::new(first, first);
        for point in points {
            result.extend(point);
        }
        Some(result)
    }

    /// Returns the center of the box, the elementwise midpoint of its
    /// corners.
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the size of the box on each axis.
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Returns `true` when the point lies inside the box, inclusive on all
    /// six faces.
    #[inline]
    pub fn contains(&self, point: DVec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Returns the child box for the given octant index, as produced by
    /// [`octant_index`].
    ///
    /// Each axis independently takes either the lower half `[min, center]`
    /// or the upper half `[center, max]` of the parent, selected by the
    /// corresponding index bit.
    pub fn octant(&self, index: usize) -> Self {
        let center = self.center();
        let split = |upper: bool, min: f64, mid: f64, max: f64| {
            if upper {
                (mid, max)
            } else {
                (min, mid)
            }
        };

        let (min_x, max_x) = split(index & 0b001 != 0, self.min.x, center.x, self.max.x);
        let (min_y, max_y) = split(index & 0b010 != 0, self.min.y, center.y, self.max.y);
        let (min_z, max_z) = split(index & 0b100 != 0, self.min.z, center.z, self.max.z);

        Self::new(
            DVec3::new(min_x, min_y, min_z),
            DVec3::new(max_x, max_y, max_z),
        )
    }

    /// Subdivides the box into its eight octants, indexed by
    /// [`octant_index`].
    #[inline]
    pub fn octants(&self) -> [Self; 8] {
        std::array::from_fn(|i| self.octant(i))
    }
}
