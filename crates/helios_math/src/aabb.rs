use crate::{Interval, Vec3};

/// Boxes thinner than this along any axis get inflated so axis-parallel
/// geometry (a wall, a flat triangle) still encloses a sliver of volume
/// the slab test can enter.
const MIN_EXTENT: f64 = 1e-4;

/// Axis-aligned bounding box, stored as one [`Interval`] per axis.
///
/// Built once per primitive during BVH construction and queried with
/// [`Aabb::entry`] during traversal; the entry distance is what lets the
/// tree descend into the nearer child first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Encloses nothing; identity element for [`Aabb::merge`].
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Encloses all of space. Unbounded primitives report this.
    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };

    /// The box spanned by two opposite corners, in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let lo = a.min(b);
        let hi = a.max(b);
        Self {
            x: fatten(Interval::new(lo.x, hi.x)),
            y: fatten(Interval::new(lo.y, hi.y)),
            z: fatten(Interval::new(lo.z, hi.z)),
        }
    }

    /// Smallest box covering both inputs.
    pub fn merge(a: &Aabb, b: &Aabb) -> Self {
        Self {
            x: Interval::hull(&a.x, &b.x),
            y: Interval::hull(&a.y, &b.y),
            z: Interval::hull(&a.z, &b.z),
        }
    }

    fn axis(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Distance at which a ray enters this box, clipped to `ray_t`.
    ///
    /// Uses the slab method. Returns `None` when the ray misses the box
    /// within the interval; a ray starting inside the box enters at
    /// `ray_t.min`. Division by a zero direction component yields infinities
    /// that order correctly, so no special case is needed for axis-parallel
    /// rays.
    pub fn entry(&self, origin: Vec3, direction: Vec3, ray_t: Interval) -> Option<f64> {
        let mut t_near = ray_t.min;
        let mut t_far = ray_t.max;

        for axis in 0..3 {
            let interval = self.axis(axis);
            let adinv = 1.0 / direction[axis];
            let mut t0 = (interval.min - origin[axis]) * adinv;
            let mut t1 = (interval.max - origin[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t0.max(t_near);
            t_far = t1.min(t_far);
            if t_far <= t_near {
                return None;
            }
        }

        Some(t_near)
    }

    /// Test if a ray intersects this box within the given interval.
    pub fn hit(&self, origin: Vec3, direction: Vec3, ray_t: Interval) -> bool {
        self.entry(origin, direction, ray_t).is_some()
    }

    /// Index (0 = x, 1 = y, 2 = z) of the widest axis; the BVH splits
    /// along it.
    pub fn longest_axis(&self) -> usize {
        let lengths = [self.x.length(), self.y.length(), self.z.length()];
        let mut widest = 0;
        for axis in 1..3 {
            if lengths[axis] > lengths[widest] {
                widest = axis;
            }
        }
        widest
    }

    /// Center of the box.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(self.x.midpoint(), self.y.midpoint(), self.z.midpoint())
    }
}

/// Guarantee a minimum extent along one axis.
fn fatten(interval: Interval) -> Interval {
    if interval.length() < MIN_EXTENT {
        interval.padded(MIN_EXTENT / 2.0)
    } else {
        interval
    }
}
