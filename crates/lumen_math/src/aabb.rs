use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box, one interval per axis.
///
/// The box primitive's local shape, and the rejection volume of the tangle
/// cube.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Box centred on `center` with the given (positive) half extents.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let lo = center - half_extents;
        let hi = center + half_extents;
        Self {
            x: Interval::new(lo.x, hi.x),
            y: Interval::new(lo.y, hi.y),
            z: Interval::new(lo.z, hi.z),
        }
    }

    fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Entry and exit parameters of the ray through the box slabs.
    ///
    /// The entry may be negative when the origin is inside. Returns `None`
    /// when the slabs do not overlap or the box is entirely behind the ray.
    pub fn slab(&self, r: &Ray) -> Option<(f64, f64)> {
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = r.origin[axis];
            let dir = r.direction[axis];

            if dir.abs() < 1e-12 {
                // Parallel to this slab: inside it or never.
                if origin < slab.min || origin > slab.max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (slab.min - origin) * inv;
            let mut t1 = (slab.max - origin) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_exit < t_enter {
                return None;
            }
        }

        if t_exit < 0.0 {
            return None;
        }
        Some((t_enter, t_exit))
    }
}
