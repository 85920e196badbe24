use glam::DVec3;
use crate::error::{Error, Result};

/// Cuboid simulation box with per-axis periodic wrap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    min: DVec3,
    max: DVec3,
    periodic: [bool; 3],
}

impl Domain {
    /// Creates a domain for neighbour searches of `search_radius`.
    ///
    /// Every periodic axis must be at least twice the search radius long,
    /// otherwise the minimum image of a neighbour is ambiguous.
    pub fn new(min: DVec3, max: DVec3, periodic: [bool; 3], search_radius: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::Configuration(format!(
                "domain bounds must be finite, got {min} .. {max}"
            )));
        }
        if !(search_radius > 0.0) || !search_radius.is_finite() {
            return Err(Error::Configuration(format!(
                "search radius must be positive, got {search_radius}"
            )));
        }
        for axis in 0..3 {
            if min[axis] >= max[axis] {
                return Err(Error::Configuration(format!(
                    "domain min must be below max on axis {axis}: {} >= {}",
                    min[axis], max[axis]
                )));
            }
            let extent = max[axis] - min[axis];
            if periodic[axis] && extent < 2.0 * search_radius {
                return Err(Error::Configuration(format!(
                    "periodic axis {axis} has extent {extent}, needs at least twice the search radius {search_radius}"
                )));
            }
        }
        Ok(Self { min, max, periodic })
    }

    pub fn min(&self) -> DVec3 {
        self.min
    }

    pub fn max(&self) -> DVec3 {
        self.max
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    /// Maps `point` into `[min, max)` on periodic axes. Non-periodic axes are
    /// left alone, even when outside the box.
    pub fn wrap(&self, point: DVec3) -> DVec3 {
        let mut wrapped = point;
        for axis in 0..3 {
            if !self.periodic[axis] {
                continue;
            }
            let extent = self.max[axis] - self.min[axis];
            let mut x = self.min[axis] + (point[axis] - self.min[axis]).rem_euclid(extent);
            // rem_euclid can round up to exactly `extent` for tiny negative offsets
            if x >= self.max[axis] {
                x = self.min[axis];
            }
            wrapped[axis] = x;
        }
        wrapped
    }

    /// Vector from `p` to `q`, using the minimum image on periodic axes.
    pub fn displacement(&self, p: DVec3, q: DVec3) -> DVec3 {
        let mut dx = q - p;
        for axis in 0..3 {
            if self.periodic[axis] {
                let extent = self.max[axis] - self.min[axis];
                dx[axis] -= extent * (dx[axis] / extent).round();
            }
        }
        dx
    }
}
