//! Common value types for box dimensions.
//!
//! `Dims` is the raw `(width, depth, height)` triple shared by items,
//! containers and outer containers. Validation lives in `model`; this module
//! only carries the arithmetic.

use std::ops::Sub;

/// Default tolerance added to a quotient before flooring it into a count.
///
/// Keeps `0.3 / 0.1` from landing on `2.999…` and losing a whole row.
pub const EPSILON_FIT: f64 = 1e-9;

/// The six axis permutations, identity first.
///
/// Entry `[a, b, c]` means the rotated triple is `(src[a], src[b], src[c])`.
/// The order is the enumeration order of the orientation search and therefore
/// decides ties.
pub const AXIS_PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// A `(width, depth, height)` triple.
///
/// # Examples
/// ```
/// use carton_planner::types::Dims;
///
/// let carton = Dims::new(600.0, 400.0, 300.0);
/// assert_eq!(carton.volume(), 72_000_000.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dims {
    pub w: f64,
    pub d: f64,
    pub h: f64,
}

impl Dims {
    #[inline]
    pub const fn new(w: f64, d: f64, h: f64) -> Self {
        Self { w, d, h }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.w, self.d, self.h)
    }

    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    #[inline]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.w, self.d, self.h]
    }

    /// Rearranges the components according to one of [`AXIS_PERMUTATIONS`].
    #[inline]
    pub fn permuted(&self, permutation: [usize; 3]) -> Self {
        let src = self.as_array();
        Self::new(src[permutation[0]], src[permutation[1]], src[permutation[2]])
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.w * self.d * self.h
    }

    /// Component-wise product with integer repetition counts.
    #[inline]
    pub fn scaled(&self, counts: (u64, u64, u64)) -> Self {
        Self::new(
            self.w * counts.0 as f64,
            self.d * counts.1 as f64,
            self.h * counts.2 as f64,
        )
    }

    /// Clamps every component to be at least zero.
    #[inline]
    pub fn clamp_non_negative(&self) -> Self {
        Self::new(self.w.max(0.0), self.d.max(0.0), self.h.max(0.0))
    }
}

impl Sub for Dims {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.w - rhs.w, self.d - rhs.d, self.h - rhs.h)
    }
}
