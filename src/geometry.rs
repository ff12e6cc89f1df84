//! Geometric building blocks of the packing search.
//!
//! - orientation generation: the distinct axis-aligned rotations of a box
//! - grid fit: how many copies of one orientation fit a container per axis
//! - leftover space of a chosen layout

use crate::model::{Layout, Orientation};
use crate::optimizer::{PackingConfig, PackingError};
use crate::types::{AXIS_PERMUTATIONS, Dims};

/// Returns the distinct axis-aligned rotations of `dims`.
///
/// At most six, identity first, in [`AXIS_PERMUTATIONS`] order. Permutations
/// producing a triple already seen are dropped, so a cube yields exactly one
/// orientation and a box with two equal sides yields three.
///
/// # Examples
/// ```
/// use carton_planner::geometry::orientations;
/// use carton_planner::types::Dims;
///
/// assert_eq!(orientations(&Dims::new(10.0, 10.0, 10.0)).len(), 1);
/// assert_eq!(orientations(&Dims::new(10.0, 10.0, 20.0)).len(), 3);
/// assert_eq!(orientations(&Dims::new(10.0, 20.0, 30.0)).len(), 6);
/// ```
pub fn orientations(dims: &Dims) -> Vec<Orientation> {
    let mut result: Vec<Orientation> = Vec::with_capacity(AXIS_PERMUTATIONS.len());
    for permutation in AXIS_PERMUTATIONS {
        let rotated = dims.permuted(permutation);
        if result.iter().any(|existing| existing.dims == rotated) {
            continue;
        }
        result.push(Orientation {
            dims: rotated,
            permutation,
        });
    }
    result
}

/// Number of whole copies of `item_len` along `container_len`.
///
/// `epsilon` absorbs quotients like `2.9999999` that are exact in decimal.
/// Counts above `max_count` are rejected instead of wrapping.
fn floor_count(
    container_len: f64,
    item_len: f64,
    epsilon: f64,
    max_count: u64,
) -> Result<u64, PackingError> {
    let quotient = container_len / item_len;
    if !quotient.is_finite() {
        return Err(PackingError::ArithmeticOverflow {
            what: "per-axis count",
            limit: max_count,
        });
    }
    let count = (quotient + epsilon).floor();
    if count > max_count as f64 {
        return Err(PackingError::ArithmeticOverflow {
            what: "per-axis count",
            limit: max_count,
        });
    }
    Ok(count.max(0.0) as u64)
}

/// Multiplies three counts, failing instead of wrapping.
pub(crate) fn checked_product(counts: (u64, u64, u64)) -> Result<u64, PackingError> {
    counts
        .0
        .checked_mul(counts.1)
        .and_then(|xy| xy.checked_mul(counts.2))
        .ok_or(PackingError::ArithmeticOverflow {
            what: "total unit count",
            limit: u64::MAX,
        })
}

/// Maximal grid layout of one orientation inside `container`.
///
/// `countX = floor(W / w)`, `countY = floor(D / d)`, `countZ = floor(H / h)`.
/// A layout with any zero count has `total_units == 0` and does not fit; the
/// caller discards it. Dimensions are assumed validated upstream.
pub fn grid_fit(
    orientation: &Orientation,
    container: &Dims,
    config: &PackingConfig,
) -> Result<Layout, PackingError> {
    let item = orientation.dims;
    let counts = (
        floor_count(container.w, item.w, config.fit_epsilon, config.max_axis_count)?,
        floor_count(container.d, item.d, config.fit_epsilon, config.max_axis_count)?,
        floor_count(container.h, item.h, config.fit_epsilon, config.max_axis_count)?,
    );
    let total_units = checked_product(counts)?;
    Ok(Layout {
        orientation: *orientation,
        counts,
        total_units,
    })
}

/// Container extent not covered by `layout`, per axis, never negative.
pub fn leftover_space(layout: &Layout, container: &Dims) -> Dims {
    (*container - layout.footprint()).clamp_non_negative()
}
