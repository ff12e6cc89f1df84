//! Data models for the carton packing calculation.
//!
//! This module defines the value objects flowing through the engine:
//! - `DimensionTriple`: validated item/container extent
//! - `Orientation`, `Layout`, `Variant`: candidate packings of one level
//! - `PackingResult`, `PalletAggregate`, `PackingReport`: computed results
//! - `PackOutcome`: explicit "not run / no fit / computed" state
//!
//! Everything here is immutable once built and owned by a single request.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::Dims;

/// Validation error for request data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

fn is_positive_finite(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

/// Validates a single dimension component.
pub fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if !is_positive_finite(value) {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive and finite, got: {}",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_weight(value: f64) -> Result<(), ValidationError> {
    if !is_positive_finite(value) {
        return Err(ValidationError::InvalidWeight(format!(
            "Unit weight must be positive and finite, got: {}",
            value
        )));
    }
    Ok(())
}

pub fn validate_price(value: f64) -> Result<(), ValidationError> {
    if !is_positive_finite(value) {
        return Err(ValidationError::InvalidPrice(format!(
            "Unit price must be positive and finite, got: {}",
            value
        )));
    }
    Ok(())
}

/// Validated `(width, depth, height)` of an item or container.
///
/// # Examples
/// ```
/// use carton_planner::model::DimensionTriple;
///
/// assert!(DimensionTriple::new((130.0, 40.0, 194.0), "Item").is_ok());
/// assert!(DimensionTriple::new((130.0, 0.0, 194.0), "Item").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DimensionTriple(Dims);

impl DimensionTriple {
    /// Validates all three components; `subject` prefixes the error text.
    pub fn new(dims: (f64, f64, f64), subject: &str) -> Result<Self, ValidationError> {
        validate_dimension(dims.0, &format!("{} width", subject))?;
        validate_dimension(dims.1, &format!("{} depth", subject))?;
        validate_dimension(dims.2, &format!("{} height", subject))?;
        Ok(Self(Dims::from_tuple(dims)))
    }

    #[inline]
    pub fn dims(&self) -> Dims {
        self.0
    }
}

/// One axis-aligned rotation of an item.
///
/// `permutation[i]` is the source axis placed along axis `i` of the container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    pub dims: Dims,
    pub permutation: [usize; 3],
}

impl Orientation {
    /// The item as given, without rotation.
    pub fn identity(dims: Dims) -> Self {
        Self {
            dims,
            permutation: [0, 1, 2],
        }
    }

    pub fn is_rotated(&self) -> bool {
        self.permutation != [0, 1, 2]
    }
}

/// Per-axis repetition counts of one orientation inside a container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub orientation: Orientation,
    pub counts: (u64, u64, u64),
    pub total_units: u64,
}

impl Layout {
    /// A layout with any zero count does not fit and must never become a variant.
    pub fn is_feasible(&self) -> bool {
        self.counts.0 > 0 && self.counts.1 > 0 && self.counts.2 > 0
    }

    /// Occupied extent of the layout inside the container.
    pub fn footprint(&self) -> Dims {
        self.orientation.dims.scaled(self.counts)
    }
}

/// Labeled candidate layout produced by the enumerator.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    /// 1-based position in generation order.
    pub id: usize,
    pub label: String,
    pub layout: Layout,
    pub total_units: u64,
    /// Container price divided by `total_units`, when a price is known.
    pub unit_price: Option<f64>,
    /// 1-based position after a stable sort by `total_units` descending.
    pub rank: usize,
}

/// Which packing level a result or failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PackingLevel {
    /// Items inside the container.
    Container,
    /// Containers inside the outer container.
    Outer,
}

impl PackingLevel {
    pub fn code(&self) -> &'static str {
        match self {
            PackingLevel::Container => "container",
            PackingLevel::Outer => "outer",
        }
    }
}

impl std::fmt::Display for PackingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingLevel::Container => {
                write!(f, "Item does not fit the container in any orientation")
            }
            PackingLevel::Outer => write!(
                f,
                "Container does not fit the outer container in any evaluated orientation"
            ),
        }
    }
}

/// Result of packing one level.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingResult {
    pub container: Dims,
    /// All enumerated variants in generation order.
    pub variants: Vec<Variant>,
    pub best_variant: Option<Variant>,
    /// Units of the best variant, `0` when infeasible.
    pub total_units: u64,
    /// Container minus occupied footprint of the best variant, per axis.
    pub leftover_space: Option<Dims>,
    pub feasible: bool,
}

impl PackingResult {
    /// Share of the container volume occupied by the best variant, in percent.
    pub fn utilization_percent(&self) -> f64 {
        let total = self.container.volume();
        match &self.best_variant {
            Some(best) if total > 0.0 => best.layout.footprint().volume() / total * 100.0,
            _ => 0.0,
        }
    }

    pub fn infeasible(container: Dims) -> Self {
        Self {
            container,
            variants: Vec::new(),
            best_variant: None,
            total_units: 0,
            leftover_space: None,
            feasible: false,
        }
    }
}

/// Composition of the container level with the outer level.
#[derive(Clone, Debug, PartialEq)]
pub struct PalletAggregate {
    pub outer: PackingResult,
    pub units_per_container: u64,
    /// Containers per layer of the outer container (`countX * countY`).
    pub per_layer: u64,
    /// Stacked layers (`countZ`).
    pub layers: u64,
    pub containers_per_outer: u64,
    /// `units_per_container * containers_per_outer`.
    pub total_base_units: u64,
    pub total_weight: Option<f64>,
    pub total_price: Option<f64>,
}

/// Everything a successful request produced.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingReport {
    pub exhaustive: bool,
    pub inner: PackingResult,
    pub aggregate: Option<PalletAggregate>,
    /// Weight of one filled container, already converted to the report unit.
    pub container_weight: Option<f64>,
    pub container_price: Option<f64>,
}

impl PackingReport {
    /// Winning inner variant. Present by construction for a computed report.
    pub fn best_variant(&self) -> Option<&Variant> {
        self.inner.best_variant.as_ref()
    }

    pub fn units_per_container(&self) -> u64 {
        self.inner.total_units
    }

    /// Total base units of the request: per outer container when one was
    /// given, otherwise per container.
    pub fn total_units(&self) -> u64 {
        self.aggregate
            .as_ref()
            .map(|agg| agg.total_base_units)
            .unwrap_or(self.inner.total_units)
    }

    pub fn total_weight(&self) -> Option<f64> {
        match &self.aggregate {
            Some(agg) => agg.total_weight,
            None => self.container_weight,
        }
    }

    pub fn total_price(&self) -> Option<f64> {
        match &self.aggregate {
            Some(agg) => agg.total_price,
            None => self.container_price,
        }
    }

    /// Variants shown to consumers: the full catalog in exhaustive mode,
    /// only the winner otherwise.
    pub fn listed_variants(&self) -> &[Variant] {
        if self.exhaustive {
            &self.inner.variants
        } else {
            self.inner
                .best_variant
                .as_ref()
                .map(std::slice::from_ref)
                .unwrap_or(&[])
        }
    }
}

/// State of a packing calculation as seen by consumers.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PackOutcome {
    /// No calculation has been run yet.
    #[default]
    NotComputed,
    Infeasible(PackingLevel),
    Computed(Box<PackingReport>),
}

impl PackOutcome {
    pub fn is_feasible(&self) -> bool {
        matches!(self, PackOutcome::Computed(_))
    }

    pub fn report(&self) -> Option<&PackingReport> {
        match self {
            PackOutcome::Computed(report) => Some(report),
            _ => None,
        }
    }
}
