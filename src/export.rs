//! Flat row sets for spreadsheet and document exporters.
//!
//! The exporters themselves live outside this crate; they receive the variant
//! table, the parameter/value summary and a suggested file name prefix.

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::{PackOutcome, PackingLevel, PackingReport, Variant};

const DEFAULT_PRODUCT_NAME: &str = "product";
const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("Run the packing calculation before exporting")]
    NotComputed,
    #[error("Nothing to export: {0}")]
    Infeasible(PackingLevel),
}

/// One row of the variant sheet.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct VariantRow {
    pub id: usize,
    pub label: String,
    pub rank: usize,
    pub x: u64,
    pub y: u64,
    pub z: u64,
    #[schema(value_type = [f64; 3], example = json!([194.0, 130.0, 40.0]))]
    pub orientation: (f64, f64, f64),
    pub total_units: u64,
    pub unit_price: Option<f64>,
}

impl From<&Variant> for VariantRow {
    fn from(variant: &Variant) -> Self {
        let (x, y, z) = variant.layout.counts;
        Self {
            id: variant.id,
            label: variant.label.clone(),
            rank: variant.rank,
            x,
            y,
            z,
            orientation: variant.layout.orientation.dims.as_tuple(),
            total_units: variant.total_units,
            unit_price: variant.unit_price,
        }
    }
}

/// One parameter/value line of the summary sheet.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct SummaryRow {
    pub parameter: String,
    pub value: String,
}

impl SummaryRow {
    fn new(parameter: &str, value: impl Into<String>) -> Self {
        Self {
            parameter: parameter.to_string(),
            value: value.into(),
        }
    }
}

/// Everything an exporter needs, in display order.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ExportTable {
    pub file_prefix: String,
    pub variant_rows: Vec<VariantRow>,
    pub summary_rows: Vec<SummaryRow>,
}

impl ExportTable {
    /// Builds the export rows for a computed outcome.
    ///
    /// # Errors
    /// `NotComputed` before any calculation ran, `Infeasible` when nothing fits.
    pub fn from_outcome(outcome: &PackOutcome, product_name: &str) -> Result<Self, ExportError> {
        match outcome {
            PackOutcome::NotComputed => Err(ExportError::NotComputed),
            PackOutcome::Infeasible(level) => Err(ExportError::Infeasible(*level)),
            PackOutcome::Computed(report) => Ok(Self::from_report(report, product_name)),
        }
    }

    fn from_report(report: &PackingReport, product_name: &str) -> Self {
        let product = if product_name.trim().is_empty() {
            DEFAULT_PRODUCT_NAME
        } else {
            product_name.trim()
        };
        let best_label = report
            .best_variant()
            .map(|v| v.label.as_str())
            .unwrap_or(NOT_AVAILABLE);

        let aggregate = report.aggregate.as_ref();
        let summary_rows = vec![
            SummaryRow::new("Product", product),
            SummaryRow::new("Best variant", best_label),
            SummaryRow::new(
                "Units per container",
                report.units_per_container().to_string(),
            ),
            SummaryRow::new("Price per container", money(report.container_price)),
            SummaryRow::new(
                "Units per outer container",
                aggregate
                    .map(|agg| agg.total_base_units.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            SummaryRow::new(
                "Outer container weight (kg)",
                money(aggregate.and_then(|agg| agg.total_weight)),
            ),
            SummaryRow::new(
                "Outer container value",
                money(aggregate.and_then(|agg| agg.total_price)),
            ),
        ];

        Self {
            file_prefix: file_prefix(product, best_label, report.units_per_container()),
            variant_rows: report.listed_variants().iter().map(VariantRow::from).collect(),
            summary_rows,
        }
    }
}

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Suggested export file name without extension.
///
/// Spaces in the product name become `_`, slashes become `-`.
pub fn file_prefix(product_name: &str, variant_label: &str, units: u64) -> String {
    let clean = product_name.replace(' ', "_").replace('/', "-");
    format!("packing_{}_{}_units{}", clean, variant_label, units)
}
