//! Optimierungslogik für die Kartonierung.
//!
//! Dieses Modul berechnet, wie viele Artikel in einen Karton und wie viele
//! Kartons in einen Außenbehälter (z. B. eine Palette) passen:
//! - Variantenaufzählung (erschöpfend oder über alle Orientierungen)
//! - Auswahl der besten Variante mit stabilem Tie-Break
//! - Zusammensetzen beider Ebenen zu Gesamtmenge, Gewicht und Preis
//!
//! Alle Funktionen sind rein: gleiche Eingaben liefern identische Ergebnisse.

use std::cmp::Reverse;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use crate::geometry::{checked_product, grid_fit, leftover_space, orientations};
use crate::model::{
    DimensionTriple, Layout, Orientation, PackOutcome, PackingLevel, PackingReport, PackingResult,
    PalletAggregate, ValidationError, Variant, validate_price, validate_weight,
};
use crate::types::{Dims, EPSILON_FIT};

/// Fehler, die eine Berechnung abbrechen.
///
/// "Passt nicht" ist kein Fehler, sondern [`PackOutcome::Infeasible`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{what} exceeds the supported bound of {limit}")]
    ArithmeticOverflow { what: &'static str, limit: u64 },
}

/// Aufzählungsstrategie für die Karton-Ebene.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationMode {
    /// Alle Teilmengen `x × y × z` der unrotierten Ausrichtung.
    Exhaustive,
    /// Maximales Raster für jede unterschiedliche Orientierung.
    #[default]
    #[serde(alias = "orientationSearch")]
    OrientationSearch,
}

impl EnumerationMode {
    pub fn code(&self) -> &'static str {
        match self {
            EnumerationMode::Exhaustive => "exhaustive",
            EnumerationMode::OrientationSearch => "orientation_search",
        }
    }
}

impl FromStr for EnumerationMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exhaustive" => Ok(EnumerationMode::Exhaustive),
            "orientation_search" | "orientation-search" | "orientationsearch" => {
                Ok(EnumerationMode::OrientationSearch)
            }
            other => Err(format!("unknown enumeration mode '{}'", other)),
        }
    }
}

/// Konfiguration für die Packberechnung.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Modus, wenn die Anfrage keinen angibt
    pub default_mode: EnumerationMode,
    /// Obergrenze für die Anzahl erschöpfend aufgezählter Varianten
    pub max_variants: u64,
    /// Obergrenze für die Stückzahl pro Achse
    pub max_axis_count: u64,
    /// Toleranz vor dem Abrunden von `W / w`
    pub fit_epsilon: f64,
    /// Umrechnung Artikelgewicht → Berichtsgewicht (g → kg = 1000)
    pub weight_divisor: f64,
    /// Ob Kartons im Außenbehälter standardmäßig gedreht werden dürfen
    pub rotate_container: bool,
}

impl PackingConfig {
    pub const DEFAULT_MODE: EnumerationMode = EnumerationMode::OrientationSearch;
    pub const DEFAULT_MAX_VARIANTS: u64 = 100_000;
    pub const DEFAULT_MAX_AXIS_COUNT: u64 = 1_000_000;
    pub const DEFAULT_FIT_EPSILON: f64 = EPSILON_FIT;
    pub const DEFAULT_WEIGHT_DIVISOR: f64 = 1000.0;
    pub const DEFAULT_ROTATE_CONTAINER: bool = false;

    /// Erstellt einen Builder für benutzerdefinierte Konfiguration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            default_mode: Self::DEFAULT_MODE,
            max_variants: Self::DEFAULT_MAX_VARIANTS,
            max_axis_count: Self::DEFAULT_MAX_AXIS_COUNT,
            fit_epsilon: Self::DEFAULT_FIT_EPSILON,
            weight_divisor: Self::DEFAULT_WEIGHT_DIVISOR,
            rotate_container: Self::DEFAULT_ROTATE_CONTAINER,
        }
    }
}

/// Builder-Pattern für PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn default_mode(mut self, mode: EnumerationMode) -> Self {
        self.config.default_mode = mode;
        self
    }

    pub fn max_variants(mut self, limit: u64) -> Self {
        self.config.max_variants = limit;
        self
    }

    pub fn max_axis_count(mut self, limit: u64) -> Self {
        self.config.max_axis_count = limit;
        self
    }

    pub fn fit_epsilon(mut self, epsilon: f64) -> Self {
        self.config.fit_epsilon = epsilon;
        self
    }

    pub fn weight_divisor(mut self, divisor: f64) -> Self {
        self.config.weight_divisor = divisor;
        self
    }

    pub fn rotate_container(mut self, rotate: bool) -> Self {
        self.config.rotate_container = rotate;
        self
    }

    /// Erstellt die finale Konfiguration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Validierte Anfrage für eine komplette Berechnung.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingRequest {
    pub item: DimensionTriple,
    pub container: DimensionTriple,
    pub outer: Option<DimensionTriple>,
    /// Gewicht eines Artikels in der Eingabeeinheit (Gramm)
    pub item_unit_weight: Option<f64>,
    /// Preis eines gefüllten Kartons
    pub container_unit_price: Option<f64>,
    pub mode: EnumerationMode,
    pub rotate_container: bool,
}

impl PackingRequest {
    /// Erstellt eine Anfrage für Artikel und Karton; weitere Felder per `with_*`.
    pub fn new(
        item: (f64, f64, f64),
        container: (f64, f64, f64),
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            item: DimensionTriple::new(item, "Item")?,
            container: DimensionTriple::new(container, "Container")?,
            outer: None,
            item_unit_weight: None,
            container_unit_price: None,
            mode: EnumerationMode::default(),
            rotate_container: PackingConfig::DEFAULT_ROTATE_CONTAINER,
        })
    }

    pub fn with_outer(mut self, outer: (f64, f64, f64)) -> Result<Self, ValidationError> {
        self.outer = Some(DimensionTriple::new(outer, "Outer container")?);
        Ok(self)
    }

    pub fn with_item_unit_weight(mut self, weight: f64) -> Result<Self, ValidationError> {
        validate_weight(weight)?;
        self.item_unit_weight = Some(weight);
        Ok(self)
    }

    pub fn with_container_unit_price(mut self, price: f64) -> Result<Self, ValidationError> {
        validate_price(price)?;
        self.container_unit_price = Some(price);
        Ok(self)
    }

    pub fn with_mode(mut self, mode: EnumerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_rotate_container(mut self, rotate: bool) -> Self {
        self.rotate_container = rotate;
        self
    }
}

/// Ereignisse während der Berechnung, für Live-Anzeige per SSE.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// Eine Kandidatenvariante wurde berechnet.
    VariantEvaluated {
        level: PackingLevel,
        id: usize,
        label: String,
        counts: (u64, u64, u64),
        orientation: (f64, f64, f64),
        total_units: u64,
    },
    /// Eine Ebene ist entschieden.
    LevelResolved {
        level: PackingLevel,
        feasible: bool,
        total_units: u64,
        best_variant: Option<usize>,
    },
    /// Berechnung fehlgeschlagen (z. B. Grenzwert überschritten).
    Failed { details: String },
    /// Berechnung abgeschlossen.
    Finished {
        feasible: bool,
        total_units: Option<u64>,
    },
}

fn make_variant(id: usize, layout: Layout, unit_price_base: Option<f64>) -> Variant {
    let total_units = layout.total_units;
    Variant {
        id,
        label: format!("V{}", id),
        layout,
        total_units,
        unit_price: unit_price_base.map(|price| price / total_units as f64),
        rank: id,
    }
}

fn emit_variant(level: PackingLevel, variant: &Variant, on_event: &mut impl FnMut(&PackEvent)) {
    on_event(&PackEvent::VariantEvaluated {
        level,
        id: variant.id,
        label: variant.label.clone(),
        counts: variant.layout.counts,
        orientation: variant.layout.orientation.dims.as_tuple(),
        total_units: variant.total_units,
    });
}

/// Erschöpfende Aufzählung aller Teilraster `1..=nx × 1..=ny × 1..=nz`.
///
/// Reihenfolge: `x` außen, dann `y`, `z` innen. Die IDs folgen dieser
/// Reihenfolge und sind Teil der Ausgabe.
fn enumerate_exhaustive(
    item: &Dims,
    container: &Dims,
    container_price: Option<f64>,
    level: PackingLevel,
    config: &PackingConfig,
    on_event: &mut impl FnMut(&PackEvent),
) -> Result<Vec<Variant>, PackingError> {
    let orientation = Orientation::identity(*item);
    let maximal = grid_fit(&orientation, container, config)?;
    if !maximal.is_feasible() {
        return Ok(Vec::new());
    }

    let variant_count = checked_product(maximal.counts)?;
    if variant_count > config.max_variants {
        return Err(PackingError::ArithmeticOverflow {
            what: "variant count",
            limit: config.max_variants,
        });
    }

    let (nx, ny, nz) = maximal.counts;
    let mut variants = Vec::with_capacity(variant_count as usize);
    for x in 1..=nx {
        for y in 1..=ny {
            for z in 1..=nz {
                let layout = Layout {
                    orientation,
                    counts: (x, y, z),
                    total_units: x * y * z,
                };
                let variant = make_variant(variants.len() + 1, layout, container_price);
                emit_variant(level, &variant, on_event);
                variants.push(variant);
            }
        }
    }
    Ok(variants)
}

#[cfg(feature = "parallel")]
fn fit_candidates(
    candidates: &[Orientation],
    container: &Dims,
    config: &PackingConfig,
) -> Result<Vec<Layout>, PackingError> {
    use rayon::prelude::*;
    // collect() erhält die Reihenfolge, der Tie-Break bleibt identisch
    candidates
        .par_iter()
        .map(|orientation| grid_fit(orientation, container, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn fit_candidates(
    candidates: &[Orientation],
    container: &Dims,
    config: &PackingConfig,
) -> Result<Vec<Layout>, PackingError> {
    candidates
        .iter()
        .map(|orientation| grid_fit(orientation, container, config))
        .collect()
}

/// Maximales Raster je Orientierung; nicht passende werden verworfen.
fn enumerate_orientations(
    candidates: &[Orientation],
    container: &Dims,
    container_price: Option<f64>,
    level: PackingLevel,
    config: &PackingConfig,
    on_event: &mut impl FnMut(&PackEvent),
) -> Result<Vec<Variant>, PackingError> {
    let layouts = fit_candidates(candidates, container, config)?;
    let mut variants = Vec::with_capacity(layouts.len());
    for layout in layouts.into_iter().filter(Layout::is_feasible) {
        let variant = make_variant(variants.len() + 1, layout, container_price);
        emit_variant(level, &variant, on_event);
        variants.push(variant);
    }
    Ok(variants)
}

/// Zählt die Varianten eines Artikels im Karton gemäß `mode` auf.
///
/// Eine leere Liste bedeutet: passt in keiner Ausrichtung.
///
/// # Parameter
/// * `item` - Artikelmaße (unrotiert)
/// * `container` - Kartonmaße
/// * `mode` - Aufzählungsstrategie
/// * `container_price` - Kartonpreis für den Stückpreis je Variante
/// * `config` - Grenzwerte und Toleranzen
pub fn enumerate_variants(
    item: &Dims,
    container: &Dims,
    mode: EnumerationMode,
    container_price: Option<f64>,
    config: &PackingConfig,
) -> Result<Vec<Variant>, PackingError> {
    let mut variants = enumerate_for_level(
        item,
        container,
        mode,
        container_price,
        PackingLevel::Container,
        config,
        &mut |_: &PackEvent| {},
    )?;
    rank_variants(&mut variants);
    Ok(variants)
}

fn enumerate_for_level(
    item: &Dims,
    container: &Dims,
    mode: EnumerationMode,
    container_price: Option<f64>,
    level: PackingLevel,
    config: &PackingConfig,
    on_event: &mut impl FnMut(&PackEvent),
) -> Result<Vec<Variant>, PackingError> {
    match mode {
        EnumerationMode::Exhaustive => {
            enumerate_exhaustive(item, container, container_price, level, config, on_event)
        }
        EnumerationMode::OrientationSearch => enumerate_orientations(
            &orientations(item),
            container,
            container_price,
            level,
            config,
            on_event,
        ),
    }
}

/// Vergibt Ränge nach `total_units` absteigend; Gleichstände behalten die
/// Erzeugungsreihenfolge (stabile Sortierung).
pub fn rank_variants(variants: &mut [Variant]) {
    let mut order: Vec<usize> = (0..variants.len()).collect();
    order.sort_by_key(|&idx| Reverse(variants[idx].total_units));
    for (position, idx) in order.into_iter().enumerate() {
        variants[idx].rank = position + 1;
    }
}

/// Wählt die Variante mit den meisten Einheiten.
///
/// Bei Gleichstand gewinnt die erste in Aufzählungsreihenfolge. `None`
/// bedeutet: keine Variante, also nicht packbar.
pub fn select_best(variants: &[Variant]) -> Option<&Variant> {
    variants.iter().fold(None, |best: Option<&Variant>, candidate| match best {
        Some(current) if current.total_units >= candidate.total_units => Some(current),
        _ => Some(candidate),
    })
}

fn resolve_level(
    container: Dims,
    mut variants: Vec<Variant>,
    level: PackingLevel,
    on_event: &mut impl FnMut(&PackEvent),
) -> PackingResult {
    rank_variants(&mut variants);
    let result = match select_best(&variants).cloned() {
        Some(best) => PackingResult {
            container,
            leftover_space: Some(leftover_space(&best.layout, &container)),
            total_units: best.total_units,
            best_variant: Some(best),
            variants,
            feasible: true,
        },
        None => PackingResult::infeasible(container),
    };

    debug!(
        level = level.code(),
        feasible = result.feasible,
        total_units = result.total_units,
        candidates = result.variants.len(),
        "packing level resolved"
    );
    on_event(&PackEvent::LevelResolved {
        level,
        feasible: result.feasible,
        total_units: result.total_units,
        best_variant: result.best_variant.as_ref().map(|v| v.id),
    });
    result
}

/// Packt eine Ebene und wählt die beste Variante.
pub fn pack_level(
    item: &Dims,
    container: &Dims,
    mode: EnumerationMode,
    container_price: Option<f64>,
    config: &PackingConfig,
) -> Result<PackingResult, PackingError> {
    let mut ignore = |_: &PackEvent| {};
    let variants = enumerate_for_level(
        item,
        container,
        mode,
        container_price,
        PackingLevel::Container,
        config,
        &mut ignore,
    )?;
    Ok(resolve_level(
        *container,
        variants,
        PackingLevel::Container,
        &mut ignore,
    ))
}

/// Packt Kartons in den Außenbehälter.
///
/// Ohne `rotate` wird nur die gegebene Ausrichtung des Kartons bewertet,
/// sonst alle unterschiedlichen Orientierungen.
pub fn pack_outer_level(
    container: &Dims,
    outer: &Dims,
    rotate: bool,
    config: &PackingConfig,
) -> Result<PackingResult, PackingError> {
    pack_outer_with_events(container, outer, rotate, config, &mut |_: &PackEvent| {})
}

fn pack_outer_with_events(
    container: &Dims,
    outer: &Dims,
    rotate: bool,
    config: &PackingConfig,
    on_event: &mut impl FnMut(&PackEvent),
) -> Result<PackingResult, PackingError> {
    let candidates = if rotate {
        orientations(container)
    } else {
        vec![Orientation::identity(*container)]
    };
    let variants = enumerate_orientations(
        &candidates,
        outer,
        None,
        PackingLevel::Outer,
        config,
        on_event,
    )?;
    Ok(resolve_level(*outer, variants, PackingLevel::Outer, on_event))
}

/// Setzt Karton- und Außenebene zusammen.
///
/// Liefert `None`, sobald eine Ebene nicht packbar ist. Gewicht und Preis
/// werden pro Karton übergeben; die Einheitenumrechnung ist dort bereits
/// erfolgt und wird hier nicht wiederholt.
pub fn compose_levels(
    inner: &PackingResult,
    outer: &PackingResult,
    container_weight: Option<f64>,
    container_price: Option<f64>,
) -> Result<Option<PalletAggregate>, PackingError> {
    if !inner.feasible {
        return Ok(None);
    }
    let Some(best_outer) = outer.best_variant.as_ref().filter(|_| outer.feasible) else {
        return Ok(None);
    };

    let (cx, cy, cz) = best_outer.layout.counts;
    let per_layer = cx.checked_mul(cy).ok_or(PackingError::ArithmeticOverflow {
        what: "containers per layer",
        limit: u64::MAX,
    })?;
    let containers_per_outer = best_outer.total_units;
    let total_base_units = inner
        .total_units
        .checked_mul(containers_per_outer)
        .ok_or(PackingError::ArithmeticOverflow {
            what: "total base units",
            limit: u64::MAX,
        })?;

    Ok(Some(PalletAggregate {
        outer: outer.clone(),
        units_per_container: inner.total_units,
        per_layer,
        layers: cz,
        containers_per_outer,
        total_base_units,
        total_weight: container_weight.map(|w| w * containers_per_outer as f64),
        total_price: container_price.map(|p| p * containers_per_outer as f64),
    }))
}

/// Hauptfunktion: komplette Berechnung für eine Anfrage.
///
/// # Rückgabewert
/// `PackOutcome::Computed` mit Bericht, `PackOutcome::Infeasible` mit der
/// Ebene, die nicht passt, oder ein `PackingError` bei Grenzüberschreitung.
///
/// # Beispiel
/// ```
/// use carton_planner::optimizer::{PackingConfig, PackingRequest, plan_packing};
///
/// let request = PackingRequest::new((130.0, 40.0, 194.0), (600.0, 400.0, 300.0)).unwrap();
/// let outcome = plan_packing(&request, &PackingConfig::default()).unwrap();
/// assert_eq!(outcome.report().unwrap().units_per_container(), 63);
/// ```
pub fn plan_packing(
    request: &PackingRequest,
    config: &PackingConfig,
) -> Result<PackOutcome, PackingError> {
    plan_packing_with_progress(request, config, |_: &PackEvent| {})
}

/// Wie `plan_packing`, aber mit Live-Progress Callback.
pub fn plan_packing_with_progress(
    request: &PackingRequest,
    config: &PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackOutcome, PackingError> {
    let item = request.item.dims();
    let container = request.container.dims();

    let variants = enumerate_for_level(
        &item,
        &container,
        request.mode,
        request.container_unit_price,
        PackingLevel::Container,
        config,
        &mut on_event,
    )?;
    let inner = resolve_level(container, variants, PackingLevel::Container, &mut on_event);
    if !inner.feasible {
        on_event(&PackEvent::Finished {
            feasible: false,
            total_units: None,
        });
        return Ok(PackOutcome::Infeasible(PackingLevel::Container));
    }

    // Umrechnung g → kg genau einmal, hier beim Kartongewicht
    let container_weight = request
        .item_unit_weight
        .map(|weight| inner.total_units as f64 * weight / config.weight_divisor);

    let aggregate = match request.outer {
        None => None,
        Some(outer) => {
            let outer_result = pack_outer_with_events(
                &container,
                &outer.dims(),
                request.rotate_container,
                config,
                &mut on_event,
            )?;
            match compose_levels(
                &inner,
                &outer_result,
                container_weight,
                request.container_unit_price,
            )? {
                Some(aggregate) => Some(aggregate),
                None => {
                    on_event(&PackEvent::Finished {
                        feasible: false,
                        total_units: None,
                    });
                    return Ok(PackOutcome::Infeasible(PackingLevel::Outer));
                }
            }
        }
    };

    let report = PackingReport {
        exhaustive: request.mode == EnumerationMode::Exhaustive,
        inner,
        aggregate,
        container_weight,
        container_price: request.container_unit_price,
    };
    on_event(&PackEvent::Finished {
        feasible: true,
        total_units: Some(report.total_units()),
    });
    Ok(PackOutcome::Computed(Box::new(report)))
}
