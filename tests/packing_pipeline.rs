use carton_planner::geometry::{grid_fit, orientations};
use carton_planner::model::{Orientation, PackOutcome, PackingLevel};
use carton_planner::optimizer::{
    EnumerationMode, PackingConfig, PackingRequest, enumerate_variants, plan_packing,
    select_best,
};
use carton_planner::types::Dims;

const ITEM: (f64, f64, f64) = (130.0, 40.0, 194.0);
const CARTON: (f64, f64, f64) = (600.0, 400.0, 300.0);
const PALLET: (f64, f64, f64) = (1200.0, 800.0, 1800.0);

#[test]
fn grid_fit_matches_integer_floor_division() {
    let config = PackingConfig::default();
    for item in [(7, 11, 13), (1, 1, 1), (50, 20, 35), (99, 98, 97)] {
        for container in [(100, 100, 100), (250, 120, 80), (99, 98, 97)] {
            let layout = grid_fit(
                &Orientation::identity(Dims::new(item.0 as f64, item.1 as f64, item.2 as f64)),
                &Dims::new(
                    container.0 as f64,
                    container.1 as f64,
                    container.2 as f64,
                ),
                &config,
            )
            .unwrap();
            let expected = (container.0 / item.0) * (container.1 / item.1) * (container.2 / item.2);
            assert_eq!(layout.total_units, expected as u64, "{item:?} in {container:?}");
        }
    }
}

#[test]
fn every_distinct_orientation_is_evaluated() {
    let variants = enumerate_variants(
        &Dims::from_tuple(ITEM),
        &Dims::from_tuple(CARTON),
        EnumerationMode::OrientationSearch,
        None,
        &PackingConfig::default(),
    )
    .unwrap();
    assert_eq!(variants.len(), orientations(&Dims::from_tuple(ITEM)).len());
    let best = select_best(&variants).unwrap();
    assert_eq!(best.total_units, 63);
}

#[test]
fn infeasible_item_yields_no_variants() {
    for mode in [EnumerationMode::Exhaustive, EnumerationMode::OrientationSearch] {
        let variants = enumerate_variants(
            &Dims::new(700.0, 500.0, 400.0),
            &Dims::from_tuple(CARTON),
            mode,
            None,
            &PackingConfig::default(),
        )
        .unwrap();
        assert!(variants.is_empty());
        assert!(select_best(&variants).is_none());
    }
}

#[test]
fn pallet_total_is_product_of_both_levels() {
    let config = PackingConfig::default();
    for mode in [EnumerationMode::Exhaustive, EnumerationMode::OrientationSearch] {
        for rotate in [false, true] {
            let request = PackingRequest::new(ITEM, CARTON)
                .unwrap()
                .with_mode(mode)
                .with_outer(PALLET)
                .unwrap()
                .with_rotate_container(rotate);
            let outcome = plan_packing(&request, &config).unwrap();
            let report = outcome.report().expect("feasible");
            let aggregate = report.aggregate.as_ref().expect("two levels");
            assert_eq!(
                aggregate.total_base_units,
                report.units_per_container() * aggregate.containers_per_outer
            );
            assert_eq!(
                aggregate.containers_per_outer,
                aggregate.per_layer * aggregate.layers
            );
        }
    }
}

#[test]
fn carton_too_big_for_pallet_is_reported_per_level() {
    let request = PackingRequest::new(ITEM, CARTON)
        .unwrap()
        .with_outer((550.0, 550.0, 550.0))
        .unwrap();
    let outcome = plan_packing(&request, &PackingConfig::default()).unwrap();
    assert_eq!(outcome, PackOutcome::Infeasible(PackingLevel::Outer));
}
