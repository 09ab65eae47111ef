use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::*;
use crate::pricing::{
    ExpressSelection, MovingSelection, RateCatalog, ShippingSelection, StandardSelection,
    StorageSelection,
};

fn dec(num: i64, scale: u32) -> Decimal {
    Decimal::new(num, scale)
}

fn price(flow: ServiceFlow, selection: impl Into<ServiceSelection>) -> PriceBreakdown {
    RateCatalog::builtin()
        .calculate(flow, &selection.into())
        .expect("expected a price")
}

fn assert_consistent(breakdown: &PriceBreakdown) {
    assert_eq!(
        breakdown.total,
        breakdown.base + breakdown.adjustments_sum(),
        "total must equal base plus adjustments: {breakdown:?}"
    );
    assert!(breakdown.total >= breakdown.base, "total below base: {breakdown:?}");
    assert!(breakdown.total >= Decimal::ZERO, "negative total: {breakdown:?}");
}

// -----------------------------------------------------------------------
// storage
// -----------------------------------------------------------------------

#[test]
fn storage_medium_unit_medium_term_with_climate() {
    let breakdown = price(
        ServiceFlow::Storage,
        StorageSelection {
            unit_size: Some("medium".to_string()),
            duration: Some("medium".to_string()),
            climate_control: true,
            pickup_service: false,
        },
    );

    assert_eq!(breakdown.base, dec(75, 0));
    assert_eq!(breakdown.adjustments.len(), 2);
    assert_eq!(breakdown.adjustment("climate"), Some(dec(20, 0)));
    assert_eq!(breakdown.adjustment("durationDiscount"), Some(dec(-95, 1)));
    assert_eq!(breakdown.total, dec(855, 1));
    assert_consistent(&breakdown);
}

#[test]
fn storage_short_term_has_no_discount_entry() {
    let breakdown = price(
        ServiceFlow::Storage,
        StorageSelection {
            unit_size: Some("small".to_string()),
            duration: Some("short".to_string()),
            climate_control: false,
            pickup_service: true,
        },
    );
    assert_eq!(breakdown.base, dec(45, 0));
    assert_eq!(breakdown.adjustment("pickup"), Some(dec(35, 0)));
    assert!(breakdown.adjustment("durationDiscount").is_none());
    assert_eq!(breakdown.total, dec(80, 0));
}

#[test]
fn storage_discount_never_cuts_into_base() {
    // 20% of 75 would be 15, but there are no surcharges to absorb it.
    let breakdown = price(
        ServiceFlow::Storage,
        StorageSelection {
            unit_size: Some("medium".to_string()),
            duration: Some("long".to_string()),
            climate_control: false,
            pickup_service: false,
        },
    );
    assert_eq!(breakdown.total, dec(75, 0));
    assert!(breakdown.adjustments.is_empty());
}

#[test]
fn storage_discount_capped_at_surcharges() {
    // 20% of (175 + 20) = 39 exceeds the 20 climate fee.
    let breakdown = price(
        ServiceFlow::Storage,
        StorageSelection {
            unit_size: Some("extra_large".to_string()),
            duration: Some("long".to_string()),
            climate_control: true,
            pickup_service: false,
        },
    );
    assert_eq!(breakdown.adjustment("durationDiscount"), Some(dec(-20, 0)));
    assert_eq!(breakdown.total, dec(175, 0));
    assert_consistent(&breakdown);
}

#[test]
fn storage_null_fields_are_incomplete() {
    let selection: ServiceSelection =
        serde_json::from_str(r#"{"unit_size": null, "duration": "short"}"#).unwrap();
    let err = RateCatalog::builtin()
        .calculate(ServiceFlow::Storage, &selection)
        .unwrap_err();
    assert!(
        matches!(err, CoreError::IncompleteSelection { ref missing, .. } if missing == &["unit_size"]),
        "got: {err:?}"
    );
}

#[test]
fn storage_without_unit_size_is_incomplete() {
    let err = RateCatalog::builtin()
        .calculate(
            ServiceFlow::Storage,
            &StorageSelection {
                duration: Some("long".to_string()),
                ..StorageSelection::default()
            }
            .into(),
        )
        .unwrap_err();
    assert!(
        matches!(err, CoreError::IncompleteSelection { flow: ServiceFlow::Storage, ref missing } if missing == &["unit_size"]),
        "got: {err:?}"
    );
}

// -----------------------------------------------------------------------
// moving
// -----------------------------------------------------------------------

#[test]
fn moving_studio_with_packing_and_assembly() {
    let breakdown = price(
        ServiceFlow::Moving,
        MovingSelection {
            apartment_size: Some("studio".to_string()),
            services: vec!["packing".to_string(), "assembly".to_string()],
            inventory_items: Some(6),
        },
    );

    assert_eq!(breakdown.base, dec(129, 0));
    assert_eq!(breakdown.adjustment("packing"), Some(dec(80, 0)));
    assert_eq!(breakdown.adjustment("assembly"), Some(dec(40, 0)));
    assert_eq!(breakdown.adjustment("complexity"), Some(dec(30, 0)));
    assert_eq!(breakdown.adjustment("services"), None);
    assert_eq!(breakdown.adjustments.len(), 3);
    assert_eq!(breakdown.total, dec(279, 0));
    assert_consistent(&breakdown);
}

#[test]
fn moving_complexity_is_capped() {
    let breakdown = price(
        ServiceFlow::Moving,
        MovingSelection {
            apartment_size: Some("house".to_string()),
            services: vec![],
            inventory_items: Some(40),
        },
    );
    assert_eq!(breakdown.adjustment("complexity"), Some(dec(50, 0)));
    assert_eq!(breakdown.total, dec(549, 0));
}

#[test]
fn moving_without_inventory_has_no_complexity() {
    let breakdown = price(
        ServiceFlow::Moving,
        MovingSelection {
            apartment_size: Some("two_bedroom".to_string()),
            services: vec!["piano".to_string()],
            inventory_items: None,
        },
    );
    assert!(breakdown.adjustment("complexity").is_none());
    assert_eq!(breakdown.total, dec(409, 0));
}

#[test]
fn moving_unknown_service_is_invalid_input() {
    let selection = ServiceSelection::from(MovingSelection {
        apartment_size: Some("studio".to_string()),
        services: vec!["cleaning".to_string()],
        inventory_items: None,
    });
    let err = RateCatalog::builtin()
        .calculate(ServiceFlow::Moving, &selection)
        .unwrap_err();
    assert!(
        matches!(err, CoreError::InvalidInput { ref field, ref reason } if field == "services" && reason.contains("cleaning")),
        "got: {err:?}"
    );
}

// -----------------------------------------------------------------------
// standard delivery
// -----------------------------------------------------------------------

#[test]
fn standard_small_light_parcel_pays_base_only() {
    let breakdown = price(
        ServiceFlow::Standard,
        StandardSelection {
            length_cm: Some(20.0),
            width_cm: Some(20.0),
            height_cm: Some(20.0),
            weight_kg: Some(1.5),
            delivery_window: Some("standard".to_string()),
        },
    );
    assert_eq!(breakdown.base, dec(1299, 2));
    assert!(breakdown.adjustments.is_empty());
    assert_eq!(breakdown.total, dec(1299, 2));
}

#[test]
fn standard_large_heavy_same_day() {
    // 30 x 30 x 30 = 27000 cm3 -> ceil(3.375) - 1 = 3 steps -> 12
    // 5 kg -> (5 - 2) * 1.5 = 4.5
    let breakdown = price(
        ServiceFlow::Standard,
        StandardSelection {
            length_cm: Some(30.0),
            width_cm: Some(30.0),
            height_cm: Some(30.0),
            weight_kg: Some(5.0),
            delivery_window: Some("same_day".to_string()),
        },
    );
    assert_eq!(breakdown.adjustment("size"), Some(dec(12, 0)));
    assert_eq!(breakdown.adjustment("weight"), Some(dec(45, 1)));
    assert_eq!(breakdown.adjustment("deliveryWindow"), Some(dec(12, 0)));
    assert_eq!(breakdown.total, dec(4149, 2));
    assert_consistent(&breakdown);
}

#[test]
fn standard_exactly_one_step_is_free() {
    let selection = ServiceSelection::new()
        .with("volume_cm3", 8000.0)
        .with("weight_kg", 2.0)
        .with("delivery_window", "next_day");
    let breakdown = RateCatalog::builtin()
        .calculate(ServiceFlow::Standard, &selection)
        .unwrap();
    assert!(breakdown.adjustment("size").is_none());
    assert!(breakdown.adjustment("weight").is_none());
    assert_eq!(breakdown.total, dec(1899, 2));
}

#[test]
fn standard_reports_every_missing_field() {
    let selection = ServiceSelection::new().with("weight_kg", 3.0);
    let err = RateCatalog::builtin()
        .calculate(ServiceFlow::Standard, &selection)
        .unwrap_err();
    assert!(
        matches!(err, CoreError::IncompleteSelection { ref missing, .. } if missing == &["volume_cm3", "delivery_window"]),
        "got: {err:?}"
    );
}

#[test]
fn standard_negative_weight_is_invalid_input() {
    let selection = ServiceSelection::new()
        .with("volume_cm3", 1000.0)
        .with("weight_kg", -3.0)
        .with("delivery_window", "standard");
    let err = RateCatalog::builtin()
        .calculate(ServiceFlow::Standard, &selection)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { ref field, .. } if field == "weight_kg"));
}

#[test]
fn standard_huge_parcel_is_invalid_input_not_a_panic() {
    let selection = ServiceSelection::new()
        .with("volume_cm3", 7e28)
        .with("weight_kg", 5.28e28)
        .with("delivery_window", "same_day");
    let err = RateCatalog::builtin()
        .calculate(ServiceFlow::Standard, &selection)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { .. }), "got: {err:?}");
}

// -----------------------------------------------------------------------
// shipping
// -----------------------------------------------------------------------

#[test]
fn shipping_multiplies_factors_and_rounds_to_dollars() {
    // 3.2 * 120 * 1.6 * 1.4 = 860.16
    let breakdown = price(
        ServiceFlow::Shipping,
        ShippingSelection {
            package_type: Some("palette".to_string()),
            weight_bracket: Some("heavy".to_string()),
            shipping_type: Some("express".to_string()),
            distance_km: Some(120.0),
        },
    );
    assert_eq!(breakdown.base, dec(860, 0));
    assert!(breakdown.adjustments.is_empty());
    assert_eq!(breakdown.total, dec(860, 0));
}

#[test]
fn shipping_rounds_half_up() {
    // 0.9 * 25 * 1 * 1 = 22.5
    let breakdown = price(
        ServiceFlow::Shipping,
        ShippingSelection {
            package_type: Some("envelope".to_string()),
            weight_bracket: Some("light".to_string()),
            shipping_type: Some("standard".to_string()),
            distance_km: Some(25.0),
        },
    );
    assert_eq!(breakdown.total, dec(23, 0));
}

#[test]
fn shipping_without_weight_bracket_does_not_default() {
    let err = RateCatalog::builtin()
        .calculate(
            ServiceFlow::Shipping,
            &ShippingSelection {
                package_type: Some("parcel".to_string()),
                shipping_type: Some("standard".to_string()),
                distance_km: Some(10.0),
                ..ShippingSelection::default()
            }
            .into(),
        )
        .unwrap_err();
    assert!(
        matches!(err, CoreError::IncompleteSelection { ref missing, .. } if missing == &["weight_bracket"]),
        "got: {err:?}"
    );
}

// -----------------------------------------------------------------------
// express
// -----------------------------------------------------------------------

#[test]
fn express_rush_medium_package() {
    let breakdown = price(
        ServiceFlow::Express,
        ExpressSelection {
            package_size: Some("medium".to_string()),
            urgency: Some("rush".to_string()),
        },
    );
    assert_eq!(breakdown.base, dec(22, 0));
    assert_eq!(breakdown.adjustment("urgency"), Some(dec(25, 0)));
    assert_eq!(breakdown.total, dec(47, 0));
}

#[test]
fn express_unknown_urgency_is_invalid_input() {
    let selection = ServiceSelection::new()
        .with("package_size", "small")
        .with("urgency", "yesterday");
    let err = RateCatalog::builtin()
        .calculate(ServiceFlow::Express, &selection)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { ref field, .. } if field == "urgency"));
}

// -----------------------------------------------------------------------
// invariants
// -----------------------------------------------------------------------

#[test]
fn empty_selection_is_incomplete_for_every_flow() {
    let catalog = RateCatalog::builtin();
    for flow in ServiceFlow::ALL {
        let err = catalog
            .calculate(flow, &ServiceSelection::new())
            .unwrap_err();
        assert!(
            matches!(err, CoreError::IncompleteSelection { flow: f, ref missing } if f == flow && !missing.is_empty()),
            "{flow}: expected IncompleteSelection, got: {err:?}"
        );
    }
}

#[test]
fn flow_without_rules_is_invalid_input() {
    let catalog = RateCatalog {
        flows: BTreeMap::new(),
    };
    let err = catalog
        .calculate(ServiceFlow::Express, &ServiceSelection::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { ref field, .. } if field == "flow"));
}

fn random_selection(rng: &mut StdRng, flow: ServiceFlow) -> ServiceSelection {
    let pick = |rng: &mut StdRng, options: &[&str]| -> String {
        (*options.choose(rng).expect("non-empty options")).to_string()
    };
    match flow {
        ServiceFlow::Shipping => ShippingSelection {
            package_type: Some(pick(rng, &["envelope", "parcel", "palette"])),
            weight_bracket: Some(pick(rng, &["light", "medium", "heavy", "oversized"])),
            shipping_type: Some(pick(rng, &["economy", "standard", "express", "overnight"])),
            distance_km: Some(rng.random_range(0.0..2000.0)),
        }
        .into(),
        ServiceFlow::Moving => MovingSelection {
            apartment_size: Some(pick(
                rng,
                &["studio", "one_bedroom", "two_bedroom", "three_bedroom", "house"],
            )),
            services: ["packing", "assembly", "disposal", "piano"]
                .into_iter()
                .filter(|_| rng.random_bool(0.5))
                .map(str::to_string)
                .collect(),
            inventory_items: Some(rng.random_range(0..30)),
        }
        .into(),
        ServiceFlow::Standard => StandardSelection {
            length_cm: Some(rng.random_range(1.0..120.0)),
            width_cm: Some(rng.random_range(1.0..120.0)),
            height_cm: Some(rng.random_range(1.0..120.0)),
            weight_kg: Some(rng.random_range(0.0..40.0)),
            delivery_window: Some(pick(rng, &["standard", "next_day", "same_day"])),
        }
        .into(),
        ServiceFlow::Storage => StorageSelection {
            unit_size: Some(pick(rng, &["small", "medium", "large", "extra_large"])),
            duration: Some(pick(rng, &["short", "medium", "long"])),
            climate_control: rng.random_bool(0.5),
            pickup_service: rng.random_bool(0.5),
        }
        .into(),
        ServiceFlow::Express => ExpressSelection {
            package_size: Some(pick(rng, &["small", "medium", "large"])),
            urgency: Some(pick(rng, &["standard", "priority", "rush"])),
        }
        .into(),
    }
}

#[test]
fn random_selections_keep_breakdown_invariants() {
    let catalog = RateCatalog::builtin();
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..500 {
        let flow = *ServiceFlow::ALL.choose(&mut rng).expect("non-empty");
        let selection = random_selection(&mut rng, flow);
        let breakdown = catalog.calculate(flow, &selection).unwrap();
        assert_consistent(&breakdown);
        assert!(breakdown.adjustments.values().all(|a| !a.is_zero()));
    }
}
