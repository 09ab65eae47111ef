//! Subcommand handlers. Each returns the JSON value `main` prints to stdout.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use ibox_core::validation::{address_rules, contact_rules, measurement_rules};
use ibox_core::{AppConfig, GeoPoint, Route, ServiceFlow, ServiceSelection};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use crate::FormKind;

pub(crate) fn route(polyline: Option<&str>, directions: Option<&Path>) -> anyhow::Result<Value> {
    let route = match (polyline, directions) {
        (Some(encoded), _) => Route::from_encoded(encoded)?,
        (None, Some(path)) => {
            let response = read_json(path)?;
            Route::from_directions(&response)?
        }
        (None, None) => anyhow::bail!("either --polyline or --directions is required"),
    };

    Ok(json!({
        "points": route.points,
        "length_km": route.length_km(),
        "region": route.region(),
    }))
}

pub(crate) fn encode(points: &[GeoPoint]) -> anyhow::Result<Value> {
    Ok(json!({ "polyline": ibox_core::encode(points)? }))
}

pub(crate) fn quote(
    config: &AppConfig,
    flow: ServiceFlow,
    inline: Option<&str>,
    file: Option<&Path>,
) -> anyhow::Result<Value> {
    let selection: ServiceSelection = match (inline, file) {
        (Some(raw), _) => serde_json::from_str(raw).context("selection is not a JSON object")?,
        (None, Some(path)) => serde_json::from_value(read_json(path)?)
            .with_context(|| format!("{} is not a selection object", path.display()))?,
        (None, None) => anyhow::bail!("either --selection or --selection-file is required"),
    };

    let catalog = config.rate_catalog()?;
    let breakdown = catalog.calculate(flow, &selection)?;
    Ok(serde_json::to_value(breakdown)?)
}

pub(crate) fn validate(form: FormKind, fields: Vec<(String, String)>) -> Value {
    let rules = match form {
        FormKind::Address => address_rules(),
        FormKind::Measurement => measurement_rules(),
        FormKind::Contact => contact_rules(),
    };
    let values: BTreeMap<String, String> = fields.into_iter().collect();
    let errors = ibox_core::validate(&values, &rules);

    if !errors.is_empty() {
        tracing::warn!(form = ?form, count = errors.len(), "form has validation errors");
    }
    json!({ "valid": errors.is_empty(), "errors": errors })
}

pub(crate) fn drivers(
    config: &AppConfig,
    origin: GeoPoint,
    count: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<Value> {
    let mut search = config.driver_search();
    if let Some(count) = count {
        search.count = count;
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let drivers = ibox_core::simulate_nearby_drivers(&mut rng, origin, &search)?;
    Ok(json!({ "origin": origin, "drivers": drivers }))
}

pub(crate) fn estimate(delta_degrees: f64) -> anyhow::Result<Value> {
    let km = ibox_core::estimate_km(delta_degrees)?;
    Ok(json!({ "delta_degrees": delta_degrees, "km": km }))
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}
