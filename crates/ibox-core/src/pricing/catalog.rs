use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculator::PriceBreakdown;
use super::rules::{AdjustmentKind, AdjustmentRule, Factor, FlowRules, Rounding};
use super::selection::ServiceSelection;
use super::ServiceFlow;
use crate::error::{ConfigError, CoreError};

/// Rule tables for every service flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCatalog {
    pub flows: BTreeMap<ServiceFlow, FlowRules>,
}

impl RateCatalog {
    /// Load and validate a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
            path: path.display().to_string(),
            source: e,
        })?;

        let catalog: RateCatalog = serde_yaml::from_str(&content)?;
        catalog.validate()?;

        tracing::info!(
            path = %path.display(),
            flows = catalog.flows.len(),
            "loaded pricing catalog"
        );
        Ok(catalog)
    }

    #[must_use]
    pub fn rules(&self, flow: ServiceFlow) -> Option<&FlowRules> {
        self.flows.get(&flow)
    }

    /// Prices a selection for `flow`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IncompleteSelection`] when required fields are
    /// absent and [`CoreError::InvalidInput`] for unusable values or a flow
    /// with no rule table.
    pub fn calculate(
        &self,
        flow: ServiceFlow,
        selection: &ServiceSelection,
    ) -> Result<PriceBreakdown, CoreError> {
        let rules = self.rules(flow).ok_or_else(|| {
            CoreError::invalid("flow", format!("no pricing rules for {flow}"))
        })?;
        let breakdown = rules.price(flow, selection)?;

        tracing::debug!(
            %flow,
            base = %breakdown.base,
            adjustments = breakdown.adjustments.len(),
            total = %breakdown.total,
            "calculated price"
        );
        Ok(breakdown)
    }

    /// Check that every flow has a usable rule table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for flow in ServiceFlow::ALL {
            let rules = self
                .flows
                .get(&flow)
                .ok_or_else(|| invalid(format!("missing rules for flow '{flow}'")))?;
            validate_flow(flow, rules)?;
        }
        Ok(())
    }

    /// The catalog shipped with the app. `config/pricing.yaml` holds the same
    /// tables.
    #[must_use]
    pub fn builtin() -> Self {
        let flows = BTreeMap::from([
            (ServiceFlow::Shipping, shipping_rules()),
            (ServiceFlow::Moving, moving_rules()),
            (ServiceFlow::Standard, standard_rules()),
            (ServiceFlow::Storage, storage_rules()),
            (ServiceFlow::Express, express_rules()),
        ]);
        Self { flows }
    }
}

impl Default for RateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_flow(flow: ServiceFlow, rules: &FlowRules) -> Result<(), ConfigError> {
    if rules.base.is_empty() {
        return Err(invalid(format!("flow '{flow}' has no base factors")));
    }

    for factor in &rules.base {
        match factor {
            Factor::Fixed { amount } => non_negative(flow, "base", *amount)?,
            Factor::Lookup { field, table } => validate_table(flow, field, table)?,
            Factor::Number { .. } => {}
        }
    }

    let mut seen_labels = HashSet::new();
    for AdjustmentRule { label, rule } in &rules.adjustments {
        let labels: Vec<&str> = match rule {
            AdjustmentKind::Items { table, .. } => table.keys().map(String::as_str).collect(),
            _ => vec![label.as_str()],
        };
        for label in labels {
            if label.trim().is_empty() {
                return Err(invalid(format!("flow '{flow}' has an empty adjustment label")));
            }
            if !seen_labels.insert(label) {
                return Err(invalid(format!(
                    "flow '{flow}' has duplicate adjustment label '{label}'"
                )));
            }
        }
        validate_adjustment(flow, label, rule)?;
    }

    Ok(())
}

fn validate_adjustment(
    flow: ServiceFlow,
    label: &str,
    rule: &AdjustmentKind,
) -> Result<(), ConfigError> {
    match rule {
        AdjustmentKind::Flag { amount, .. } => non_negative(flow, label, *amount),
        AdjustmentKind::Items { field, table } | AdjustmentKind::Surcharge { field, table } => {
            validate_table(flow, field, table)
        }
        AdjustmentKind::CappedCount { per_unit, cap, .. } => {
            non_negative(flow, label, *per_unit)?;
            non_negative(flow, label, *cap)
        }
        AdjustmentKind::Step {
            step, amount, ..
        } => {
            if *step <= Decimal::ZERO {
                return Err(invalid(format!(
                    "flow '{flow}' adjustment '{label}' needs a positive step, got {step}"
                )));
            }
            non_negative(flow, label, *amount)
        }
        AdjustmentKind::Excess {
            threshold, rate, ..
        } => {
            non_negative(flow, label, *threshold)?;
            non_negative(flow, label, *rate)
        }
        AdjustmentKind::Discount { field, rates } => {
            validate_table(flow, field, rates)?;
            match rates.iter().find(|(_, rate)| **rate >= Decimal::ONE) {
                Some((choice, rate)) => Err(invalid(format!(
                    "flow '{flow}' discount '{label}' for '{choice}' must be below 1, got {rate}"
                ))),
                None => Ok(()),
            }
        }
    }
}

fn validate_table(
    flow: ServiceFlow,
    field: &str,
    table: &BTreeMap<String, Decimal>,
) -> Result<(), ConfigError> {
    if table.is_empty() {
        return Err(invalid(format!(
            "flow '{flow}' has an empty table for field '{field}'"
        )));
    }
    table
        .iter()
        .try_for_each(|(choice, amount)| non_negative(flow, &format!("{field}.{choice}"), *amount))
}

fn non_negative(flow: ServiceFlow, what: &str, amount: Decimal) -> Result<(), ConfigError> {
    if amount < Decimal::ZERO {
        return Err(invalid(format!(
            "flow '{flow}' has a negative amount for '{what}': {amount}"
        )));
    }
    Ok(())
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation(message)
}

// ---------------------------------------------------------------------------
// Builtin tables
// ---------------------------------------------------------------------------

fn dec(num: i64, scale: u32) -> Decimal {
    Decimal::new(num, scale)
}

fn table(entries: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
    entries
        .iter()
        .map(|(key, amount)| ((*key).to_string(), *amount))
        .collect()
}

fn adjustment(label: &str, rule: AdjustmentKind) -> AdjustmentRule {
    AdjustmentRule {
        label: label.to_string(),
        rule,
    }
}

fn shipping_rules() -> FlowRules {
    FlowRules {
        rounding: Rounding::Dollars,
        base: vec![
            // Rate per kilometre by package type.
            Factor::Lookup {
                field: "package_type".to_string(),
                table: table(&[
                    ("envelope", dec(9, 1)),
                    ("parcel", dec(14, 1)),
                    ("palette", dec(32, 1)),
                ]),
            },
            Factor::Number {
                field: "distance_km".to_string(),
            },
            Factor::Lookup {
                field: "weight_bracket".to_string(),
                table: table(&[
                    ("light", dec(1, 0)),
                    ("medium", dec(125, 2)),
                    ("heavy", dec(16, 1)),
                    ("oversized", dec(22, 1)),
                ]),
            },
            Factor::Lookup {
                field: "shipping_type".to_string(),
                table: table(&[
                    ("economy", dec(85, 2)),
                    ("standard", dec(1, 0)),
                    ("express", dec(14, 1)),
                    ("overnight", dec(19, 1)),
                ]),
            },
        ],
        adjustments: Vec::new(),
    }
}

fn moving_rules() -> FlowRules {
    FlowRules {
        rounding: Rounding::Cents,
        base: vec![Factor::Lookup {
            field: "apartment_size".to_string(),
            table: table(&[
                ("studio", dec(129, 0)),
                ("one_bedroom", dec(189, 0)),
                ("two_bedroom", dec(259, 0)),
                ("three_bedroom", dec(349, 0)),
                ("house", dec(499, 0)),
            ]),
        }],
        adjustments: vec![
            adjustment(
                "services",
                AdjustmentKind::Items {
                    field: "services".to_string(),
                    table: table(&[
                        ("packing", dec(80, 0)),
                        ("assembly", dec(40, 0)),
                        ("disposal", dec(60, 0)),
                        ("piano", dec(150, 0)),
                    ]),
                },
            ),
            adjustment(
                "complexity",
                AdjustmentKind::CappedCount {
                    field: "inventory_items".to_string(),
                    per_unit: dec(5, 0),
                    cap: dec(50, 0),
                },
            ),
        ],
    }
}

fn standard_rules() -> FlowRules {
    FlowRules {
        rounding: Rounding::Cents,
        base: vec![Factor::Fixed {
            amount: dec(1299, 2),
        }],
        adjustments: vec![
            adjustment(
                "size",
                AdjustmentKind::Step {
                    field: "volume_cm3".to_string(),
                    step: dec(8000, 0),
                    free_steps: 1,
                    amount: dec(4, 0),
                },
            ),
            adjustment(
                "weight",
                AdjustmentKind::Excess {
                    field: "weight_kg".to_string(),
                    threshold: dec(2, 0),
                    rate: dec(15, 1),
                },
            ),
            adjustment(
                "deliveryWindow",
                AdjustmentKind::Surcharge {
                    field: "delivery_window".to_string(),
                    table: table(&[
                        ("standard", dec(0, 0)),
                        ("next_day", dec(6, 0)),
                        ("same_day", dec(12, 0)),
                    ]),
                },
            ),
        ],
    }
}

fn storage_rules() -> FlowRules {
    FlowRules {
        rounding: Rounding::Cents,
        base: vec![Factor::Lookup {
            field: "unit_size".to_string(),
            table: table(&[
                ("small", dec(45, 0)),
                ("medium", dec(75, 0)),
                ("large", dec(120, 0)),
                ("extra_large", dec(175, 0)),
            ]),
        }],
        adjustments: vec![
            adjustment(
                "climate",
                AdjustmentKind::Flag {
                    field: "climate_control".to_string(),
                    amount: dec(20, 0),
                },
            ),
            adjustment(
                "pickup",
                AdjustmentKind::Flag {
                    field: "pickup_service".to_string(),
                    amount: dec(35, 0),
                },
            ),
            adjustment(
                "durationDiscount",
                AdjustmentKind::Discount {
                    field: "duration".to_string(),
                    rates: table(&[
                        ("short", dec(0, 0)),
                        ("medium", dec(10, 2)),
                        ("long", dec(20, 2)),
                    ]),
                },
            ),
        ],
    }
}

fn express_rules() -> FlowRules {
    FlowRules {
        rounding: Rounding::Cents,
        base: vec![Factor::Lookup {
            field: "package_size".to_string(),
            table: table(&[
                ("small", dec(15, 0)),
                ("medium", dec(22, 0)),
                ("large", dec(35, 0)),
            ]),
        }],
        adjustments: vec![adjustment(
            "urgency",
            AdjustmentKind::Surcharge {
                field: "urgency".to_string(),
                table: table(&[
                    ("standard", dec(0, 0)),
                    ("priority", dec(10, 0)),
                    ("rush", dec(25, 0)),
                ]),
            },
        )],
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
