//! Declarative rule tables.
//!
//! A [`FlowRules`] value is plain data: it deserializes from the `flows`
//! section of `config/pricing.yaml` and carries no behaviour beyond reading
//! its inputs out of a [`ServiceSelection`].

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::selection::ServiceSelection;
use crate::error::CoreError;

/// Rounding precision applied to the base and to every adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Nearest whole currency unit.
    Dollars,
    /// Nearest cent.
    Cents,
}

impl Rounding {
    #[must_use]
    pub fn apply(self, amount: Decimal) -> Decimal {
        let places = match self {
            Rounding::Dollars => 0,
            Rounding::Cents => 2,
        };
        amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// One term of the base price. The base is the product of all factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Factor {
    Fixed {
        amount: Decimal,
    },
    /// Amount picked by the value of a choice field.
    Lookup {
        field: String,
        table: BTreeMap<String, Decimal>,
    },
    /// A numeric field used as-is, e.g. a distance in kilometres.
    Number {
        field: String,
    },
}

impl Factor {
    pub(crate) fn field(&self) -> Option<&str> {
        match self {
            Factor::Fixed { .. } => None,
            Factor::Lookup { field, .. } | Factor::Number { field } => Some(field),
        }
    }

    pub(crate) fn value(&self, selection: &ServiceSelection) -> Result<Decimal, CoreError> {
        match self {
            Factor::Fixed { amount } => Ok(*amount),
            Factor::Lookup { field, table } => lookup(selection, field, table),
            Factor::Number { field } => required(selection.number(field)?, field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    /// Key of the adjustment in the breakdown. `Items` rules key each entry
    /// by the item name instead, so for them the label only names the rule
    /// in validation and overflow errors and never appears in a breakdown.
    pub label: String,
    pub rule: AdjustmentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Flat fee when a flag is set. An absent flag counts as unset.
    Flag { field: String, amount: Decimal },
    /// Flat fee per selected add-on. An absent list selects nothing.
    Items {
        field: String,
        table: BTreeMap<String, Decimal>,
    },
    /// `min(count * per_unit, cap)`. An absent count is zero.
    CappedCount {
        field: String,
        per_unit: Decimal,
        cap: Decimal,
    },
    /// `max(0, ceil(value / step) - free_steps) * amount`.
    Step {
        field: String,
        step: Decimal,
        free_steps: u32,
        amount: Decimal,
    },
    /// `max(0, (value - threshold) * rate)`.
    Excess {
        field: String,
        threshold: Decimal,
        rate: Decimal,
    },
    /// Flat fee picked by a choice field.
    Surcharge {
        field: String,
        table: BTreeMap<String, Decimal>,
    },
    /// Fraction of the pre-discount subtotal, picked by a choice field and
    /// applied as a negative adjustment.
    Discount {
        field: String,
        rates: BTreeMap<String, Decimal>,
    },
}

impl AdjustmentKind {
    pub(crate) fn field(&self) -> &str {
        match self {
            AdjustmentKind::Flag { field, .. }
            | AdjustmentKind::Items { field, .. }
            | AdjustmentKind::CappedCount { field, .. }
            | AdjustmentKind::Step { field, .. }
            | AdjustmentKind::Excess { field, .. }
            | AdjustmentKind::Surcharge { field, .. }
            | AdjustmentKind::Discount { field, .. } => field,
        }
    }

    /// Whether the rule needs its field to be present in the selection.
    pub(crate) fn requires_field(&self) -> bool {
        !matches!(
            self,
            AdjustmentKind::Flag { .. }
                | AdjustmentKind::Items { .. }
                | AdjustmentKind::CappedCount { .. }
        )
    }
}

/// Pricing rules for one service flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRules {
    pub rounding: Rounding,
    pub base: Vec<Factor>,
    #[serde(default)]
    pub adjustments: Vec<AdjustmentRule>,
}

impl FlowRules {
    /// Fields the selection must contain, in rule order, without duplicates.
    #[must_use]
    pub fn required_fields(&self) -> Vec<&str> {
        let base = self.base.iter().filter_map(Factor::field);
        let adjustments = self
            .adjustments
            .iter()
            .filter(|a| a.rule.requires_field())
            .map(|a| a.rule.field());

        let mut fields: Vec<&str> = Vec::new();
        for field in base.chain(adjustments) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }
}

pub(crate) fn lookup(
    selection: &ServiceSelection,
    field: &str,
    table: &BTreeMap<String, Decimal>,
) -> Result<Decimal, CoreError> {
    let choice = required(selection.choice(field)?, field)?;
    table
        .get(choice)
        .copied()
        .ok_or_else(|| unknown_option(field, choice, table))
}

pub(crate) fn unknown_option(
    field: &str,
    value: &str,
    table: &BTreeMap<String, Decimal>,
) -> CoreError {
    let options = table.keys().map(String::as_str).collect::<Vec<_>>();
    CoreError::invalid(
        field,
        format!(
            "unknown option '{value}'; expected one of: {}",
            options.join(", ")
        ),
    )
}

/// Required fields are checked up front, so an absent value here means the
/// rule table and the pre-check disagree.
fn required<T>(value: Option<T>, field: &str) -> Result<T, CoreError> {
    value.ok_or_else(|| CoreError::invalid(field, "value is required"))
}
