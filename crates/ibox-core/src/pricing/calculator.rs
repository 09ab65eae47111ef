use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rules::{lookup, unknown_option, AdjustmentKind, AdjustmentRule, FlowRules};
use super::selection::ServiceSelection;
use super::ServiceFlow;
use crate::error::CoreError;

/// Itemized result of a price calculation.
///
/// `total` always equals `base` plus the sum of `adjustments`, and is never
/// below `base`. Discounts appear as negative adjustments; adjustments that
/// come out to zero are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub flow: ServiceFlow,
    pub base: Decimal,
    pub adjustments: BTreeMap<String, Decimal>,
    pub total: Decimal,
}

impl PriceBreakdown {
    #[must_use]
    pub fn adjustment(&self, label: &str) -> Option<Decimal> {
        self.adjustments.get(label).copied()
    }

    #[must_use]
    pub fn adjustments_sum(&self) -> Decimal {
        self.adjustments.values().copied().sum()
    }
}

impl FlowRules {
    /// Prices `selection` against this table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IncompleteSelection`] listing every required
    /// field that is absent, or [`CoreError::InvalidInput`] for a value of the
    /// wrong type, an unknown option, or a negative or non-finite number.
    pub fn price(
        &self,
        flow: ServiceFlow,
        selection: &ServiceSelection,
    ) -> Result<PriceBreakdown, CoreError> {
        let missing: Vec<String> = self
            .required_fields()
            .into_iter()
            .filter(|field| !selection.contains(field))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::IncompleteSelection { flow, missing });
        }

        let mut base = Decimal::ONE;
        for factor in &self.base {
            base = base
                .checked_mul(factor.value(selection)?)
                .ok_or_else(|| overflow(factor.field().unwrap_or("base")))?;
        }
        let base = self.rounding.apply(base);

        let mut adjustments: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut discounts: Vec<(&str, Decimal)> = Vec::new();
        let mut surcharges = Decimal::ZERO;

        for rule in &self.adjustments {
            if let AdjustmentKind::Discount { field, rates } = &rule.rule {
                let fraction = lookup(selection, field, rates)?;
                discounts.push((rule.label.as_str(), fraction));
                continue;
            }
            for (label, amount) in surcharge_entries(rule, selection)? {
                let amount = self.rounding.apply(amount);
                if amount.is_zero() {
                    continue;
                }
                surcharges = surcharges
                    .checked_add(amount)
                    .ok_or_else(|| overflow(&rule.label))?;
                let entry = adjustments.entry(label).or_default();
                *entry = entry
                    .checked_add(amount)
                    .ok_or_else(|| overflow(&rule.label))?;
            }
        }

        // Each discount is a share of the same pre-discount subtotal. Together
        // they may cancel the surcharges but never cut into the base.
        let subtotal = base
            .checked_add(surcharges)
            .ok_or_else(|| overflow("subtotal"))?;
        let mut headroom = surcharges;
        for (label, fraction) in discounts {
            let amount = subtotal
                .checked_mul(fraction)
                .ok_or_else(|| overflow(label))?;
            let amount = self.rounding.apply(amount).min(headroom);
            if amount > Decimal::ZERO {
                headroom -= amount;
                *adjustments.entry(label.to_string()).or_default() -= amount;
            }
        }

        let total = adjustments
            .values()
            .try_fold(base, |total, amount| total.checked_add(*amount))
            .ok_or_else(|| overflow("total"))?;
        Ok(PriceBreakdown {
            flow,
            base,
            adjustments,
            total,
        })
    }
}

/// Non-negative entries produced by every rule kind except discounts.
fn surcharge_entries(
    rule: &AdjustmentRule,
    selection: &ServiceSelection,
) -> Result<Vec<(String, Decimal)>, CoreError> {
    let single = |amount: Decimal| Ok(vec![(rule.label.clone(), amount)]);

    match &rule.rule {
        AdjustmentKind::Flag { field, amount } => {
            if selection.flag(field)?.unwrap_or(false) {
                single(*amount)
            } else {
                Ok(Vec::new())
            }
        }
        AdjustmentKind::Items { field, table } => selection
            .items(field)?
            .unwrap_or_default()
            .iter()
            .map(|item| {
                table
                    .get(item)
                    .map(|amount| (item.clone(), *amount))
                    .ok_or_else(|| unknown_option(field, item, table))
            })
            .collect(),
        AdjustmentKind::CappedCount {
            field,
            per_unit,
            cap,
        } => {
            let count = selection.count(field)?.unwrap_or_default();
            let amount = count.checked_mul(*per_unit).ok_or_else(|| overflow(field))?;
            single(amount.min(*cap))
        }
        AdjustmentKind::Step {
            field,
            step,
            free_steps,
            amount,
        } => {
            let value = selection.number(field)?.unwrap_or_default();
            let steps = value
                .checked_div(*step)
                .ok_or_else(|| CoreError::invalid(field, "step size must be positive"))?
                .ceil();
            let steps = (steps - Decimal::from(*free_steps)).max(Decimal::ZERO);
            single(steps.checked_mul(*amount).ok_or_else(|| overflow(field))?)
        }
        AdjustmentKind::Excess {
            field,
            threshold,
            rate,
        } => {
            let value = selection.number(field)?.unwrap_or_default();
            let excess = (value - *threshold).max(Decimal::ZERO);
            single(excess.checked_mul(*rate).ok_or_else(|| overflow(field))?)
        }
        AdjustmentKind::Surcharge { field, table } => single(lookup(selection, field, table)?),
        AdjustmentKind::Discount { .. } => Ok(Vec::new()),
    }
}

fn overflow(field: &str) -> CoreError {
    CoreError::invalid(field, "amount is too large to price")
}

#[cfg(test)]
#[path = "calculator_test.rs"]
mod tests;
