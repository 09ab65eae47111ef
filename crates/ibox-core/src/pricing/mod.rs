//! Price estimation for every service flow.
//!
//! All flows share one calculator; what differs between them is the
//! [`FlowRules`] table in the [`RateCatalog`]. A table lists the factors
//! multiplied into the base price and the adjustments added on top, each of
//! which reads its input from the [`ServiceSelection`] alone.

mod calculator;
mod catalog;
mod rules;
mod selection;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use calculator::PriceBreakdown;
pub use catalog::RateCatalog;
pub use rules::{AdjustmentKind, AdjustmentRule, Factor, FlowRules, Rounding};
pub use selection::{
    ExpressSelection, MovingSelection, SelectionValue, ServiceSelection, ShippingSelection,
    StandardSelection, StorageSelection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceFlow {
    /// Parcel and palette shipping priced by distance.
    Shipping,
    Moving,
    /// Standard same-city delivery.
    Standard,
    Storage,
    Express,
}

impl ServiceFlow {
    pub const ALL: [ServiceFlow; 5] = [
        ServiceFlow::Shipping,
        ServiceFlow::Moving,
        ServiceFlow::Standard,
        ServiceFlow::Storage,
        ServiceFlow::Express,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceFlow::Shipping => "shipping",
            ServiceFlow::Moving => "moving",
            ServiceFlow::Standard => "standard",
            ServiceFlow::Storage => "storage",
            ServiceFlow::Express => "express",
        }
    }
}

impl fmt::Display for ServiceFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceFlow {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceFlow::ALL
            .into_iter()
            .find(|flow| flow.as_str() == s)
            .ok_or_else(|| CoreError::invalid("flow", format!("unknown service flow '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_parses_from_display_name() {
        for flow in ServiceFlow::ALL {
            assert_eq!(flow.to_string().parse::<ServiceFlow>().unwrap(), flow);
        }
    }

    #[test]
    fn flow_rejects_unknown_name() {
        let err = "teleport".parse::<ServiceFlow>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { ref field, .. } if field == "flow"));
    }

    #[test]
    fn flow_serializes_lowercase() {
        let json = serde_json::to_string(&ServiceFlow::Storage).unwrap();
        assert_eq!(json, "\"storage\"");
    }
}
