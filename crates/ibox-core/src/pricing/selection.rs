//! User choices feeding a price calculation.
//!
//! The UI sends a flat JSON object (`{"unit_size": "medium", "climate_control":
//! true}`); [`ServiceSelection`] keeps it as a field map so the rule tables
//! can address fields by name. The typed `*Selection` structs are the
//! builder side for Rust callers: unset fields are left out of the map and
//! surface as [`CoreError::IncompleteSelection`] when a rule needs them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectionValue {
    Flag(bool),
    Number(f64),
    Choice(String),
    Items(Vec<String>),
}

impl SelectionValue {
    fn kind(&self) -> &'static str {
        match self {
            SelectionValue::Flag(_) => "a flag",
            SelectionValue::Number(_) => "a number",
            SelectionValue::Choice(_) => "a choice",
            SelectionValue::Items(_) => "a list",
        }
    }
}

impl From<bool> for SelectionValue {
    fn from(value: bool) -> Self {
        SelectionValue::Flag(value)
    }
}

impl From<f64> for SelectionValue {
    fn from(value: f64) -> Self {
        SelectionValue::Number(value)
    }
}

impl From<u32> for SelectionValue {
    fn from(value: u32) -> Self {
        SelectionValue::Number(f64::from(value))
    }
}

impl From<&str> for SelectionValue {
    fn from(value: &str) -> Self {
        SelectionValue::Choice(value.to_string())
    }
}

impl From<String> for SelectionValue {
    fn from(value: String) -> Self {
        SelectionValue::Choice(value)
    }
}

impl From<Vec<String>> for SelectionValue {
    fn from(value: Vec<String>) -> Self {
        SelectionValue::Items(value)
    }
}

/// Field map of a selection. A JSON `null` reads as an absent field, so a
/// rule that needs it reports [`CoreError::IncompleteSelection`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceSelection {
    #[serde(deserialize_with = "skip_nulls")]
    fields: BTreeMap<String, SelectionValue>,
}

fn skip_nulls<'de, D>(deserializer: D) -> Result<BTreeMap<String, SelectionValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<SelectionValue>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
        .collect())
}

impl ServiceSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<SelectionValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<SelectionValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&SelectionValue> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn choice(&self, field: &str) -> Result<Option<&str>, CoreError> {
        match self.get(field) {
            None => Ok(None),
            Some(SelectionValue::Choice(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(wrong_type(field, "a choice", other)),
        }
    }

    pub(crate) fn flag(&self, field: &str) -> Result<Option<bool>, CoreError> {
        match self.get(field) {
            None => Ok(None),
            Some(SelectionValue::Flag(value)) => Ok(Some(*value)),
            Some(other) => Err(wrong_type(field, "a flag", other)),
        }
    }

    pub(crate) fn items(&self, field: &str) -> Result<Option<&[String]>, CoreError> {
        match self.get(field) {
            None => Ok(None),
            Some(SelectionValue::Items(items)) => Ok(Some(items.as_slice())),
            Some(other) => Err(wrong_type(field, "a list", other)),
        }
    }

    /// Reads a non-negative finite number as a [`Decimal`].
    pub(crate) fn number(&self, field: &str) -> Result<Option<Decimal>, CoreError> {
        match self.get(field) {
            None => Ok(None),
            Some(SelectionValue::Number(value)) => to_amount(field, *value).map(Some),
            Some(other) => Err(wrong_type(field, "a number", other)),
        }
    }

    /// Reads either a number or the length of a list.
    pub(crate) fn count(&self, field: &str) -> Result<Option<Decimal>, CoreError> {
        match self.get(field) {
            Some(SelectionValue::Items(items)) => Ok(Some(Decimal::from(items.len()))),
            _ => self.number(field),
        }
    }
}

fn to_amount(field: &str, value: f64) -> Result<Decimal, CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::invalid(
            field,
            format!("expected a non-negative finite number, got {value}"),
        ));
    }
    Decimal::try_from(value).map_err(|e| CoreError::invalid(field, e.to_string()))
}

fn wrong_type(field: &str, expected: &str, actual: &SelectionValue) -> CoreError {
    CoreError::invalid(
        field,
        format!("expected {expected}, got {}", actual.kind()),
    )
}

fn put<V: Into<SelectionValue>>(selection: &mut ServiceSelection, field: &str, value: Option<V>) {
    if let Some(value) = value {
        selection.insert(field, value);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingSelection {
    pub package_type: Option<String>,
    pub weight_bracket: Option<String>,
    pub shipping_type: Option<String>,
    pub distance_km: Option<f64>,
}

impl From<ShippingSelection> for ServiceSelection {
    fn from(s: ShippingSelection) -> Self {
        let mut selection = ServiceSelection::new();
        put(&mut selection, "package_type", s.package_type);
        put(&mut selection, "weight_bracket", s.weight_bracket);
        put(&mut selection, "shipping_type", s.shipping_type);
        put(&mut selection, "distance_km", s.distance_km);
        selection
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovingSelection {
    pub apartment_size: Option<String>,
    /// Add-on services such as `"packing"` or `"assembly"`.
    pub services: Vec<String>,
    pub inventory_items: Option<u32>,
}

impl From<MovingSelection> for ServiceSelection {
    fn from(s: MovingSelection) -> Self {
        let mut selection = ServiceSelection::new();
        put(&mut selection, "apartment_size", s.apartment_size);
        if !s.services.is_empty() {
            selection.insert("services", s.services);
        }
        put(&mut selection, "inventory_items", s.inventory_items);
        selection
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardSelection {
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub delivery_window: Option<String>,
}

impl StandardSelection {
    /// Parcel volume in cubic centimetres, once all three dimensions are set.
    #[must_use]
    pub fn volume_cm3(&self) -> Option<f64> {
        Some(self.length_cm? * self.width_cm? * self.height_cm?)
    }
}

impl From<StandardSelection> for ServiceSelection {
    fn from(s: StandardSelection) -> Self {
        let mut selection = ServiceSelection::new();
        put(&mut selection, "volume_cm3", s.volume_cm3());
        put(&mut selection, "weight_kg", s.weight_kg);
        put(&mut selection, "delivery_window", s.delivery_window);
        selection
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageSelection {
    pub unit_size: Option<String>,
    pub duration: Option<String>,
    pub climate_control: bool,
    pub pickup_service: bool,
}

impl From<StorageSelection> for ServiceSelection {
    fn from(s: StorageSelection) -> Self {
        let mut selection = ServiceSelection::new();
        put(&mut selection, "unit_size", s.unit_size);
        put(&mut selection, "duration", s.duration);
        selection.insert("climate_control", s.climate_control);
        selection.insert("pickup_service", s.pickup_service);
        selection
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressSelection {
    pub package_size: Option<String>,
    pub urgency: Option<String>,
}

impl From<ExpressSelection> for ServiceSelection {
    fn from(s: ExpressSelection) -> Self {
        let mut selection = ServiceSelection::new();
        put(&mut selection, "package_size", s.package_size);
        put(&mut selection, "urgency", s.urgency);
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_untagged_json_values() {
        let selection: ServiceSelection = serde_json::from_str(
            r#"{"apartment_size": "studio", "services": ["packing"], "inventory_items": 6, "insured": true}"#,
        )
        .unwrap();
        assert_eq!(selection.choice("apartment_size").unwrap(), Some("studio"));
        assert_eq!(
            selection.items("services").unwrap(),
            Some(&["packing".to_string()][..])
        );
        assert_eq!(
            selection.number("inventory_items").unwrap(),
            Some(Decimal::from(6))
        );
        assert_eq!(selection.flag("insured").unwrap(), Some(true));
    }

    #[test]
    fn null_field_reads_as_absent() {
        let selection: ServiceSelection =
            serde_json::from_str(r#"{"unit_size": null, "climate_control": true}"#).unwrap();
        assert!(!selection.contains("unit_size"));
        assert_eq!(selection.flag("climate_control").unwrap(), Some(true));
    }

    #[test]
    fn wrong_type_is_invalid_input() {
        let selection = ServiceSelection::new().with("unit_size", 3.0);
        let err = selection.choice("unit_size").unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidInput { ref field, ref reason } if field == "unit_size" && reason.contains("a number")),
            "got: {err:?}"
        );
    }

    #[test]
    fn negative_number_is_invalid_input() {
        let selection = ServiceSelection::new().with("weight_kg", -1.0);
        assert!(selection.number("weight_kg").is_err());
    }

    #[test]
    fn non_finite_number_is_invalid_input() {
        let selection = ServiceSelection::new().with("weight_kg", f64::NAN);
        assert!(selection.number("weight_kg").is_err());
    }

    #[test]
    fn count_accepts_number_or_list() {
        let by_number = ServiceSelection::new().with("inventory_items", 4_u32);
        let by_list = ServiceSelection::new().with(
            "inventory_items",
            vec!["sofa".to_string(), "bed".to_string()],
        );
        assert_eq!(
            by_number.count("inventory_items").unwrap(),
            Some(Decimal::from(4))
        );
        assert_eq!(
            by_list.count("inventory_items").unwrap(),
            Some(Decimal::from(2))
        );
    }

    #[test]
    fn absent_field_reads_as_none() {
        let selection = ServiceSelection::new();
        assert_eq!(selection.flag("climate_control").unwrap(), None);
        assert!(selection.is_empty());
    }

    #[test]
    fn standard_selection_needs_all_dimensions_for_volume() {
        let partial = StandardSelection {
            length_cm: Some(20.0),
            width_cm: Some(20.0),
            ..StandardSelection::default()
        };
        assert!(partial.volume_cm3().is_none());
        let selection = ServiceSelection::from(partial);
        assert!(!selection.contains("volume_cm3"));

        let full = StandardSelection {
            length_cm: Some(20.0),
            width_cm: Some(20.0),
            height_cm: Some(30.0),
            ..StandardSelection::default()
        };
        assert_eq!(full.volume_cm3(), Some(12_000.0));
    }

    #[test]
    fn moving_selection_omits_empty_services() {
        let selection = ServiceSelection::from(MovingSelection {
            apartment_size: Some("studio".to_string()),
            ..MovingSelection::default()
        });
        assert!(!selection.contains("services"));
        assert!(!selection.contains("inventory_items"));
    }
}
