//! Form validation for the address, measurement and contact screens.
//!
//! [`validate`] never fails: every problem comes back as an entry in
//! [`FormErrors`], keyed by field, so the screen can render it inline.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const POSTAL_CODE_PATTERN: &str = r"^[A-Za-z]\d[A-Za-z][ -]?\d[A-Za-z]\d$";

static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(POSTAL_CODE_PATTERN).expect("valid postal code regex"));
static PROVINCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:AB|BC|MB|NB|NL|NS|NT|NU|ON|PE|QC|SK|YT)$").expect("valid province regex")
});
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+?1[ .-]?)?\(?\d{3}\)?[ .-]?\d{3}[ .-]?\d{4}$").expect("valid phone regex")
});

#[derive(Debug, Clone)]
pub enum Rule {
    /// Fails when the field is absent or blank.
    Required { message: String },
    /// Fails when a non-blank value does not match.
    Pattern { regex: Regex, message: String },
    /// Fails when a non-blank value is not a number within the bounds.
    Numeric {
        min: Option<f64>,
        max: Option<f64>,
        message: String,
    },
}

impl Rule {
    pub fn required(message: impl Into<String>) -> Self {
        Rule::Required {
            message: message.into(),
        }
    }

    /// Compiles `pattern` into a pattern rule.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if the pattern does not compile.
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Rule::Pattern {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    pub fn matching(regex: &Regex, message: impl Into<String>) -> Self {
        Rule::Pattern {
            regex: regex.clone(),
            message: message.into(),
        }
    }

    pub fn numeric(min: Option<f64>, max: Option<f64>, message: impl Into<String>) -> Self {
        Rule::Numeric {
            min,
            max,
            message: message.into(),
        }
    }

    pub fn postal_code() -> Self {
        Rule::matching(&POSTAL_CODE_RE, "Enter a valid postal code (e.g. H3G 1M8)")
    }

    /// Returns the failure message, or `None` when `value` passes.
    fn check(&self, value: Option<&str>) -> Option<&str> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match (self, value) {
            (Rule::Required { message }, None) => Some(message.as_str()),
            (Rule::Pattern { regex, message }, Some(v)) if !regex.is_match(v) => {
                Some(message.as_str())
            }
            (Rule::Numeric { min, max, message }, Some(v)) => match v.parse::<f64>() {
                Ok(n) if n.is_finite() && in_bounds(n, *min, *max) => None,
                _ => Some(message.as_str()),
            },
            _ => None,
        }
    }
}

fn in_bounds(n: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
}

/// Rules per field. Rules for one field run in order and the first failure
/// is reported.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: BTreeMap<String, Vec<Rule>>,
}

impl FieldRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: &str, rules: Vec<Rule>) -> Self {
        self.rules.entry(name.to_string()).or_default().extend(rules);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

/// Field name -> message for every field that failed. Empty when the form
/// is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Checks `form` against `rules`. Fields in `form` without rules are
/// ignored.
#[must_use]
pub fn validate(form: &BTreeMap<String, String>, rules: &FieldRules) -> FormErrors {
    let errors = rules
        .rules
        .iter()
        .filter_map(|(field, field_rules)| {
            let value = form.get(field).map(String::as_str);
            field_rules
                .iter()
                .find_map(|rule| rule.check(value))
                .map(|message| (field.clone(), message.to_string()))
        })
        .collect();
    FormErrors(errors)
}

/// Pickup and drop-off address form.
#[must_use]
pub fn address_rules() -> FieldRules {
    FieldRules::new()
        .field("street", vec![Rule::required("Street address is required")])
        .field("city", vec![Rule::required("City is required")])
        .field(
            "province",
            vec![
                Rule::required("Province is required"),
                Rule::matching(&PROVINCE_RE, "Use a two-letter province code (e.g. QC)"),
            ],
        )
        .field(
            "postal_code",
            vec![Rule::required("Postal code is required"), Rule::postal_code()],
        )
}

/// Parcel dimensions in centimetres and weight in kilograms.
#[must_use]
pub fn measurement_rules() -> FieldRules {
    let dimension = |label: &str| {
        vec![
            Rule::required(format!("{label} is required")),
            Rule::numeric(
                Some(1.0),
                Some(300.0),
                format!("{label} must be between 1 and 300 cm"),
            ),
        ]
    };
    FieldRules::new()
        .field("length", dimension("Length"))
        .field("width", dimension("Width"))
        .field("height", dimension("Height"))
        .field(
            "weight",
            vec![
                Rule::required("Weight is required"),
                Rule::numeric(Some(0.1), Some(70.0), "Weight must be between 0.1 and 70 kg"),
            ],
        )
}

/// Sign-up and profile contact details.
#[must_use]
pub fn contact_rules() -> FieldRules {
    FieldRules::new()
        .field("name", vec![Rule::required("Name is required")])
        .field(
            "email",
            vec![
                Rule::required("Email is required"),
                Rule::matching(&EMAIL_RE, "Enter a valid email address"),
            ],
        )
        .field(
            "phone",
            vec![Rule::matching(&PHONE_RE, "Enter a valid phone number")],
        )
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
