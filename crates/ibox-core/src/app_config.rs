use std::path::PathBuf;

use crate::driver::DriverSearch;
use crate::error::ConfigError;
use crate::pricing::RateCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// YAML catalog overriding the builtin rate tables.
    pub pricing_path: Option<PathBuf>,
    pub driver_count: usize,
    pub driver_max_offset_deg: f64,
    pub driver_speed_kmh: f64,
}

impl AppConfig {
    #[must_use]
    pub fn driver_search(&self) -> DriverSearch {
        DriverSearch {
            count: self.driver_count,
            max_offset_deg: self.driver_max_offset_deg,
            average_speed_kmh: self.driver_speed_kmh,
        }
    }

    /// The catalog at `pricing_path`, or the builtin one when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured file cannot be loaded.
    pub fn rate_catalog(&self) -> Result<RateCatalog, ConfigError> {
        match &self.pricing_path {
            Some(path) => RateCatalog::load(path),
            None => Ok(RateCatalog::builtin()),
        }
    }
}
