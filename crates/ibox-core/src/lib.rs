pub mod app_config;
pub mod config;
pub mod distance;
pub mod driver;
pub mod error;
pub mod geo;
pub mod polyline;
pub mod pricing;
pub mod route;
pub mod validation;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use distance::{estimate_km, haversine_km};
pub use driver::{simulate_nearby_drivers, DriverSearch, NearbyDriver};
pub use error::{ConfigError, CoreError, DecodeError};
pub use geo::{Bounds, GeoPoint, MapRegion};
pub use polyline::{decode, encode};
pub use pricing::{
    PriceBreakdown, RateCatalog, Rounding, SelectionValue, ServiceFlow, ServiceSelection,
};
pub use route::Route;
pub use validation::{validate, FieldRules, FormErrors, Rule};
