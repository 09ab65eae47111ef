use clap::Parser;
use ibox_core::{AppConfig, Environment};

use super::*;

fn test_config() -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "info".to_string(),
        pricing_path: None,
        driver_count: 3,
        driver_max_offset_deg: 0.02,
        driver_speed_kmh: 30.0,
    }
}

#[test]
fn parses_route_with_polyline() {
    let cli = Cli::try_parse_from(["ibox-cli", "route", "--polyline", "_p~iF~ps|U"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Route {
            polyline: Some(ref p),
            directions: None
        } if p == "_p~iF~ps|U"
    ));
}

#[test]
fn route_requires_a_source() {
    assert!(Cli::try_parse_from(["ibox-cli", "route"]).is_err());
}

#[test]
fn route_rejects_both_sources() {
    let result = Cli::try_parse_from([
        "ibox-cli",
        "route",
        "--polyline",
        "??",
        "--directions",
        "resp.json",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_encode_points_with_negative_longitude() {
    let cli = Cli::try_parse_from(["ibox-cli", "encode", "38.5,-120.2", "40.7,-120.95"])
        .expect("expected valid cli args");
    let Commands::Encode { points } = cli.command else {
        panic!("expected encode command");
    };
    assert_eq!(
        points,
        vec![GeoPoint::new(38.5, -120.2), GeoPoint::new(40.7, -120.95)]
    );
}

#[test]
fn encode_rejects_malformed_point() {
    assert!(Cli::try_parse_from(["ibox-cli", "encode", "38.5"]).is_err());
}

#[test]
fn parses_quote_flow() {
    let cli = Cli::try_parse_from([
        "ibox-cli",
        "quote",
        "storage",
        "--selection",
        r#"{"unit_size":"medium"}"#,
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Quote {
            flow: ServiceFlow::Storage,
            selection: Some(_),
            selection_file: None
        }
    ));
}

#[test]
fn quote_rejects_unknown_flow() {
    let result = Cli::try_parse_from(["ibox-cli", "quote", "teleport", "--selection", "{}"]);
    assert!(result.is_err());
}

#[test]
fn parses_validate_fields() {
    let cli = Cli::try_parse_from([
        "ibox-cli",
        "validate",
        "address",
        "--field",
        "postal_code=H3G 1M8",
        "--field",
        "city=Montréal",
    ])
    .expect("expected valid cli args");
    let Commands::Validate { form, fields } = cli.command else {
        panic!("expected validate command");
    };
    assert_eq!(form, FormKind::Address);
    assert_eq!(
        fields,
        vec![
            ("postal_code".to_string(), "H3G 1M8".to_string()),
            ("city".to_string(), "Montréal".to_string()),
        ]
    );
}

#[test]
fn parses_negative_estimate() {
    let cli = Cli::try_parse_from(["ibox-cli", "estimate", "-0.009"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Estimate { delta_degrees } if delta_degrees == -0.009));
}

#[test]
fn parse_key_value_rejects_missing_equals() {
    assert!(parse_key_value("postal_code").is_err());
    assert!(parse_key_value("=value").is_err());
    assert_eq!(
        parse_key_value("note=a=b").unwrap(),
        ("note".to_string(), "a=b".to_string())
    );
}

#[test]
fn quote_command_prices_inline_selection() {
    let output = commands::quote(
        &test_config(),
        ServiceFlow::Express,
        Some(r#"{"package_size":"small","urgency":"priority"}"#),
        None,
    )
    .unwrap();
    assert_eq!(output["flow"], "express");
    assert!(output["adjustments"].get("urgency").is_some());
}

#[test]
fn quote_command_surfaces_incomplete_selection() {
    let err = commands::quote(&test_config(), ServiceFlow::Storage, Some("{}"), None).unwrap_err();
    assert!(err.to_string().contains("unit_size"), "got: {err}");
}

#[test]
fn validate_command_reports_errors_as_data() {
    let output = commands::validate(
        FormKind::Address,
        vec![("postal_code".to_string(), "12345".to_string())],
    );
    assert_eq!(output["valid"], false);
    assert!(output["errors"].get("postal_code").is_some());
    assert!(output["errors"].get("city").is_some());
}

#[test]
fn drivers_command_is_repeatable_with_seed() {
    let origin = GeoPoint::new(45.4972, -73.5790);
    let a = commands::drivers(&test_config(), origin, None, Some(9)).unwrap();
    let b = commands::drivers(&test_config(), origin, None, Some(9)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a["drivers"].as_array().map(Vec::len), Some(3));
}

#[test]
fn route_command_reports_region() {
    let output = commands::route(Some("_p~iF~ps|U_ulLnnqC_mqNvxq`@"), None).unwrap();
    assert_eq!(output["points"].as_array().map(Vec::len), Some(3));
    assert!(output["region"].is_object());
    assert!(output["length_km"].as_f64().unwrap() > 0.0);
}

#[test]
fn encode_command_matches_reference() {
    let output = commands::encode(&[
        GeoPoint::new(38.5, -120.2),
        GeoPoint::new(40.7, -120.95),
        GeoPoint::new(43.252, -126.453),
    ])
    .unwrap();
    assert_eq!(output["polyline"], "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
}

#[test]
fn encode_command_rejects_out_of_range_latitude() {
    let err = commands::encode(&[GeoPoint::new(95.0, 0.0)]).unwrap_err();
    assert!(err.to_string().contains("latitude"), "got: {err}");
}
