//! Focused unit tests covering CLI configuration resolution.

use super::helpers::{StubComparatorFactory, block_on};
use super::*;
use crate::compare::{CompareArgs, CompareConfig, execute_compare, parse_bbox};
use crate::prompt::{DEFAULT_QUESTION, PromptArgs, PromptConfig, execute_prompt};
use crate::providers::{
    ComparatorFactory, HttpComparatorFactory, OpenDataSettings, ProviderFlags, ProviderSettings,
};
use crate::single::{SingleArgs, SingleConfig, parse_lon_lat};
use camino::Utf8PathBuf;
use geo::Coord;
use routecompare_core::{BoundingBox, BoundingBoxError, ProviderKind, RouteStrategy};
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn compare_args() -> CompareArgs {
    CompareArgs {
        google_api_key: Some("google-key".to_owned()),
        here_api_key: Some("here-key".to_owned()),
        ..CompareArgs::default()
    }
}

#[rstest]
#[case(None, Some("here"), ARG_GOOGLE_API_KEY, "ROUTECOMPARE_CMDS_COMPARE_GOOGLE_API_KEY")]
#[case(Some("google"), None, ARG_HERE_API_KEY, "ROUTECOMPARE_CMDS_COMPARE_HERE_API_KEY")]
#[case(Some("google"), Some("  "), ARG_HERE_API_KEY, "ROUTECOMPARE_CMDS_COMPARE_HERE_API_KEY")]
fn converting_without_credentials_errors(
    #[case] google: Option<&str>,
    #[case] here: Option<&str>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = CompareArgs {
        google_api_key: google.map(str::to_owned),
        here_api_key: here.map(str::to_owned),
        ..CompareArgs::default()
    };
    let err = CompareConfig::try_from(args).expect_err("missing credential should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn compare_defaults_apply(compare_args: CompareArgs) {
    let config = CompareConfig::try_from(compare_args).expect("valid config");
    assert_eq!(config.bbox, BoundingBox::default());
    assert_eq!(config.strategy, RouteStrategy::Shortest);
    assert_eq!(config.pairs, 5);
    assert_eq!(config.seed, None);
    assert!(!config.snap);
    assert_eq!(config.output_dir, Utf8PathBuf::from("data"));
    assert_eq!(config.providers.open_data, OpenDataSettings::Osrm);
    assert_eq!(
        config.providers.osrm_base_url,
        "https://router.project-osrm.org"
    );
}

#[rstest]
fn graphhopper_backend_requires_its_key(compare_args: CompareArgs) {
    let args = CompareArgs {
        backend: Some("graphhopper".to_owned()),
        ..compare_args
    };
    let err = CompareConfig::try_from(args).expect_err("missing GraphHopper key");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_GRAPHHOPPER_API_KEY);
            assert_eq!(env, "ROUTECOMPARE_CMDS_COMPARE_GRAPHHOPPER_API_KEY");
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn graphhopper_backend_uses_default_usage_file(compare_args: CompareArgs) {
    let args = CompareArgs {
        backend: Some("GraphHopper".to_owned()),
        graphhopper_api_key: Some("gh-key".to_owned()),
        ..compare_args
    };
    let config = CompareConfig::try_from(args).expect("valid config");
    assert_eq!(
        config.providers.open_data,
        OpenDataSettings::GraphHopper {
            api_key: "gh-key".to_owned(),
            usage_file: Utf8PathBuf::from("data/graphhopper_usage.json"),
        }
    );
    assert_eq!(config.providers.open_data_kind(), ProviderKind::GraphHopper);
}

#[rstest]
fn unknown_backend_and_strategy_are_rejected(compare_args: CompareArgs) {
    let args = CompareArgs {
        backend: Some("valhalla".to_owned()),
        ..compare_args.clone()
    };
    assert!(matches!(
        CompareConfig::try_from(args),
        Err(CliError::InvalidBackend(_))
    ));

    let args = CompareArgs {
        strategy: Some("scenic".to_owned()),
        ..compare_args
    };
    assert!(matches!(
        CompareConfig::try_from(args),
        Err(CliError::InvalidStrategy(_))
    ));
}

#[rstest]
fn bbox_parses_four_numbers() {
    let bbox = parse_bbox(" -0.2, 51.4 ,0.1,51.6").expect("valid bbox");
    assert_eq!(bbox.to_array(), [-0.2, 51.4, 0.1, 51.6]);
}

#[rstest]
#[case("9.1,48.7,9.2")]
#[case("9.1,48.7,9.2,48.8,1.0")]
#[case("west,48.7,9.2,48.8")]
fn bbox_rejects_malformed_values(#[case] value: &str) {
    match parse_bbox(value) {
        Err(CliError::BoundingBoxFormat { value: rejected }) => assert_eq!(rejected, value),
        other => panic!("expected BoundingBoxFormat, found {other:?}"),
    }
}

#[rstest]
fn bbox_rejects_inverted_region() {
    let err = parse_bbox("9.2,48.7,9.1,48.8").expect_err("inverted");
    assert!(matches!(
        err,
        CliError::InvalidBoundingBox(BoundingBoxError::Inverted { .. })
    ));
}

#[rstest]
#[case("9.11,48.79", Coord { x: 9.11, y: 48.79 })]
#[case(" -0.12 , 51.5 ", Coord { x: -0.12, y: 51.5 })]
fn coordinates_parse_as_lon_lat(#[case] value: &str, #[case] expected: Coord<f64>) {
    assert_eq!(parse_lon_lat(ARG_ORIGIN, value).expect("valid"), expected);
}

#[rstest]
#[case("9.11")]
#[case("9.11;48.79")]
#[case("east,48.79")]
fn coordinates_reject_malformed_values(#[case] value: &str) {
    match parse_lon_lat(ARG_DESTINATION, value) {
        Err(CliError::CoordinateFormat { field, .. }) => assert_eq!(field, ARG_DESTINATION),
        other => panic!("expected CoordinateFormat, found {other:?}"),
    }
}

#[rstest]
fn single_requires_origin() {
    let args = SingleArgs {
        destination: Some("9.18,48.86".to_owned()),
        google_api_key: Some("g".to_owned()),
        here_api_key: Some("h".to_owned()),
        ..SingleArgs::default()
    };
    match SingleConfig::try_from(args) {
        Err(CliError::MissingArgument { field, env }) => {
            assert_eq!(field, ARG_ORIGIN);
            assert_eq!(env, "ROUTECOMPARE_CMDS_SINGLE_ORIGIN");
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn single_reports_its_own_credential_variables() {
    let args = SingleArgs {
        origin: Some("9.11,48.79".to_owned()),
        destination: Some("9.18,48.86".to_owned()),
        here_api_key: Some("h".to_owned()),
        ..SingleArgs::default()
    };
    match SingleConfig::try_from(args) {
        Err(CliError::MissingArgument { env, .. }) => {
            assert_eq!(env, "ROUTECOMPARE_CMDS_SINGLE_GOOGLE_API_KEY");
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn prompt_defaults_to_saved_stats() {
    let config = PromptConfig::from(PromptArgs::default());
    assert_eq!(config.stats, Utf8PathBuf::from("data/stats.json"));
    assert_eq!(config.pair, None);
    assert_eq!(config.question, DEFAULT_QUESTION);
}

#[rstest]
fn http_factory_wires_google_as_reference() {
    let settings = ProviderSettings::resolve(
        ProviderFlags {
            google_api_key: Some("g".to_owned()),
            here_api_key: Some("h".to_owned()),
            osrm_base_url: Some("http://localhost:5000".to_owned()),
            ..ProviderFlags::default()
        },
        crate::compare::COMPARE_ENV,
    )
    .expect("valid settings");
    let comparator = HttpComparatorFactory
        .build(&settings)
        .expect("adapters should build");
    assert_eq!(
        comparator.providers().kinds(),
        vec![ProviderKind::Google, ProviderKind::Here, ProviderKind::Osrm]
    );
}

#[rstest]
fn compare_writes_artefacts_and_progress(compare_args: CompareArgs) {
    let tmp = TempDir::new().expect("tempdir");
    let output_dir = Utf8PathBuf::from_path_buf(tmp.path().join("out")).expect("utf-8 path");
    let args = CompareArgs {
        pairs: Some(2),
        seed: Some(11),
        output_dir: Some(output_dir.clone()),
        ..compare_args
    };
    let config = CompareConfig::try_from(args).expect("valid config");
    let mut stdout: Vec<u8> = Vec::new();

    let result = block_on(execute_compare(&config, &StubComparatorFactory, &mut stdout))
        .expect("batch should succeed");

    assert_eq!(result.pairs.len(), 2);
    let text = String::from_utf8(stdout).expect("utf-8");
    let percentages: Vec<u64> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("JSON line");
            assert_eq!(value["type"], "progress");
            value["progress"].as_u64().expect("numeric progress")
        })
        .collect();
    assert_eq!(percentages, vec![25, 50, 75, 100]);
    for name in [
        "google_routes.geojson",
        "here_routes.geojson",
        "osrm_routes.geojson",
        "od_points.geojson",
        "stats.json",
    ] {
        assert!(output_dir.join(name).is_file(), "{name} should exist");
    }
}

#[rstest]
fn prompt_rejects_unknown_pair(compare_args: CompareArgs) {
    let tmp = TempDir::new().expect("tempdir");
    let output_dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 path");
    let args = CompareArgs {
        pairs: Some(1),
        seed: Some(3),
        output_dir: Some(output_dir.clone()),
        ..compare_args
    };
    let config = CompareConfig::try_from(args).expect("valid config");
    block_on(execute_compare(
        &config,
        &StubComparatorFactory,
        &mut std::io::sink(),
    ))
    .expect("batch should succeed");

    let prompt = PromptConfig {
        stats: output_dir.join("stats.json"),
        pair: Some(9),
        question: DEFAULT_QUESTION.to_owned(),
    };
    match execute_prompt(&prompt, &mut Vec::<u8>::new()) {
        Err(CliError::UnknownPair { pair, .. }) => assert_eq!(pair, 9),
        other => panic!("expected UnknownPair, found {other:?}"),
    }
}

#[rstest]
fn prompt_reports_missing_stats_file() {
    let tmp = TempDir::new().expect("tempdir");
    let prompt = PromptConfig {
        stats: Utf8PathBuf::from_path_buf(tmp.path().join("stats.json")).expect("utf-8 path"),
        pair: None,
        question: DEFAULT_QUESTION.to_owned(),
    };
    assert!(matches!(
        execute_prompt(&prompt, &mut Vec::<u8>::new()),
        Err(CliError::Store(_))
    ));
}

#[rstest]
fn prompt_reports_empty_stats_file() {
    let tmp = TempDir::new().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(tmp.path().join("stats.json")).expect("utf-8 path");
    std::fs::write(path.as_std_path(), b"{}").expect("write stats");
    let prompt = PromptConfig {
        stats: path,
        pair: None,
        question: DEFAULT_QUESTION.to_owned(),
    };
    assert!(matches!(
        execute_prompt(&prompt, &mut Vec::<u8>::new()),
        Err(CliError::NoStatistics { .. })
    ));
}
