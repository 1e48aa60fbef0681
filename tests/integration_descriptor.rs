//! Integration tests for the descriptor workflow
//!
//! These tests load the Anza-Borrego fixture and its data file and verify
//! parsing, validation, serialization and data checks end to end.

use ecodesc::descriptor::{DEFAULT_STEP_TOLERANCE, Role};
use ecodesc::query::{Splits, Subset};
use ecodesc::validation::data::{DataCheckOptions, check_data_file};
use ecodesc::{Dataset, ErrorKind, ViolationKind, parse, validate};
use std::path::{Path, PathBuf};

const DESCRIPTOR: &str = "testdata/ANBO.txt";

fn load_fixture_text() -> String {
    std::fs::read_to_string(DESCRIPTOR).expect("fixture descriptor should be readable")
}

fn load_fixture() -> Dataset {
    Dataset::from_file(DESCRIPTOR).expect("fixture descriptor should parse")
}

#[test]
fn test_parse_anbo_descriptor() {
    let dataset = load_fixture();

    assert_eq!(dataset.name, "Anza-Borrego");
    assert_eq!(
        dataset.author.as_deref(),
        Some("Mary Ellen Harte and John Harte")
    );
    assert_eq!(dataset.citation.as_deref(), Some("Unpublished"));
    assert_eq!(dataset.datapath, "ANBO.csv");
    assert_eq!(
        dataset.column_names(),
        vec!["year", "cell", "row", "column", "spp", "count"]
    );

    for axis in ["row", "column"] {
        let spec = dataset.column(axis).expect("grid axis should be declared");
        assert_eq!(spec.min, Some(0.0), "{axis} min");
        assert_eq!(spec.max, Some(3.0), "{axis} max");
        assert_eq!(spec.step, Some(1.0), "{axis} step");
    }

    assert!(dataset.column("spp").is_some_and(|c| !c.has_numeric_domain()));
    assert_eq!(dataset.cols.column(&Role::Species), Some("spp"));
    assert_eq!(dataset.cols.column(&Role::X), Some("row"));

    let grid = dataset.grid(DEFAULT_STEP_TOLERANCE).expect("grid should be derived");
    assert_eq!((grid.x_cells, grid.y_cells, grid.total()), (4, 4, Some(16)));
}

#[test]
fn test_validate_anbo_has_no_violations() {
    let violations = validate(&load_fixture());
    assert!(violations.is_empty(), "unexpected violations: {violations:?}");
}

#[test]
fn test_row_max_below_min_is_one_violation() {
    let text = load_fixture_text().replacen("max = 3", "max = -1", 1);
    let dataset = parse(&text).expect("bounds order is not a parse error");

    let violations = validate(&dataset);

    assert_eq!(violations.len(), 1, "{violations:?}");
    assert_eq!(violations[0].kind, ViolationKind::BoundsOrder);
    assert_eq!(violations[0].section.as_deref(), Some("row"));
}

#[test]
fn test_missing_datapath_is_malformed() {
    let text: String = load_fixture_text()
        .lines()
        .filter(|l| !l.starts_with("datapath"))
        .map(|l| format!("{l}\n"))
        .collect();

    let err = parse(&text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
}

#[test]
fn test_non_numeric_step_is_rejected() {
    let text = load_fixture_text().replacen("step = 1", "step = one", 1);

    let err = parse(&text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFieldValue);
    assert!(err.is_malformed());
}

#[test]
fn test_unresolved_column_reference() {
    let text = load_fixture_text().replace(
        "y_col: column",
        "y_col: column; energy_col: biomass",
    );
    let dataset = parse(&text).expect("undeclared mapped column still parses");

    let violations = validate(&dataset);

    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0].error_kind(),
        ErrorKind::UnresolvedColumnReference
    );
    assert!(violations[0].message.contains("biomass"));
}

#[test]
fn test_descriptor_round_trip() {
    let dataset = load_fixture();

    let reparsed = parse(&dataset.to_descriptor_string()).unwrap();
    assert_eq!(dataset, reparsed);

    let from_json = Dataset::from_json(&dataset.to_json().unwrap()).unwrap();
    assert_eq!(dataset, from_json);
}

#[test]
fn test_write_and_reload_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("copy.txt");

    let dataset = load_fixture();
    dataset.to_file(&path).unwrap();

    assert_eq!(Dataset::from_file(&path).unwrap(), dataset);
}

#[test]
fn test_missing_descriptor_file() {
    let err = Dataset::from_file("testdata/does_not_exist.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_check_anbo_data() {
    let dataset = load_fixture();
    let data_path = dataset.resolve_data_path(Path::new(DESCRIPTOR));
    assert_eq!(data_path, PathBuf::from("testdata/ANBO.csv"));

    let report =
        check_data_file(&dataset, &data_path, None, &DataCheckOptions::default()).unwrap();

    assert_eq!(report.rows, 48);
    assert_eq!(report.rows_selected, 48);
    assert!(report.violations.is_empty(), "{:?}", report.violations);
}

#[test]
fn test_check_anbo_data_with_subset() {
    let dataset = load_fixture();
    let subset = Subset::parse("year==2010; row>=2").unwrap();
    assert!(subset.validate(&dataset).is_empty());

    let report = check_data_file(
        &dataset,
        &dataset.resolve_data_path(Path::new(DESCRIPTOR)),
        Some(&subset),
        &DataCheckOptions::default(),
    )
    .unwrap();

    assert_eq!(report.rows, 48);
    assert_eq!(report.rows_selected, 24);
}

#[test]
fn test_out_of_bounds_row_is_reported() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let descriptor = temp_dir.path().join("ANBO.txt");
    std::fs::write(&descriptor, load_fixture_text()).unwrap();

    let csv = std::fs::read_to_string("testdata/ANBO.csv").unwrap();
    let tampered = format!("{csv}2010,15,7,3,GNWE,2\n");
    std::fs::write(temp_dir.path().join("ANBO.csv"), tampered).unwrap();

    let dataset = Dataset::from_file(&descriptor).unwrap();
    let report = check_data_file(
        &dataset,
        &dataset.resolve_data_path(&descriptor),
        None,
        &DataCheckOptions::default(),
    )
    .unwrap();

    assert_eq!(report.rows, 49);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::OutOfBounds);
    assert_eq!(report.violations[0].section.as_deref(), Some("row"));
}

#[test]
fn test_anbo_splits() {
    let dataset = load_fixture();

    let splits = Splits::parse("row:2; column:4; year:split").unwrap();
    assert!(splits.validate(&dataset, DEFAULT_STEP_TOLERANCE).is_empty());

    let edges = splits.edges(&dataset);
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].edges, vec![0.0, 2.0, 4.0]);
    assert_eq!(edges[1].edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

    let uneven = Splits::parse("row:3").unwrap();
    let violations = uneven.validate(&dataset, DEFAULT_STEP_TOLERANCE);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::SplitMisaligned);
}
