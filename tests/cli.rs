mod common;

use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

use common::{TestWorkspace, fixture_path};

fn bin() -> Command {
    Command::cargo_bin("report-card-ingest").expect("binary exists")
}

fn path_arg(path: &std::path::Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn create_schema_writes_one_table_per_section() {
    let workspace = TestWorkspace::new();
    let sql = workspace.path().join("schema.sql");
    let layout = fixture_path("assessment_layout_2015.csv");

    bin()
        .args([
            "create-schema",
            "--year",
            "2015",
            "--layout",
            path_arg(&layout),
            "--sql",
            path_arg(&sql),
        ])
        .assert()
        .success();

    let script = fs::read_to_string(&sql).expect("read schema script");
    assert_eq!(script.matches("CREATE TABLE IF NOT EXISTS").count(), 3);
    assert!(script.contains(
        "CREATE TABLE IF NOT EXISTS assessment_2015_schools (\n    school_id VARCHAR,\n    school_name VARCHAR,\n    district_name VARCHAR,\n    grades_in_school VARCHAR,\n    PRIMARY KEY (school_id)\n);"
    ));
    assert!(script.contains("assessment_2015_overall_achievement_parcc_dlm_performance"));
    assert!(script.contains("    total_school_enrollment_in_ela_grade_3_8_hs_all INTEGER,"));
    assert!(script.contains("    pct_not_taking_ela_tests_school_all DOUBLE PRECISION,"));
}

#[test]
fn create_schema_rejects_unknown_year() {
    let layout = fixture_path("assessment_layout_2015.csv");
    bin()
        .args(["create-schema", "--year", "2016", "--layout", path_arg(&layout)])
        .assert()
        .failure()
        .stderr(contains("no release definition found for 2016"));
}

#[test]
fn load_emits_ddl_flush_and_inserts_to_stdout() {
    let layout = fixture_path("assessment_layout_2015.csv");
    let data = fixture_path("rc15_assessment_sample.txt");

    let output = bin()
        .args([
            "load",
            "--year",
            "2015",
            "--layout",
            path_arg(&layout),
            "--data",
            path_arg(&data),
            "--create",
            "--flush",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let script = String::from_utf8(output).expect("utf-8 output");

    assert!(script.contains("DELETE FROM assessment_2015_participation;"));
    assert!(script.contains(
        "INSERT INTO assessment_2015_schools (school_id, school_name, district_name, grades_in_school) VALUES\n    ('150162990250001', 'LINCOLN ELEM SCHOOL', 'CITY OF CHICAGO SD 299', 'K8'),\n    ('150162990250002', 'O''KEEFE ELEM SCHOOL', 'CITY OF CHICAGO SD 299', 'K8');"
    ));
    assert!(script.contains("    ('150162990250001', 1204, 3.5),"));
    assert!(script.contains("    ('150162990250002', 311, NULL);"));
    assert!(script.contains("    ('150162990250002', NULL, 25.1, 12.0, 20.4);"));
}

#[test]
fn load_reports_bad_values() {
    let workspace = TestWorkspace::new();
    let layout = fixture_path("assessment_layout_2015.csv");
    let data = workspace.write(
        "bad.txt",
        "150162990250001;LINCOLN;CHICAGO;K8;45.5;25.1;38.2;20.4;many;3.5\n",
    );
    bin()
        .args([
            "load",
            "--year",
            "2015",
            "--layout",
            path_arg(&layout),
            "--data",
            path_arg(&data),
        ])
        .assert()
        .failure()
        .stderr(contains("error: Loading"));
}

#[test]
fn load_participation_masks_small_counts() {
    let workspace = TestWorkspace::new();
    let sql = workspace.path().join("participation.sql");
    let data = fixture_path("participation_2015.csv");

    bin()
        .args([
            "load-participation",
            "--year",
            "2015",
            "--data",
            path_arg(&data),
            "--create",
            "--sql",
            path_arg(&sql),
        ])
        .assert()
        .success();

    let script = workspace.read("participation.sql");
    assert!(script.contains("CREATE TABLE IF NOT EXISTS parcc_participation_2015 ("));
    assert!(script.contains("    tested_enrollment_masked_ela BOOLEAN,"));
    assert!(script.contains(
        "    ('150162990250001', 'Cook', '299', 'LINCOLN ELEM SCHOOL', 'Chicago', NULL, TRUE, 8, 0, 1, 0, 0, 42, FALSE, 40, 1, 1, 0, 0),"
    ));
    assert!(script.contains(
        "    ('010010010260001', 'Adams', '001', 'PAYSON ELEM SCHOOL', 'Payson', 55, FALSE, 54, 1, 0, 0, 0, 57, FALSE, 55, 1, 1, NULL, 0);"
    ));
    assert!(!script.contains("Source"));
}

#[test]
fn describe_prints_yaml_schema() {
    let layout = fixture_path("report_card_layout_2015.csv");
    bin()
        .args([
            "describe",
            "--year",
            "2015",
            "--layout",
            path_arg(&layout),
            "--kind",
            "report-card",
            "--format",
            "yaml",
        ])
        .assert()
        .success()
        .stdout(contains("name: report_card_2015"))
        .stdout(contains("name: avg_class_size_grade_3"))
        .stdout(contains("primary_key: true"));
}

#[test]
fn describe_prints_table_by_default() {
    let layout = fixture_path("assessment_layout_2015.csv");
    bin()
        .args(["describe", "--year", "2015", "--layout", path_arg(&layout)])
        .assert()
        .success()
        .stdout(contains("table"))
        .stdout(contains("assessment_2015_participation"))
        .stdout(contains("school_pct_proficiency_in_math_parcc_2015_math"));
}

#[test]
fn summary_sql_supports_filter() {
    bin()
        .args(["summary-sql", "--year", "2015", "--filtered"])
        .assert()
        .success()
        .stdout(contains("FROM assessment_2015_schools s"))
        .stdout(contains("WHERE s.school_id = ANY(:rcdts_ids)"));
}

#[test]
fn best_worst_sql_orders_by_passing_rate() {
    bin()
        .args([
            "best-worst-sql",
            "--year",
            "2015",
            "--subject",
            "ela",
            "--order",
            "asc",
            "--limit",
            "10",
            "--chicago-area",
        ])
        .assert()
        .success()
        .stdout(contains("-- :counties = Cook, Dupage, Will, Lake, McHenry, Kane\n"))
        .stdout(contains("AND ps.county = ANY(:counties)"))
        .stdout(contains("ORDER BY passing ASC\nLIMIT 10;"));
}

#[test]
fn print_tables_writes_one_file_per_paper() {
    let workspace = TestWorkspace::new();
    let summary = fixture_path("summary_results.csv");
    let papermap = fixture_path("papermap.csv");

    bin()
        .args([
            "print-tables",
            "--summary",
            path_arg(&summary),
            "--papermap",
            path_arg(&papermap),
            "--paper-column",
            "Papers",
            "--rcdts-column",
            "RCDTS",
            "--output-dir",
            path_arg(workspace.path()),
        ])
        .assert()
        .success();

    let trib = workspace.read("print_tables__TRIB.csv");
    let lines: Vec<&str> = trib.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("paper,school_name,district_name,"));
    assert_eq!(
        lines[1],
        "TRIB,LINCOLN ELEM SCHOOL,CITY OF CHICAGO SD 299,45.5,,,38.2,,,25.1,,,20.4,,"
    );
    assert_eq!(lines[2], "TRIB,,CITY OF CHICAGO SD 299,,,,,,,25.1,,,20.4,,");

    let sun = workspace.read("print_tables__SUN.csv");
    assert_eq!(sun.lines().count(), 2);
    assert!(!workspace.path().join("print_tables__.csv").exists());
}

#[test]
fn print_tables_requires_known_columns() {
    let workspace = TestWorkspace::new();
    bin()
        .args([
            "print-tables",
            "--summary",
            path_arg(&fixture_path("summary_results.csv")),
            "--papermap",
            path_arg(&fixture_path("papermap.csv")),
            "--paper-column",
            "Edition",
            "--rcdts-column",
            "RCDTS",
            "--output-dir",
            path_arg(workspace.path()),
        ])
        .assert()
        .failure()
        .stderr(contains("error: Reading paper map"));
}
