//! CLI-level integration tests for the `validate` subcommand, covering the
//! scenarios (S1-S8) exercised against the binary rather than a library call.

mod common;

use assert_cmd::Command;
use predicates::str::contains;

use common::TestWorkspace;

fn bin() -> Command {
    Command::cargo_bin("csvw-validate").expect("binary exists")
}

#[test]
fn s1_missing_header_reports_empty_column_name_and_invalid_header() {
    let ws = TestWorkspace::new();
    ws.write("data.csv", "Name,,City\nAda,30,London\n");
    ws.write(
        "metadata.json",
        r#"{
                "tables": [{"url": "data.csv", "tableSchema": {
                    "columns": [
                        {"name": "Name", "datatype": "string"},
                        {"name": "Age", "datatype": "integer"},
                        {"name": "City", "datatype": "string"}
                    ]
                }}]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--output",
            "json",
        ])
        .assert()
        .failure()
        .stdout(contains("\"Empty column name\""))
        .stdout(contains("\"Invalid Header\""));
}

#[test]
fn s2_duplicate_header_is_a_warning() {
    let ws = TestWorkspace::new();
    ws.write("data.csv", "Name,Age,Age\nAda,30,31\n");
    ws.write(
        "metadata.json",
        r#"{
                "tables": [{"url": "data.csv", "tableSchema": {
                    "columns": [
                        {"name": "Name", "datatype": "string"},
                        {"name": "Age", "datatype": "integer"}
                    ]
                }}]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--output",
            "json",
        ])
        .assert()
        .success()
        .stdout(contains("\"Duplicate column name\""));
}

#[test]
fn s3_pk_datetime_utc_equality_produces_no_errors() {
    let ws = TestWorkspace::new();
    ws.write(
        "data.csv",
        "id,seen_at\n1,2004-04-12T20:20:00+02:00\n2,2004-04-12T18:20:00Z\n",
    );
    ws.write(
        "metadata.json",
        r#"{
                "tables": [{"url": "data.csv", "tableSchema": {
                    "columns": [
                        {"name": "id", "datatype": "string"},
                        {"name": "seen_at", "datatype": "dateTime"}
                    ],
                    "primaryKey": "seen_at"
                }}]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
        ])
        .assert()
        .success();
}

#[test]
fn s4_pk_datetime_violation_is_a_duplicate_key() {
    let ws = TestWorkspace::new();
    ws.write(
        "data.csv",
        "id,seen_at\n1,2004-04-12T20:20:00+02:00\n2,2004-04-12T20:20:00+02:00\n",
    );
    ws.write(
        "metadata.json",
        r#"{
                "tables": [{"url": "data.csv", "tableSchema": {
                    "columns": [
                        {"name": "id", "datatype": "string"},
                        {"name": "seen_at", "datatype": "dateTime"}
                    ],
                    "primaryKey": "seen_at"
                }}]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--output",
            "json",
        ])
        .assert()
        .failure()
        .stdout(contains("duplicate_key"));
}

#[test]
fn s5_unmatched_foreign_key_reference_is_reported_on_the_child_row() {
    let ws = TestWorkspace::new();
    ws.write("parent.csv", "id\nP1\nP2\n");
    ws.write("child.csv", "id,parent_id\nC1,P1\nC2,P1\nC3,P9\n");
    ws.write(
        "metadata.json",
        r#"{
                "tables": [
                    {"url": "parent.csv", "tableSchema": {
                        "columns": [{"name": "id", "datatype": "string"}],
                        "primaryKey": "id"
                    }},
                    {"url": "child.csv", "tableSchema": {
                        "columns": [
                            {"name": "id", "datatype": "string"},
                            {"name": "parent_id", "datatype": "string"}
                        ],
                        "foreignKeys": [{
                            "columnReference": "parent_id",
                            "reference": {"resource": "parent.csv", "columnReference": "id"}
                        }]
                    }}
                ]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--output",
            "json",
        ])
        .assert()
        .failure()
        .stdout(contains("unmatched_foreign_key_reference"))
        .stdout(contains("\"row\": \"4\""));
}

#[test]
fn s6_multiple_matched_rows_is_reported_on_the_child_row() {
    let ws = TestWorkspace::new();
    ws.write("parent.csv", "id,code\nP1,A\nP1,B\n");
    ws.write(
        "child.csv",
        "id,parent_id\nC1,X\nC2,X\nC3,X\nC4,X\nC5,P1\n",
    );
    ws.write(
        "metadata.json",
        r#"{
                "tables": [
                    {"url": "parent.csv", "tableSchema": {
                        "columns": [
                            {"name": "id", "datatype": "string"},
                            {"name": "code", "datatype": "string"}
                        ]
                    }},
                    {"url": "child.csv", "tableSchema": {
                        "columns": [
                            {"name": "id", "datatype": "string"},
                            {"name": "parent_id", "datatype": "string"}
                        ],
                        "foreignKeys": [{
                            "columnReference": "parent_id",
                            "reference": {"resource": "parent.csv", "columnReference": "id"}
                        }]
                    }}
                ]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--output",
            "json",
        ])
        .assert()
        .failure()
        .stdout(contains("multiple_matched_rows"))
        .stdout(contains("\"row\": \"6\""));
}

#[test]
fn s7_foreign_key_over_list_column_is_a_metadata_error() {
    let ws = TestWorkspace::new();
    ws.write("parent.csv", "id\nP1\n");
    ws.write("child.csv", "id,tags\nC1,P1|P2\n");
    ws.write(
        "metadata.json",
        r#"{
                "tables": [
                    {"url": "parent.csv", "tableSchema": {
                        "columns": [{"name": "id", "datatype": "string"}]
                    }},
                    {"url": "child.csv", "tableSchema": {
                        "columns": [
                            {"name": "id", "datatype": "string"},
                            {"name": "tags", "datatype": "string", "separator": "|"}
                        ],
                        "foreignKeys": [{
                            "columnReference": "tags",
                            "reference": {"resource": "parent.csv", "columnReference": "id"}
                        }]
                    }}
                ]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--output",
            "json",
        ])
        .assert()
        .failure()
        .stdout(contains("foreign key references list column"));
}

#[test]
fn s8_empty_child_and_parent_tables_produce_nothing() {
    let ws = TestWorkspace::new();
    ws.write("parent.csv", "id\n");
    ws.write("child.csv", "id,parent_id\n");
    ws.write(
        "metadata.json",
        r#"{
                "tables": [
                    {"url": "parent.csv", "tableSchema": {
                        "columns": [{"name": "id", "datatype": "string"}],
                        "primaryKey": "id"
                    }},
                    {"url": "child.csv", "tableSchema": {
                        "columns": [
                            {"name": "id", "datatype": "string"},
                            {"name": "parent_id", "datatype": "string"}
                        ],
                        "foreignKeys": [{
                            "columnReference": "parent_id",
                            "reference": {"resource": "parent.csv", "columnReference": "id"}
                        }]
                    }}
                ]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("No warnings or errors"));
}

#[test]
fn missing_csv_file_is_reported_as_file_not_found() {
    let ws = TestWorkspace::new();
    ws.write(
        "metadata.json",
        r#"{
                "tables": [{"url": "missing.csv", "tableSchema": {
                    "columns": [{"name": "id", "datatype": "string"}]
                }}]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--output",
            "json",
        ])
        .assert()
        .failure()
        .stdout(contains("file_not_found"));
}

#[test]
fn csv_override_redirects_the_table_url() {
    let ws = TestWorkspace::new();
    ws.write("actual.csv", "id\n1\n");
    ws.write(
        "metadata.json",
        r#"{
                "tables": [{"url": "declared.csv", "tableSchema": {
                    "columns": [{"name": "id", "datatype": "string"}]
                }}]
            }"#,
    );

    bin()
        .args([
            "validate",
            "--schema",
            ws.path().join("metadata.json").to_str().unwrap(),
            "--csv",
            ws.path().join("actual.csv").to_str().unwrap(),
        ])
        .assert()
        .success();
}
