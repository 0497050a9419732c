use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_dash-filters")
}

const DASHBOARD: &str = r#"{
    "name": "sales",
    "widgets": [{"name": "map"}, {"name": "chart"}],
    "filters": [
        {
            "label": "Region",
            "targetProperty": "[Region]",
            "target": "*",
            "source": "*",
            "valueList": "&[e],&[w]",
            "displayList": "East,West",
            "value": "&[w]"
        },
        {
            "label": "Year /* inverseOrder */",
            "targetProperty": "[Year]",
            "target": "*",
            "source": "",
            "valueList": "&[2020],&[2021]",
            "displayList": "2020,2021"
        },
        {
            "label": "Product",
            "targetProperty": "[Product]",
            "target": "chart",
            "source": "map",
            "valueList": "&[b],&[c]",
            "displayList": "Bikes,Cars"
        }
    ]
}"#;

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .env_remove("DASH_FILTERS_CONFIG")
        .env_remove("RUST_LOG")
        .args(["--color", "never"])
        .args(args)
        .output()
        .expect("command should run")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_compile_json() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);

    let json = stdout_json(&run(&["-f", "json", "compile", file.to_str().unwrap()]));
    assert_eq!(json["dashboard"], "sales");
    assert_eq!(json["toolbarFiltersExist"], true);
    assert_eq!(json["filters"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["filters"][0]["valueDisplay"], "West");
    assert_eq!(json["filters"][1]["label"], "Year");
    assert_eq!(json["filters"][1]["values"][0]["path"], "&[2021]");
}

#[test]
fn test_compile_text_table() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);

    let output = run(&["compile", file.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[Region]"));
    assert!(stdout.contains("West"));
}

#[test]
fn test_encode_and_share_url() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);
    let file = file.to_str().unwrap();

    let output = run(&["encode", file]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "TARGET:*;FILTER:%5BRegion%5D.%26%5Bw%5D"
    );

    let output = run(&["encode", file, "--widget", "chart", "--ignore-target-all"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "TARGET:chart;FILTER:");

    let output = run(&["share-url", file, "--url", "http://h/#/d?FILTERS=TARGET:*;FILTER:x"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "http://h/#/d?FILTERS=TARGET:*;FILTER:%5BRegion%5D.%26%5Bw%5D"
    );
}

#[test]
fn test_decode_from_url() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);

    let url = "http://h/#/d?FILTERS=TARGET:*;FILTER:%5BRegion%5D.%25NOT%20%26%5Be%5D~%5BProduct%5D.%7B%26%5Bb%5D%2C%26%5Bc%5D%7D";
    let json = stdout_json(&run(&[
        "-f",
        "json",
        "decode",
        file.to_str().unwrap(),
        "--url",
        url,
    ]));

    assert_eq!(json["filters"][0]["value"], "&[e]");
    assert_eq!(json["filters"][0]["isExclude"], true);
    assert_eq!(json["filters"][2]["value"], "&[b]|&[c]");
    assert_eq!(json["filters"][2]["valueDisplay"], "b,c");
}

#[test]
fn test_decode_url_without_parameter_fails() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);

    let output = run(&["decode", file.to_str().unwrap(), "--url", "http://h/p?x=1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("has no FILTERS parameter"));
}

#[test]
fn test_widget_report_json() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);

    let json = stdout_json(&run(&["-f", "json", "widget", file.to_str().unwrap(), "chart"]));
    assert_eq!(
        json["affectedBy"],
        serde_json::json!(["[Region]", "[Year]", "[Product]"])
    );
    assert_eq!(json["displays"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["clickTarget"], Value::Null);
}

#[test]
fn test_apply_reports_notified_channels() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);

    let json = stdout_json(&run(&[
        "-f",
        "json",
        "apply",
        file.to_str().unwrap(),
        "-p",
        "[Product]",
        "-s",
        "&[c]",
    ]));
    assert_eq!(json["filter"]["value"], "&[c]");
    assert_eq!(
        json["notified"],
        serde_json::json!(["filterchart", "filteremptyWidget", "updateFilterTextmap"])
    );
    assert_eq!(json["hostMessages"], serde_json::json!([]));

    let json = stdout_json(&run(&[
        "-f",
        "json",
        "apply",
        file.to_str().unwrap(),
        "-p",
        "[Product]",
        "-s",
        "&[c]",
        "--quiet-widgets",
    ]));
    assert_eq!(json["notified"], serde_json::json!([]));
}

#[test]
fn test_apply_embedded_posts_host_message() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    let config = dir.path().join("dash.toml");
    write_file(&file, DASHBOARD);
    write_file(&config, "[embedding]\nembedded = true\nwidget_index = \"1\"\n");

    let json = stdout_json(&run(&[
        "-c",
        config.to_str().unwrap(),
        "-f",
        "json",
        "apply",
        file.to_str().unwrap(),
        "-p",
        "[Product]",
        "-s",
        "&[b]",
    ]));
    assert_eq!(json["hostMessages"][0]["type"], "filter");
    assert_eq!(json["hostMessages"][0]["index"], "1");
    assert_eq!(json["hostMessages"][0]["widget"]["name"], "chart");
    assert_eq!(
        json["hostMessages"][0]["filters"],
        "TARGET:*;FILTER:%5BProduct%5D.%26%5Bb%5D"
    );
}

#[test]
fn test_apply_persists_to_settings_file() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    let config = dir.path().join("dash.toml");
    let settings = dir.path().join("settings.json");
    write_file(&file, DASHBOARD);
    write_file(
        &config,
        &format!(
            "[persistence]\nsave_filters = true\nsettings_file = {:?}\n",
            settings.to_str().unwrap()
        ),
    );

    let output = run(&[
        "-c",
        config.to_str().unwrap(),
        "apply",
        file.to_str().unwrap(),
        "-p",
        "[Year]",
        "-s",
        "&[2020]",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let doc: Value =
        serde_json::from_str(&fs::read_to_string(&settings).expect("settings written"))
            .expect("valid json");
    let saved = &doc["dashboards"]["sales"]["_filters"];
    assert_eq!(saved.as_array().map(Vec::len), Some(2));
    assert_eq!(saved[1]["targetProperty"], "[Year]");
    assert_eq!(saved[1]["value"], "&[2020]");
}

#[test]
fn test_apply_unknown_property_fails() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("dash.json");
    write_file(&file, DASHBOARD);

    let output = run(&["apply", file.to_str().unwrap(), "-p", "[Color]"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no filter on '[Color]'"));
}
