#![cfg(feature = "cli")]

use std::{fs, path::PathBuf};

use pipette::{
    Value,
    cli::{CliError, RunOptions, execute_check, execute_run, get_doc_category, load_pipeline},
};
use pretty_assertions::assert_eq;

const USERS: &str = r#"[
    {"name": "Ann", "gender": "male", "isActive": true, "age": 31},
    {"name": "Bea", "gender": "female", "isActive": false, "age": 27},
    {"name": "Cal", "gender": "male", "isActive": true}
]"#;

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pipette-cli-tests-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn run(pipeline: &str, input: &str) -> Result<Vec<pipette::Document>, CliError> {
    execute_run(&RunOptions {
        pipeline: pipeline.to_string(),
        input: Some(input.to_string()),
    })
}

#[test]
fn test_run_inline_pipeline() {
    let result = run(
        r#"[{"$group": {"_id": "$gender", "genderCount": {"$sum": 1}}}]"#,
        USERS,
    )
    .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(
        pipette::to_json(&Value::Object(result[0].clone())),
        r#"{"_id":"male","genderCount":2}"#
    );
}

#[test]
fn test_run_json_lines_input() {
    let input = "{\"age\": 10}\n{\"age\": 20}\n{\"age\": null}\n";
    let result = run(
        r#"[{"$group": {"_id": null, "avg": {"$avg": "$age"}}}]"#,
        input,
    )
    .unwrap();
    assert_eq!(result[0].get("avg"), Some(&Value::Float(15.0)));
}

#[test]
fn test_run_without_input() {
    let err = execute_run(&RunOptions {
        pipeline: "[]".to_string(),
        input: None,
    })
    .unwrap_err();
    assert!(matches!(err, CliError::NoInput));
}

#[test]
fn test_invalid_pipeline_is_reported_before_input() {
    // the input is not even valid JSON; the pipeline error wins
    let err = run(r#"[{"$limit": "x"}]"#, "not json").unwrap_err();
    assert!(matches!(err, CliError::Pipeline(_)));
}

#[test]
fn test_rejects_non_object_input() {
    let err = run("[]", r#"[{"a": 1}, "two"]"#).unwrap_err();
    assert!(matches!(err, CliError::NotADocument(1)));
}

#[test]
fn test_pipeline_from_yaml_file() {
    let path = scratch_file(
        "active.yaml",
        "- $match:\n    isActive: true\n- $count: active\n",
    );
    let result = run(path.to_str().unwrap(), USERS).unwrap();
    assert_eq!(result[0].get("active"), Some(&Value::Integer(2)));
}

#[test]
fn test_pipeline_from_json_file() {
    let path = scratch_file("sorted.json", r#"[{"$sort": {"age": -1}}, {"$limit": 1}]"#);
    let pipeline = load_pipeline(path.to_str().unwrap()).unwrap();
    assert_eq!(pipeline.len(), 2);
}

#[test]
fn test_check_lists_stages() {
    let checked =
        execute_check(r#"[{"$match": {"isActive": true}}, {"$set": {"x": 1}}, {"$count": "n"}]"#)
            .unwrap();
    assert_eq!(checked.stages, vec!["$match", "$addFields", "$count"]);
}

#[test]
fn test_check_reports_position() {
    let err = execute_check(r#"[{"$match": {}}, {"$sort": {"age": 0}}]"#).unwrap_err();
    let CliError::Pipeline(inner) = &err else {
        panic!("expected a pipeline error, got {err:?}");
    };
    assert_eq!(inner.stage_index(), Some(1));
    assert!(err.to_string().starts_with("invalid pipeline: stage 1:"));
}

#[test]
fn test_doc_categories() {
    assert!(get_doc_category("group").unwrap().contains("$avg"));
    assert!(get_doc_category("$unwind").unwrap().starts_with("RESHAPE"));
    assert!(matches!(get_doc_category("nope"), Err(CliError::UnknownCategory(_))));
}
