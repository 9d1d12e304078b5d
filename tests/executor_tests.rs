use pipette::{
    Accumulator, Document, Pipeline, PipelineError, Stage, Value,
    convert::json_to_document,
    execute,
    stage::{Condition, Expression, GroupKey, Predicate, SortKey},
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn docs(values: Vec<serde_json::Value>) -> Vec<Document> {
    values
        .into_iter()
        .map(|v| json_to_document(v).expect("test documents are objects"))
        .collect()
}

fn pipeline(stages: Vec<Stage>) -> Pipeline {
    Pipeline::from_stages(stages).unwrap()
}

fn field<'a>(doc: &'a Document, name: &str) -> Option<&'a Value> {
    doc.get(name)
}

fn names(result: &[Document]) -> Vec<&str> {
    result
        .iter()
        .map(|d| d.get("name").and_then(Value::as_str).unwrap_or("<none>"))
        .collect()
}

fn people() -> Vec<Document> {
    docs(vec![
        json!({"name": "Ann", "gender": "male", "age": 31}),
        json!({"name": "Bea", "gender": "female", "age": 27}),
        json!({"name": "Cal", "gender": "male", "age": 45}),
    ])
}

#[test]
fn test_empty_pipeline_returns_input() {
    let input = people();
    let result = execute(&input, &Pipeline::new()).unwrap();
    assert_eq!(result, input);
}

#[test]
fn test_group_gender_counts() {
    let p = pipeline(vec![
        Stage::group(GroupKey::field("gender").unwrap(), vec![("genderCount", Accumulator::count())])
            .unwrap(),
    ]);
    let result = execute(&people(), &p).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(field(&result[0], "_id"), Some(&Value::from("male")));
    assert_eq!(field(&result[0], "genderCount"), Some(&Value::Integer(2)));
    assert_eq!(field(&result[1], "_id"), Some(&Value::from("female")));
    assert_eq!(field(&result[1], "genderCount"), Some(&Value::Integer(1)));
}

#[test]
fn test_group_output_starts_with_id() {
    let p = pipeline(vec![
        Stage::group(
            GroupKey::field("gender").unwrap(),
            vec![("total", Accumulator::sum("age").unwrap()), ("n", Accumulator::count())],
        )
        .unwrap(),
    ]);
    let result = execute(&people(), &p).unwrap();
    let keys: Vec<&str> = result[0].keys().collect();
    assert_eq!(keys, vec!["_id", "total", "n"]);
}

#[test]
fn test_execution_is_repeatable() {
    let p = pipeline(vec![
        Stage::match_all(vec![Predicate::eq("gender", "male").unwrap()]).unwrap(),
        Stage::sort(vec![SortKey::desc("age").unwrap()]).unwrap(),
    ]);
    let input = people();
    let first = execute(&input, &p).unwrap();
    let second = execute(&input, &p).unwrap();
    assert_eq!(first, second);
    assert_eq!(input, people());
}

#[test]
fn test_count_on_empty_input() {
    let p = pipeline(vec![Stage::count("total").unwrap()]);
    let result = execute(&[], &p).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(field(&result[0], "total"), Some(&Value::Integer(0)));
}

#[test]
fn test_count_after_filter() {
    let p = pipeline(vec![
        Stage::match_all(vec![Predicate::eq("gender", "female").unwrap()]).unwrap(),
        Stage::count("Female Users").unwrap(),
    ]);
    let result = execute(&people(), &p).unwrap();
    assert_eq!(field(&result[0], "Female Users"), Some(&Value::Integer(1)));
}

#[test]
fn test_match_equality_on_missing_field_fails() {
    let input = docs(vec![json!({"name": "a"}), json!({"name": "b", "isActive": true})]);
    let p = pipeline(vec![Stage::match_all(vec![Predicate::eq("isActive", true).unwrap()]).unwrap()]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(names(&result), vec!["b"]);
}

#[test]
fn test_match_all_requires_every_element() {
    let input = docs(vec![
        json!({"name": "a", "tags": ["enim", "id", "velit"]}),
        json!({"name": "b", "tags": ["enim"]}),
        json!({"name": "c", "tags": "enim id"}),
        json!({"name": "d"}),
    ]);
    let p = pipeline(vec![
        Stage::match_all(vec![
            Predicate::all("tags", vec![Value::from("enim"), Value::from("id")]).unwrap(),
        ])
        .unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(names(&result), vec!["a"]);
}

#[test]
fn test_match_regex_is_anchored() {
    let input = docs(vec![
        json!({"name": "a", "company": {"phone": "+1 (940) 501-3963"}}),
        json!({"name": "b", "company": {"phone": "+44 +1 (940)"}}),
        json!({"name": "c", "company": {"phone": 19405013963_i64}}),
        json!({"name": "d"}),
    ]);
    let p = pipeline(vec![
        Stage::match_all(vec![Predicate::regex("company.phone", r"\+1 \(940\)").unwrap()]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(names(&result), vec!["a"]);
}

#[test]
fn test_match_array_index_path() {
    let input = docs(vec![
        json!({"name": "a", "tags": ["enim", "id"]}),
        json!({"name": "b", "tags": ["id", "enim"]}),
        json!({"name": "c", "tags": ["id"]}),
        json!({"name": "d", "tags": {"1": "id"}}),
    ]);
    let p = pipeline(vec![Stage::match_all(vec![Predicate::eq("tags.1", "id").unwrap()]).unwrap()]);
    assert_eq!(names(&execute(&input, &p).unwrap()), vec!["a", "d"]);

    let out_of_range = pipeline(vec![
        Stage::match_all(vec![Predicate::new("tags.5", Condition::Exists(true)).unwrap()]).unwrap(),
    ]);
    assert!(execute(&input, &out_of_range).unwrap().is_empty());
}

#[test]
fn test_match_nested_path() {
    let input = docs(vec![
        json!({"name": "a", "company": {"location": {"country": "USA"}}}),
        json!({"name": "b", "company": {"location": {"country": "Italy"}}}),
        json!({"name": "c", "company": "none"}),
    ]);
    let p = pipeline(vec![
        Stage::match_all(vec![Predicate::eq("company.location.country", "USA").unwrap()]).unwrap(),
    ]);
    assert_eq!(names(&execute(&input, &p).unwrap()), vec!["a"]);
}

#[test]
fn test_sort_is_stable() {
    let input = docs(vec![
        json!({"name": "a", "k": 2}),
        json!({"name": "b", "k": 1}),
        json!({"name": "c", "k": 2}),
        json!({"name": "d", "k": 1}),
    ]);
    let p = pipeline(vec![Stage::sort(vec![SortKey::desc("k").unwrap()]).unwrap()]);
    assert_eq!(names(&execute(&input, &p).unwrap()), vec!["a", "c", "b", "d"]);
}

#[test]
fn test_sort_multiple_keys() {
    let input = docs(vec![
        json!({"name": "a", "count": 2, "fruit": "kiwi"}),
        json!({"name": "b", "count": 3, "fruit": "pear"}),
        json!({"name": "c", "count": 2, "fruit": "apple"}),
    ]);
    let p = pipeline(vec![
        Stage::sort(vec![SortKey::desc("count").unwrap(), SortKey::asc("fruit").unwrap()]).unwrap(),
    ]);
    assert_eq!(names(&execute(&input, &p).unwrap()), vec!["b", "c", "a"]);
}

#[test]
fn test_sort_places_missing_before_null() {
    let input = docs(vec![
        json!({"name": "num", "v": 1}),
        json!({"name": "null", "v": null}),
        json!({"name": "missing"}),
        json!({"name": "str", "v": "x"}),
    ]);
    let asc = pipeline(vec![Stage::sort(vec![SortKey::asc("v").unwrap()]).unwrap()]);
    assert_eq!(names(&execute(&input, &asc).unwrap()), vec!["missing", "null", "num", "str"]);

    let desc = pipeline(vec![Stage::sort(vec![SortKey::desc("v").unwrap()]).unwrap()]);
    assert_eq!(names(&execute(&input, &desc).unwrap()), vec!["str", "num", "null", "missing"]);
}

#[test]
fn test_limit_bounds() {
    let input = people();

    let zero = pipeline(vec![Stage::limit(0)]);
    assert!(execute(&input, &zero).unwrap().is_empty());

    let negative = pipeline(vec![Stage::limit(-3)]);
    assert!(execute(&input, &negative).unwrap().is_empty());

    let large = pipeline(vec![Stage::limit(10)]);
    assert_eq!(execute(&input, &large).unwrap(), input);

    let two = pipeline(vec![Stage::limit(2)]);
    assert_eq!(names(&execute(&input, &two).unwrap()), vec!["Ann", "Bea"]);
}

#[test]
fn test_skip() {
    let input = people();
    let p = pipeline(vec![Stage::skip(1)]);
    assert_eq!(names(&execute(&input, &p).unwrap()), vec!["Bea", "Cal"]);

    let past_end = pipeline(vec![Stage::skip(99)]);
    assert!(execute(&input, &past_end).unwrap().is_empty());
}

#[test]
fn test_avg_excludes_null_by_default() {
    let input = docs(vec![json!({"v": 10}), json!({"v": 20}), json!({"v": null})]);
    let p = pipeline(vec![
        Stage::group(GroupKey::Null, vec![("avg", Accumulator::avg("v").unwrap())]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "_id"), Some(&Value::Null));
    assert_eq!(field(&result[0], "avg"), Some(&Value::Float(15.0)));
}

#[test]
fn test_avg_with_default_counts_missing() {
    let input = docs(vec![json!({"v": 10}), json!({"v": 20}), json!({})]);
    let p = pipeline(vec![
        Stage::group(GroupKey::Null, vec![("avg", Accumulator::avg_or("v", 0.0).unwrap())]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "avg"), Some(&Value::Float(10.0)));
}

#[test]
fn test_avg_of_nothing_is_null() {
    let input = docs(vec![json!({"v": "ten"}), json!({})]);
    let p = pipeline(vec![
        Stage::group(GroupKey::Null, vec![("avg", Accumulator::avg("v").unwrap())]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "avg"), Some(&Value::Null));
}

#[test]
fn test_sum_is_exact() {
    let input = docs(vec![json!({"v": 0.1}), json!({"v": 0.2})]);
    let p = pipeline(vec![
        Stage::group(GroupKey::Null, vec![("total", Accumulator::sum("v").unwrap())]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "total"), Some(&Value::Float(0.3)));
}

#[test]
fn test_sum_and_avg_beyond_decimal_range() {
    let input = docs(vec![json!({"v": 1e30}), json!({"v": 1})]);
    let p = pipeline(vec![
        Stage::group(
            GroupKey::Null,
            vec![
                ("total", Accumulator::sum("v").unwrap()),
                ("avg", Accumulator::avg("v").unwrap()),
            ],
        )
        .unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "total"), Some(&Value::Float(1e30)));
    assert_eq!(field(&result[0], "avg"), Some(&Value::Float(5e29)));
}

#[test]
fn test_sum_skips_non_numbers() {
    let input = docs(vec![json!({"v": 1}), json!({"v": "2"}), json!({"v": 3}), json!({})]);
    let p = pipeline(vec![
        Stage::group(GroupKey::Null, vec![("total", Accumulator::sum("v").unwrap())]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "total"), Some(&Value::Integer(4)));
}

#[test]
fn test_group_on_empty_input_yields_nothing() {
    let p = pipeline(vec![
        Stage::group(GroupKey::Null, vec![("n", Accumulator::count())]).unwrap(),
    ]);
    assert!(execute(&[], &p).unwrap().is_empty());
}

#[test]
fn test_group_missing_key_joins_null_group() {
    let input = docs(vec![json!({"k": null}), json!({}), json!({"k": "x"})]);
    let p = pipeline(vec![
        Stage::group(GroupKey::field("k").unwrap(), vec![("n", Accumulator::count())]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(field(&result[0], "_id"), Some(&Value::Null));
    assert_eq!(field(&result[0], "n"), Some(&Value::Integer(2)));
}

#[test]
fn test_group_integer_and_float_keys_merge() {
    let input = docs(vec![json!({"k": 1}), json!({"k": 1.0})]);
    let p = pipeline(vec![
        Stage::group(GroupKey::field("k").unwrap(), vec![("n", Accumulator::count())]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(field(&result[0], "n"), Some(&Value::Integer(2)));
}

#[test]
fn test_push_min_max_first() {
    let input = docs(vec![
        json!({"g": "a", "v": 3, "name": "x"}),
        json!({"g": "a", "v": null, "name": "y"}),
        json!({"g": "a", "name": "z"}),
        json!({"g": "a", "v": 1, "name": "w"}),
    ]);
    let p = pipeline(vec![
        Stage::group(
            GroupKey::field("g").unwrap(),
            vec![
                ("values", Accumulator::push("v").unwrap()),
                ("low", Accumulator::min("v").unwrap()),
                ("high", Accumulator::max("v").unwrap()),
                ("firstName", Accumulator::first("name").unwrap()),
            ],
        )
        .unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(
        field(&result[0], "values"),
        Some(&Value::Array(vec![Value::Integer(3), Value::Null, Value::Integer(1)]))
    );
    assert_eq!(field(&result[0], "low"), Some(&Value::Integer(1)));
    assert_eq!(field(&result[0], "high"), Some(&Value::Integer(3)));
    assert_eq!(field(&result[0], "firstName"), Some(&Value::from("x")));
}

#[test]
fn test_group_by_month() {
    let input = docs(vec![
        json!({"registered": {"$date": "2015-02-11T04:22:39+0000"}}),
        json!({"registered": {"$date": "2018-07-23T04:46:15Z"}}),
        json!({"registered": {"$date": "2014-02-28T23:59:59Z"}}),
        json!({}),
    ]);
    let p = pipeline(vec![
        Stage::group(GroupKey::month("registered").unwrap(), vec![("n", Accumulator::count())])
            .unwrap(),
        Stage::sort(vec![SortKey::asc("_id").unwrap()]).unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    let summary: Vec<(&Value, &Value)> = result
        .iter()
        .filter_map(|d| Some((d.get("_id")?, d.get("n")?)))
        .collect();
    assert_eq!(
        summary,
        vec![
            (&Value::Null, &Value::Integer(1)),
            (&Value::Integer(2), &Value::Integer(2)),
            (&Value::Integer(7), &Value::Integer(1)),
        ]
    );
}

#[test]
fn test_group_by_year() {
    let input = docs(vec![
        json!({"registered": {"$date": "2015-02-11T04:22:39+0000"}}),
        json!({"registered": {"$date": "2014-12-31T23:59:59Z"}}),
        json!({"registered": {"$date": "2015-07-01T00:00:00Z"}}),
        json!({"registered": "not a date"}),
    ]);
    let p = pipeline(vec![
        Stage::group(GroupKey::year("registered").unwrap(), vec![("n", Accumulator::count())])
            .unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    let ids: Vec<&Value> = result.iter().filter_map(|d| d.get("_id")).collect();
    assert_eq!(ids, vec![&Value::Integer(2015), &Value::Integer(2014), &Value::Null]);
    assert_eq!(field(&result[0], "n"), Some(&Value::Integer(2)));
}

#[test]
fn test_unwind_drops_missing_and_empty() {
    let input = docs(vec![
        json!({"name": "a", "tags": ["x", "y"]}),
        json!({"name": "b", "tags": []}),
        json!({"name": "c"}),
        json!({"name": "d", "tags": null}),
        json!({"name": "e", "tags": "solo"}),
    ]);
    let p = pipeline(vec![Stage::unwind("tags").unwrap()]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(names(&result), vec!["a", "a", "e"]);
    let tags: Vec<&Value> = result.iter().filter_map(|d| d.get("tags")).collect();
    assert_eq!(tags, vec![&Value::from("x"), &Value::from("y"), &Value::from("solo")]);
}

#[test]
fn test_project_keeps_listed_fields_in_order() {
    let input = docs(vec![json!({
        "_id": 7,
        "name": "a",
        "age": 30,
        "company": {"title": "ACME", "location": {"country": "USA", "address": "1 Main"}}
    })]);
    let p = pipeline(vec![Stage::project(&["company.location.country", "name", "missing"]).unwrap()]);
    let result = execute(&input, &p).unwrap();

    let keys: Vec<&str> = result[0].keys().collect();
    assert_eq!(keys, vec!["company", "name"]);
    let company = result[0].get("company").and_then(Value::as_document).unwrap();
    let location = company.get("location").and_then(Value::as_document).unwrap();
    assert_eq!(location.keys().collect::<Vec<_>>(), vec!["country"]);
}

#[test]
fn test_add_fields_size_and_copy() {
    let input = docs(vec![
        json!({"name": "a", "tags": ["x", "y", "z"]}),
        json!({"name": "b"}),
    ]);
    let p = pipeline(vec![
        Stage::add_fields(vec![
            ("numberOfTags", Expression::size("tags").unwrap()),
            ("alias", Expression::field("name").unwrap()),
            ("tags", Expression::Literal(Value::Null)),
        ])
        .unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "numberOfTags"), Some(&Value::Integer(3)));
    assert_eq!(field(&result[1], "numberOfTags"), Some(&Value::Integer(0)));
    assert_eq!(field(&result[1], "alias"), Some(&Value::from("b")));
    // existing field overwritten in place, position kept
    assert_eq!(result[0].keys().collect::<Vec<_>>(), vec!["name", "tags", "numberOfTags", "alias"]);
    assert_eq!(field(&result[0], "tags"), Some(&Value::Null));
}

#[test]
fn test_average_tag_count() {
    let input = docs(vec![
        json!({"tags": ["a", "b", "c", "d"]}),
        json!({"tags": ["a", "b"]}),
        json!({}),
    ]);
    let p = pipeline(vec![
        Stage::add_fields(vec![("numberOfTags", Expression::size("tags").unwrap())]).unwrap(),
        Stage::group(GroupKey::Null, vec![("avg", Accumulator::avg("numberOfTags").unwrap())])
            .unwrap(),
    ]);
    let result = execute(&input, &p).unwrap();
    assert_eq!(field(&result[0], "avg"), Some(&Value::Float(2.0)));
}

#[test]
fn test_invalid_stage_is_reported_before_processing() {
    // variants built by hand skip constructor validation; execute still checks them
    let p: Pipeline = vec![Stage::limit(1), Stage::Sort(vec![])].into_iter().collect();
    let err = execute(&people(), &p).unwrap_err();
    assert_eq!(err.stage_index(), Some(1));
    assert!(matches!(
        err,
        PipelineError::AtStage { ref source, .. }
            if matches!(**source, PipelineError::InvalidStage { stage: "$sort", .. })
    ));
}

#[test]
fn test_pipeline_execute_method() {
    let p = pipeline(vec![Stage::count("n").unwrap()]);
    let result = p.execute(&people()).unwrap();
    assert_eq!(field(&result[0], "n"), Some(&Value::Integer(3)));
}
