mod common;

use common::{temp_file, values, wide_cases};
use tidyrs::io::CsvOptions;
use tidyrs::pipeline::{run_pipeline, Definition, Pipeline, PipelineSpec, Step};
use tidyrs::prelude::*;

const CASES_CSV: &str = "country,2010,2015\nUS,7000,3000\nCA,6500,4500\nDE,5000,6000\n";

const TOTALS_YAML: &str = r#"
name: totals-by-year
steps:
  - op: gather
    key: year
    value: n
    columns: ["2010", "2015"]
  - op: group_by
    columns: [year]
  - op: summarise
    columns:
      - name: total
        expr: sum(n, na_rm = TRUE)
  - op: arrange
    by: ["-total"]
"#;

fn totals_spec() -> PipelineSpec {
    PipelineSpec::new("totals-by-year")
        .step(Step::Gather {
            key: "year".into(),
            value: "n".into(),
            columns: vec!["2010".into(), "2015".into()],
        })
        .step(Step::GroupBy {
            columns: vec!["year".into()],
        })
        .step(Step::Summarize {
            columns: vec![Definition::new("total", "sum(n, na_rm = TRUE)")],
        })
        .step(Step::Arrange {
            by: vec!["-total".into()],
        })
}

#[test]
fn test_pipeline_runs_steps_in_order() {
    let _ = env_logger::try_init();
    let pipeline = Pipeline::new(totals_spec()).unwrap();
    let (result, report) = pipeline.run(&wide_cases()).unwrap();

    assert_eq!(values(&result, "year"), vec![DataValue::from("2010"), DataValue::from("2015")]);
    assert_eq!(
        values(&result, "total"),
        vec![DataValue::Int64(18500), DataValue::Int64(13500)]
    );

    assert_eq!(report.rows_before, 3);
    assert_eq!(report.columns_before, 3);
    assert_eq!(report.rows_after, 2);
    assert_eq!(report.columns_after, 2);
    assert_eq!(report.steps_applied, 4);
    assert!(report.warnings.is_empty());
    assert!(report.summary().contains("4 steps"));
}

#[test]
fn test_yaml_spec_matches_builder() {
    let spec = PipelineSpec::from_yaml(TOTALS_YAML).unwrap();
    assert_eq!(spec.steps, totals_spec().steps);
    assert_eq!(spec.version, tidyrs::pipeline::SPEC_VERSION);
}

#[test]
fn test_json_round_trip() {
    let spec = totals_spec();
    let json = spec.to_json().unwrap();
    assert!(json.contains(r#""op": "group_by""#));

    let parsed = PipelineSpec::from_json(&json).unwrap();
    assert_eq!(parsed.name, spec.name);
    assert_eq!(parsed.steps, spec.steps);
}

#[test]
fn test_toml_spec() {
    let text = r#"
name = "recent"

[[steps]]
op = "filter"
predicate = "`2015` > 4000"

[[steps]]
op = "mutate"
columns = [{ name = "growth", expr = "`2015` - `2010`" }]

[[steps]]
op = "select"
columns = ["country", "growth"]
"#;
    let spec = PipelineSpec::from_toml(text).unwrap();
    let (result, _) = Pipeline::new(spec).unwrap().run(&wide_cases()).unwrap();

    assert_eq!(result.column_names(), &["country", "growth"]);
    assert_eq!(
        values(&result, "growth"),
        vec![DataValue::Int64(-2000), DataValue::Int64(1000)]
    );
}

#[test]
fn test_invalid_expression_rejected_before_running() {
    let spec = PipelineSpec::new("broken").step(Step::Filter {
        predicate: "n >".into(),
    });
    assert!(matches!(Pipeline::new(spec), Err(Error::Parse { .. })));
}

#[test]
fn test_failing_step_stops_pipeline() {
    let spec = PipelineSpec::new("ambiguous").step(Step::Summarize {
        columns: vec![Definition::new("total", "sum(`2010`)")],
    });
    let pipeline = Pipeline::new(spec).unwrap();
    let result = pipeline.run(&wide_cases());
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));
}

#[test]
fn test_empty_result_is_reported() {
    let spec = PipelineSpec::new("nothing").step(Step::Filter {
        predicate: "`2010` > 100000".into(),
    });
    let (result, report) = Pipeline::new(spec).unwrap().run(&wide_cases()).unwrap();
    assert!(result.is_empty());
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn test_spec_from_file_by_extension() {
    let (_dir, path) = temp_file("totals.yml", TOTALS_YAML);
    let spec = PipelineSpec::from_file(&path).unwrap();
    assert_eq!(spec.name, "totals-by-year");

    let (_dir, path) = temp_file("totals.txt", TOTALS_YAML);
    assert!(matches!(
        PipelineSpec::from_file(&path),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_run_pipeline_reads_and_writes_csv() {
    let (dir, input) = temp_file("cases.csv", CASES_CSV);
    let output = dir.path().join("totals.csv");

    let (result, report) =
        run_pipeline(&totals_spec(), &input, Some(&output), &CsvOptions::default()).unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(report.rows_before, 3);

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        written.lines().collect::<Vec<_>>(),
        vec!["year,total", "2010,18500", "2015,13500"]
    );
}

#[test]
fn test_more_steps() {
    let yaml = r#"
name: misc
steps:
  - op: rename
    mapping: { country: nation }
  - op: count
    columns: [nation]
  - op: head
    length: 2
"#;
    let spec = PipelineSpec::from_yaml(yaml).unwrap();
    let (result, _) = Pipeline::new(spec).unwrap().run(&wide_cases()).unwrap();

    assert_eq!(result.column_names(), &["nation", "n"]);
    assert_eq!(values(&result, "nation"), vec![DataValue::from("CA"), DataValue::from("DE")]);
}
