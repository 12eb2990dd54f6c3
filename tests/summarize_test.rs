mod common;

use common::{measurements, values, wide_cases};
use tidyrs::prelude::*;

fn approx(value: &DataValue, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[test]
fn test_summarize_ungrouped_yields_one_row() {
    let _ = env_logger::try_init();
    let result = measurements()
        .summarize(&[
            ("total_rain", sum(col("rain")).exclude_missing()),
            ("rows", n()),
        ])
        .unwrap();

    assert_eq!(result.row_count(), 1);
    assert_eq!(result.column_names(), &["total_rain", "rows"]);
    assert_eq!(result.value(0, "total_rain").unwrap(), DataValue::Int64(16));
    assert_eq!(result.value(0, "rows").unwrap(), DataValue::Int64(5));
}

#[test]
fn test_summarize_grouped_orders_groups_by_key() {
    let result = measurements()
        .group_by(&["site"])
        .unwrap()
        .summarize(&[
            ("mean_temp", mean(col("temp")).exclude_missing()),
            ("visits", n()),
        ])
        .unwrap();

    assert_eq!(result.column_names(), &["site", "mean_temp", "visits"]);
    assert_eq!(values(&result, "site"), vec![DataValue::from("a"), DataValue::from("b")]);
    let means = values(&result, "mean_temp");
    assert!(approx(&means[0], 34.0 / 3.0));
    assert!(approx(&means[1], 8.0));
    assert_eq!(
        values(&result, "visits"),
        vec![DataValue::Int64(3), DataValue::Int64(2)]
    );
    assert!(!result.is_grouped());
}

#[test]
fn test_summarize_include_missing_propagates() {
    let result = measurements()
        .group_by(&["site"])
        .unwrap()
        .summarize(&[("total_rain", sum(col("rain")).include_missing())])
        .unwrap();

    assert_eq!(
        values(&result, "total_rain"),
        vec![DataValue::Na, DataValue::Int64(12)]
    );
    assert_eq!(result.column_type("total_rain").unwrap(), ColumnType::Int64);
}

#[test]
fn test_summarize_requires_missing_policy() {
    let df = measurements();
    let result = df.summarize(&[("total_rain", sum(col("rain")))]);
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));

    // The check happens before any group is looked at
    let empty = df.filter(&col("year").gt(3000)).unwrap();
    let result = empty.summarize(&[("total_rain", sum(col("rain")))]);
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));

    // Aggregates nested inside another aggregate's input are checked too
    let nested = AggExpr::parse("sum(temp - mean(temp), na_rm = TRUE)").unwrap();
    let result = empty.group_by(&["site"]).unwrap().summarize(&[("spread", nested)]);
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));
}

#[test]
fn test_summarize_empty_input_needs_default() {
    let empty = measurements().filter(&col("year").gt(3000)).unwrap();

    let result = empty.summarize(&[("mean_temp", mean(col("temp")).exclude_missing())]);
    assert!(matches!(result, Err(Error::EmptyGroupResult(_))));

    let defaulted = empty
        .summarize(&[(
            "mean_temp",
            mean(col("temp")).exclude_missing().or_default(0.0),
        )])
        .unwrap();
    assert_eq!(defaulted.value(0, "mean_temp").unwrap(), DataValue::Float64(0.0));

    let counted = empty.summarize(&[("rows", n())]).unwrap();
    assert_eq!(counted.value(0, "rows").unwrap(), DataValue::Int64(0));
}

#[test]
fn test_summarize_peels_one_grouping_level() {
    let by_site_year = measurements().group_by(&["site", "year"]).unwrap();
    let counted = by_site_year.summarize(&[("visits", n())]).unwrap();

    assert_eq!(counted.row_count(), 5);
    assert_eq!(counted.group_keys(), &["site"]);

    let per_site = counted
        .summarize(&[("visits", sum(col("visits")).exclude_missing())])
        .unwrap();
    assert_eq!(
        values(&per_site, "visits"),
        vec![DataValue::Int64(3), DataValue::Int64(2)]
    );
    assert!(per_site.group_keys().is_empty());
}

#[test]
fn test_summarize_spread_of_single_value_is_missing() {
    let result = measurements()
        .group_by(&["site"])
        .unwrap()
        .summarize(&[("sd_temp", sd(col("temp")).exclude_missing())])
        .unwrap();

    let spread = values(&result, "sd_temp");
    assert!(approx(&spread[0], (7.0f64 / 12.0).sqrt()));
    assert!(spread[1].is_na());
}

#[test]
fn test_summarize_rejects_duplicate_names() {
    let result = measurements()
        .group_by(&["site"])
        .unwrap()
        .summarize(&[("site", n())]);
    assert!(matches!(result, Err(Error::DuplicateColumnName(_))));
}

#[test]
fn test_summarize_min_max_keep_type() {
    let result = wide_cases()
        .summarize(&[
            ("low", min(col("2010")).exclude_missing()),
            ("high", max(col("2015")).exclude_missing()),
            ("countries", count_distinct(col("country")).exclude_missing()),
        ])
        .unwrap();

    assert_eq!(result.value(0, "low").unwrap(), DataValue::Int64(5000));
    assert_eq!(result.value(0, "high").unwrap(), DataValue::Int64(6000));
    assert_eq!(result.value(0, "countries").unwrap(), DataValue::Int64(3));
}

#[test]
fn test_count_groups_missing_keys_last() {
    let counted = measurements().count(&["temp"]).unwrap();

    assert_eq!(counted.column_names(), &["temp", "n"]);
    let temps = values(&counted, "temp");
    assert_eq!(temps.len(), 5);
    assert_eq!(temps[0], DataValue::Float64(8.0));
    assert!(temps[4].is_na());
}

#[test]
fn test_count_keeps_existing_grouping() {
    let grouped = measurements().group_by(&["site"]).unwrap();
    let counted = grouped.count(&["year"]).unwrap();

    assert_eq!(counted.column_names(), &["site", "year", "n"]);
    assert_eq!(counted.group_keys(), &["site"]);
    assert_eq!(counted.row_count(), 5);
}
