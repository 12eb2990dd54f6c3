mod common;

use common::{measurements, values};
use tidyrs::prelude::*;

fn years(df: &DataFrame) -> Vec<DataValue> {
    values(df, "year")
}

#[test]
fn test_filter_drops_false_and_missing() {
    let _ = env_logger::try_init();
    let df = measurements();

    let warm = df.filter(&col("temp").gt(10.0)).unwrap();
    assert_eq!(
        years(&warm),
        vec![
            DataValue::Int64(2020),
            DataValue::Int64(2021),
            DataValue::Int64(2022)
        ]
    );
    assert_eq!(warm.column_names(), df.column_names());
}

#[test]
fn test_filter_three_valued_or() {
    let df = measurements();

    // NA | TRUE is TRUE, so the row with a missing temperature survives
    let kept = df
        .filter(&col("temp").gt(11.0).or(col("rain").gt(4)))
        .unwrap();
    assert_eq!(kept.row_count(), 4);
    assert_eq!(values(&kept, "site")[0], DataValue::from("b"));

    // NA & TRUE is NA, so it is dropped here
    let strict = df
        .filter(&col("temp").lt(100.0).and(col("rain").gt(4)))
        .unwrap();
    assert_eq!(years(&strict), vec![DataValue::Int64(2021)]);
}

#[test]
fn test_filter_grouped_aggregate_is_per_group() {
    let grouped = measurements().group_by(&["site"]).unwrap();
    let above_mean = grouped
        .filter(&col("temp").gt(mean(col("temp")).exclude_missing()))
        .unwrap();

    assert_eq!(
        years(&above_mean),
        vec![DataValue::Int64(2021), DataValue::Int64(2022)]
    );
    assert_eq!(above_mean.group_keys(), &["site"]);
}

#[test]
fn test_filter_rejects_non_logical_predicate() {
    let result = measurements().filter(&col("temp"));
    assert!(matches!(result, Err(Error::TypeMismatch(_))));
}

#[test]
fn test_filter_rejects_mismatched_comparison() {
    let result = measurements().filter(&col("site").gt(1));
    assert!(matches!(result, Err(Error::TypeMismatch(_))));
}

#[test]
fn test_filter_with_parsed_predicate() {
    let predicate = Expr::parse("site %in% c('b') & !is.na(temp)").unwrap();
    let kept = measurements().filter(&predicate).unwrap();
    assert_eq!(years(&kept), vec![DataValue::Int64(2021)]);
}

#[test]
fn test_filter_unknown_column() {
    let result = measurements().filter(&col("humidity").is_na());
    assert!(matches!(result, Err(Error::UnknownColumn(name)) if name == "humidity"));
}

#[test]
fn test_filter_to_empty_keeps_schema() {
    let df = measurements();
    let none = df.filter(&col("year").gt(3000)).unwrap();
    assert!(none.is_empty());
    assert_eq!(none.column_count(), 4);
    assert_eq!(none.column_type("temp").unwrap(), ColumnType::Float64);
}

#[test]
fn test_filter_nan_never_satisfies_a_comparison() {
    let df = DataFrame::from_columns(vec![("x", vec![f64::NAN, 2.0].into())]).unwrap();
    for predicate in [col("x").eq(lit(1.0)), col("x").lt_eq(-5.0), col("x").gt_eq(5.0)] {
        assert!(df.filter(&predicate).unwrap().is_empty(), "{}", predicate);
    }
    let kept = df.filter(&col("x").gt(1.0)).unwrap();
    assert_eq!(values(&kept, "x"), vec![DataValue::Float64(2.0)]);

    // A root of a negative number is missing, not NaN
    let negative = DataFrame::from_columns(vec![("x", vec![-8.0].into())]).unwrap();
    let rooted = negative.mutate(&[("y", col("x").pow(0.5))]).unwrap();
    assert!(rooted.value(0, "y").unwrap().is_na());
    let matched = rooted.filter(&Expr::parse("y == 42").unwrap()).unwrap();
    assert!(matched.is_empty());
}

#[test]
fn test_filter_requires_missing_policy_on_empty_table() {
    let empty = measurements().filter(&col("year").gt(3000)).unwrap();
    let result = empty.filter(&Expr::parse("temp > mean(temp)").unwrap());
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));
}
