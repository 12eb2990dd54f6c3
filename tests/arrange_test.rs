mod common;

use common::{measurements, values};
use tidyrs::prelude::*;

fn years(df: &DataFrame) -> Vec<i64> {
    values(df, "year")
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

#[test]
fn test_arrange_ascending_puts_missing_last() {
    let sorted = measurements().arrange(&[SortKey::asc("temp")]).unwrap();
    let temps = values(&sorted, "temp");

    assert_eq!(temps[0], DataValue::Float64(8.0));
    assert_eq!(temps[3], DataValue::Float64(12.0));
    assert!(temps[4].is_na());
}

#[test]
fn test_arrange_descending_puts_missing_last() {
    let sorted = measurements().arrange(&[SortKey::desc("temp")]).unwrap();
    let temps = values(&sorted, "temp");

    assert_eq!(temps[0], DataValue::Float64(12.0));
    assert_eq!(temps[3], DataValue::Float64(8.0));
    assert!(temps[4].is_na());
}

#[test]
fn test_arrange_is_stable() {
    let sorted = measurements().arrange(&[SortKey::asc("site")]).unwrap();
    assert_eq!(years(&sorted), vec![2020, 2021, 2022, 2020, 2021]);
}

#[test]
fn test_arrange_multiple_keys() {
    let sorted = measurements()
        .arrange(&[SortKey::asc("site"), SortKey::desc("year")])
        .unwrap();
    assert_eq!(years(&sorted), vec![2022, 2021, 2020, 2021, 2020]);
}

#[test]
fn test_arrange_parsed_keys() {
    let keys: Vec<SortKey> = ["-rain", "site"].iter().map(|k| k.parse().unwrap()).collect();
    let sorted = measurements().arrange(&keys).unwrap();

    assert_eq!(
        values(&sorted, "rain"),
        vec![
            DataValue::Int64(7),
            DataValue::Int64(5),
            DataValue::Int64(3),
            DataValue::Int64(1),
            DataValue::Na,
        ]
    );
}

#[test]
fn test_arrange_keeps_grouping_and_rows() {
    let grouped = measurements().group_by(&["site"]).unwrap();
    let sorted = grouped.arrange(&[SortKey::desc("year")]).unwrap();

    assert_eq!(sorted.group_keys(), &["site"]);
    assert_eq!(sorted.row_count(), 5);
    assert_eq!(years(&sorted), vec![2022, 2021, 2021, 2020, 2020]);
}

#[test]
fn test_arrange_unknown_column() {
    let result = measurements().arrange(&[SortKey::asc("humidity")]);
    assert!(matches!(result, Err(Error::UnknownColumn(_))));
}

#[test]
fn test_desc_then_asc_restores_value_order() {
    let df = measurements();
    let ascending = df.arrange(&[SortKey::asc("rain")]).unwrap();
    let round_trip = df
        .arrange(&[SortKey::desc("rain")])
        .unwrap()
        .arrange(&[SortKey::asc("rain")])
        .unwrap();

    assert_eq!(values(&round_trip, "rain"), values(&ascending, "rain"));
}
