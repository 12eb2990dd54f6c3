mod common;

use common::{measurements, values, wide_cases};
use tidyrs::prelude::*;

fn year_columns() -> Vec<Selector> {
    vec![Selector::name("2010"), Selector::name("2015")]
}

#[test]
fn test_gather_is_row_major() {
    let _ = env_logger::try_init();
    let long = wide_cases().gather("year", "n", &year_columns()).unwrap();

    assert_eq!(long.column_names(), &["country", "year", "n"]);
    assert_eq!(long.row_count(), 6);
    assert_eq!(
        values(&long, "country"),
        ["US", "US", "CA", "CA", "DE", "DE"].map(DataValue::from).to_vec()
    );
    assert_eq!(
        values(&long, "year"),
        ["2010", "2015", "2010", "2015", "2010", "2015"]
            .map(DataValue::from)
            .to_vec()
    );
    assert_eq!(
        values(&long, "n"),
        [7000i64, 3000, 6500, 4500, 5000, 6000]
            .map(DataValue::Int64)
            .to_vec()
    );

    for (row, (country, year, n)) in [(1, ("US", "2015", 3000)), (3, ("CA", "2015", 4500))] {
        assert_eq!(long.value(row, "country").unwrap(), DataValue::from(country));
        assert_eq!(long.value(row, "year").unwrap(), DataValue::from(year));
        assert_eq!(long.value(row, "n").unwrap(), DataValue::Int64(n));
    }
}

#[test]
fn test_gather_then_summarize_by_year() {
    let totals = wide_cases()
        .gather("year", "n", &year_columns())
        .unwrap()
        .group_by(&["year"])
        .unwrap()
        .summarize(&[("total", sum(col("n")).exclude_missing())])
        .unwrap();

    assert_eq!(totals.column_names(), &["year", "total"]);
    assert_eq!(
        values(&totals, "total"),
        vec![DataValue::Int64(18500), DataValue::Int64(13500)]
    );
}

#[test]
fn test_gather_spread_round_trip() {
    let wide = wide_cases();
    let long = wide.gather("year", "n", &year_columns()).unwrap();
    let back = long.spread("year", "n", None).unwrap();

    assert_eq!(back, wide);
}

#[test]
fn test_gather_widens_numbers() {
    let long = measurements()
        .gather(
            "measure",
            "value",
            &[Selector::name("temp"), Selector::name("rain")],
        )
        .unwrap();

    assert_eq!(long.column_names(), &["site", "year", "measure", "value"]);
    assert_eq!(long.column_type("value").unwrap(), ColumnType::Float64);
    let gathered = values(&long, "value");
    assert_eq!(gathered.len(), 10);
    assert_eq!(gathered[1], DataValue::Float64(3.0));
    assert!(gathered[2].is_na());
    assert!(gathered[5].is_na());
}

#[test]
fn test_gather_rejects_mixed_types() {
    let result = measurements().gather(
        "key",
        "value",
        &[Selector::name("site"), Selector::name("year")],
    );
    assert!(matches!(result, Err(Error::ColumnCountMismatch(_))));
}

#[test]
fn test_gather_rejects_clashing_names() {
    let result = wide_cases().gather("country", "n", &year_columns());
    assert!(matches!(result, Err(Error::DuplicateColumnName(_))));
}

#[test]
fn test_gather_keeps_surviving_grouping() {
    let grouped = wide_cases().group_by(&["country"]).unwrap();
    let long = grouped.gather("year", "n", &year_columns()).unwrap();
    assert_eq!(long.group_keys(), &["country"]);
}

#[test]
fn test_spread_fills_gaps() {
    let long = DataFrame::from_columns(vec![
        ("country", vec!["US", "US", "CA"].into()),
        ("year", vec!["2010", "2015", "2010"].into()),
        ("n", vec![1i64, 2, 3].into()),
    ])
    .unwrap();

    let wide = long.spread("year", "n", None).unwrap();
    assert_eq!(wide.column_names(), &["country", "2010", "2015"]);
    assert!(wide.value(1, "2015").unwrap().is_na());

    let filled = long.spread("year", "n", Some(DataValue::Int64(0))).unwrap();
    assert_eq!(filled.value(1, "2015").unwrap(), DataValue::Int64(0));
}

#[test]
fn test_spread_rejects_duplicate_keys() {
    let long = DataFrame::from_columns(vec![
        ("country", vec!["US", "US"].into()),
        ("year", vec!["2010", "2010"].into()),
        ("n", vec![1i64, 2].into()),
    ])
    .unwrap();

    let result = long.spread("year", "n", None);
    assert!(matches!(result, Err(Error::DuplicateKey(_))));
}

#[test]
fn test_gather_then_mean_by_country() {
    let means = wide_cases()
        .gather("year", "n", &year_columns())
        .unwrap()
        .group_by(&["country"])
        .unwrap()
        .summarize(&[
            ("mean_n", mean(col("n")).exclude_missing()),
            ("years", n()),
        ])
        .unwrap();

    assert_eq!(means.row_count(), 3);
    assert_eq!(
        values(&means, "country"),
        ["CA", "DE", "US"].map(DataValue::from).to_vec()
    );
    assert_eq!(
        values(&means, "mean_n"),
        [5500.0, 5500.0, 5000.0].map(DataValue::Float64).to_vec()
    );
    assert_eq!(values(&means, "years"), [2i64; 3].map(DataValue::Int64).to_vec());
}

#[test]
fn test_filter_and_mutate_preserve_row_bounds() {
    let df = measurements();
    let filtered = df.filter(&col("rain").gt(2)).unwrap();
    assert!(filtered.row_count() <= df.row_count());
    for value in values(&filtered, "rain") {
        assert!(value.as_i64().is_some_and(|r| r > 2));
    }

    let mutated = df.mutate(&[("rain_sq", col("rain") * col("rain"))]).unwrap();
    assert_eq!(mutated.row_count(), df.row_count());
}
