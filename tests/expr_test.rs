use tidyrs::prelude::*;

fn numbers() -> DataFrame {
    DataFrame::from_columns(vec![
        ("x", vec![Some(1.0), Some(3.0), None, Some(2.0)].into()),
        ("label", vec!["one", "three", "missing", "two"].into()),
    ])
    .unwrap()
}

fn evaluate(df: &DataFrame, expr: &Expr) -> Vec<DataValue> {
    let rows: Vec<usize> = (0..df.row_count()).collect();
    expr.evaluate(df, &rows).unwrap()
}

#[test]
fn test_display_is_fully_parenthesized() {
    let expr = Expr::parse("temp * 2 + 1").unwrap();
    assert_eq!(expr.to_string(), "((temp * 2) + 1)");
    assert_eq!(Expr::parse(&expr.to_string()).unwrap(), expr);
}

#[test]
fn test_builders_match_parser() {
    let built = col("x").between(1, 2).and(!col("flag"));
    let parsed: Expr = "between(x, 1, 2) & !flag".parse().unwrap();
    assert_eq!(built, parsed);
}

#[test]
fn test_parse_error_reports_position() {
    match Expr::parse("x > (1 + ") {
        Err(Error::Parse { position, .. }) => assert_eq!(position, 9),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(matches!(
        Expr::parse("frobnicate(x)"),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn test_aggregate_parse_requires_aggregate() {
    let agg = AggExpr::parse("sd(x, na.rm = TRUE)").unwrap();
    assert_eq!(agg.func, AggFunc::Sd);
    assert_eq!(agg.missing, Some(MissingPolicy::Exclude));

    assert!(matches!(AggExpr::parse("x + 1"), Err(Error::InvalidInput(_))));
}

#[test]
fn test_is_in_compares_numbers_and_missing() {
    let df = numbers();
    let expr = col("x").is_in(vec![DataValue::Int64(1), DataValue::Na]);
    assert_eq!(
        evaluate(&df, &expr),
        [true, false, true, false].map(DataValue::Boolean).to_vec()
    );
}

#[test]
fn test_comparison_with_missing_is_missing() {
    let df = numbers();
    let result = evaluate(&df, &col("x").gt_eq(2));
    assert_eq!(result[1], DataValue::Boolean(true));
    assert!(result[2].is_na());
}

#[test]
fn test_scalar_functions() {
    let df = numbers();

    let upper = evaluate(&df, &Expr::parse("upper(label)").unwrap());
    assert_eq!(upper[0], DataValue::from("ONE"));

    let lengths = evaluate(&df, &Expr::parse("nchar(label)").unwrap());
    assert_eq!(lengths[1], DataValue::Int64(5));

    let roots = evaluate(&df, &Expr::parse("round(sqrt(x), 2)").unwrap());
    assert_eq!(roots[1], DataValue::Float64(1.73));
    assert!(roots[2].is_na());
}

#[test]
fn test_casts() {
    let df = numbers();
    let as_int = evaluate(&df, &col("x").cast(ColumnType::Int64));
    assert_eq!(as_int[1], DataValue::Int64(3));

    let as_text = evaluate(&df, &Expr::parse("as.character(x)").unwrap());
    assert_eq!(as_text[0], DataValue::from("1"));
}

#[test]
fn test_min_rank_skips_missing() {
    let df = numbers();
    let ranks = evaluate(&df, &min_rank(col("x")));
    assert_eq!(
        ranks,
        vec![
            DataValue::Int64(1),
            DataValue::Int64(3),
            DataValue::Na,
            DataValue::Int64(2),
        ]
    );
}

#[test]
fn test_referenced_columns() {
    let expr = Expr::parse("if_else(a > 1, b, sum(c, na_rm = TRUE))").unwrap();
    assert_eq!(expr.referenced_columns(), vec!["a", "b", "c"]);
}
