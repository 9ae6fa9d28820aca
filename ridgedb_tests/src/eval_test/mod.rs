use ridgedb_core::eval::{eval, like_match, parse_expr};

#[test]
fn like_percent_matches_every_row_including_empty_string() {
    assert!(like_match("", "%"));
    assert!(like_match("anything", "%"));
}

#[test]
fn numeric_comparison_is_numeric_not_lexicographic() {
    let columns = vec!["n".to_string()];
    let ten = vec!["10".to_string()];
    let expr = parse_expr("n < 9").unwrap();
    assert!(!eval(&expr, &columns, &ten).unwrap());
}

#[test]
fn non_numeric_operands_fall_back_to_lexicographic_order() {
    let columns = vec!["w".to_string()];
    let apple = vec!["apple".to_string()];
    let expr = parse_expr("w < 'banana'").unwrap();
    assert!(eval(&expr, &columns, &apple).unwrap());
}

#[test]
fn and_binds_tighter_than_or() {
    let columns = vec!["a".to_string(), "b".to_string()];
    let row = vec!["2".to_string(), "y".to_string()];
    // a = 1 OR (a = 2 AND b = 'y') should be true for this row.
    let expr = parse_expr("a = 1 OR a = 2 AND b = 'y'").unwrap();
    assert!(eval(&expr, &columns, &row).unwrap());
}

#[test]
fn quoted_literals_may_contain_spaces() {
    let expr = parse_expr("name = 'Ada Lovelace'").unwrap();
    let columns = vec!["name".to_string()];
    assert!(eval(&expr, &columns, &vec!["Ada Lovelace".to_string()]).unwrap());
}

#[test]
fn unknown_column_in_predicate_is_an_error() {
    let columns = vec!["a".to_string()];
    let expr = parse_expr("missing = 1").unwrap();
    assert!(eval(&expr, &columns, &vec!["1".to_string()]).is_err());
}
