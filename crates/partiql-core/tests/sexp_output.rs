//! Tests for the canonical s-expression serialization (V0).

mod common;
use common::*;

#[test]
fn literal_forms() {
    assert_eq!(sexp("1"), "(lit 1)");
    assert_eq!(sexp("'a'"), "(lit \"a\")");
    assert_eq!(sexp("TRUE"), "(lit true)");
    assert_eq!(sexp("NULL"), "(lit null)");
    assert_eq!(sexp("MISSING"), "(missing)");
}

#[test]
fn variable_and_operator_forms() {
    assert_eq!(
        sexp("a + 1"),
        "(+ (id \"a\" case_insensitive unqualified) (lit 1))"
    );
    assert_eq!(
        sexp("@a"),
        "(id \"a\" case_insensitive locals_first)"
    );
}

#[test]
fn select_form() {
    assert_eq!(
        sexp("SELECT a FROM t"),
        "(select (project (list (id \"a\" case_insensitive unqualified))) \
         (from (id \"t\" case_insensitive unqualified)))"
    );
}

#[test]
fn select_star_and_path_star_both_project_all() {
    let bare = sexp("SELECT * FROM t");
    let path = sexp("SELECT t.* FROM t");
    assert_eq!(bare.matches("project_all").count(), 1);
    assert_eq!(path.matches("project_all").count(), 1);
}

#[test]
fn struct_and_seq_forms() {
    assert_eq!(sexp("{'x': 1}"), "(struct (pair (lit \"x\") (lit 1)))");
    assert_eq!(sexp("<<1, 2>>"), "(bag (lit 1) (lit 2))");
    assert_eq!(sexp("[1]"), "(list (lit 1))");
}

#[test]
fn call_forms() {
    assert_eq!(sexp("COUNT(*)"), "(count_star)");
    assert_eq!(
        sexp("SUM(DISTINCT a)"),
        "(call_agg sum distinct (id \"a\" case_insensitive unqualified))"
    );
    assert_eq!(sexp("upper('a')"), "(call upper (lit \"a\"))");
}

#[test]
fn typed_forms() {
    assert_eq!(
        sexp("CAST(x AS DECIMAL(10, 2))"),
        "(cast (id \"x\" case_insensitive unqualified) (type decimal 10 2))"
    );
    assert_eq!(
        sexp("x IS NULL"),
        "(is (id \"x\" case_insensitive unqualified) (type null))"
    );
}

#[test]
fn negated_forms_wrap_in_not() {
    assert_eq!(
        sexp("x NOT IN (1)"),
        "(not (in (id \"x\" case_insensitive unqualified) (list (lit 1))))"
    );
}

#[test]
fn path_form() {
    assert_eq!(
        sexp("a.b[0]"),
        "(path (id \"a\" case_insensitive unqualified) \
         (case_insensitive (lit \"b\")) (case_sensitive (lit 0)))"
    );
}

#[test]
fn datetime_forms() {
    assert_eq!(sexp("DATE '2021-02-03'"), "(date 2021 2 3)");
    assert_eq!(sexp("TIME '10:20:30'"), "(time 10 20 30 0 0)");
}

#[test]
fn exec_form() {
    assert_eq!(sexp("EXEC sp 1"), "(exec sp (lit 1))");
}

#[test]
fn dml_form() {
    assert_eq!(
        sexp("INSERT INTO t VALUE 1"),
        "(dml (operations (insert_value (id \"t\" case_insensitive unqualified) (lit 1))))"
    );
}

#[test]
fn equal_asts_serialize_identically() {
    assert_eq!(sexp("a + b + c"), sexp("(a + b) + c"));
    assert_eq!(sexp("SELECT a FROM t"), sexp("select A fRoM t").replace("\"A\"", "\"a\""));
}

#[test]
fn reparsing_the_same_input_is_stable() {
    let first = sexp("SELECT DISTINCT x FROM t WHERE x > 1 ORDER BY x DESC LIMIT 2");
    let second = sexp("SELECT DISTINCT x FROM t WHERE x > 1 ORDER BY x DESC LIMIT 2");
    assert_eq!(first, second);
}
