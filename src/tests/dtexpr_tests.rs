// src/tests/dtexpr_tests.rs

//! tests for `dtexpr.rs` functions

#![allow(non_snake_case)]

use crate::data::datetime::{ymdhms, DateTimeL, FixedOffset, ReferenceClock};
use crate::data::dtexpr::{
    is_relative_to_other,
    resolve_date_expr,
    resolve_date_range,
    tz_offset_from_str,
    DateExprError,
    DateRange,
    MAP_TZZ_TO_TZz,
};
use crate::tests::common::{clock_at, FO_0, FO_E9, FO_W8};

use ::lazy_static::lazy_static;
use ::test_case::test_case;

lazy_static! {
    /// "now" is 2020-03-15 12:30:45 UTC
    static ref CLOCK: ReferenceClock = clock_at(2020, 3, 15, 12, 30, 45);
}

/// helper for UTC datetimes
fn utc(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> DateTimeL {
    ymdhms(&FO_0, year, month, day, hour, min, sec)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// timezones
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test_case("+09:00", Some(FO_E9))]
#[test_case("+0900", Some(FO_E9))]
#[test_case("-08:00", Some(FO_W8))]
#[test_case("-0800", Some(FO_W8))]
#[test_case("+00:00", Some(FO_0))]
#[test_case("JST", Some(FO_E9))]
#[test_case("jst", Some(FO_E9); "lowercase name")]
#[test_case("PST", Some(FO_W8))]
#[test_case("UTC", Some(FO_0))]
#[test_case("Z", Some(FO_0))]
#[test_case("XYZ", None)]
#[test_case("", None; "empty")]
#[test_case("+25:00", None; "out of range")]
fn test_tz_offset_from_str(
    tzo: &str,
    expect: Option<FixedOffset>,
) {
    assert_eq!(tz_offset_from_str(tzo), expect, "tzo {:?}", tzo);
}

#[test]
fn test_MAP_TZZ_TO_TZz_values_parse() {
    for (name, value) in MAP_TZZ_TO_TZz.entries() {
        assert_eq!(name.to_ascii_uppercase().as_str(), *name, "key {:?} not uppercase", name);
        assert!(tz_offset_from_str(value).is_some(), "value {:?} of {:?} failed to parse", value, name);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// resolve_date_expr
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test_case("now", utc(2020, 3, 15, 12, 30, 45))]
#[test_case("NOW", utc(2020, 3, 15, 12, 30, 45); "uppercase now")]
#[test_case("  now  ", utc(2020, 3, 15, 12, 30, 45); "padded now")]
#[test_case("today", utc(2020, 3, 15, 0, 0, 0))]
#[test_case("yesterday", utc(2020, 3, 14, 0, 0, 0))]
#[test_case("+946684800", utc(2000, 1, 1, 0, 0, 0); "epoch")]
#[test_case("+0", utc(1970, 1, 1, 0, 0, 0); "epoch zero")]
#[test_case("2020-01-02 03:04:05", utc(2020, 1, 2, 3, 4, 5))]
#[test_case("2020-01-02T03:04:05", utc(2020, 1, 2, 3, 4, 5))]
#[test_case("20200102T030405", utc(2020, 1, 2, 3, 4, 5))]
#[test_case("2020/01/02 03:04:05", utc(2020, 1, 2, 3, 4, 5); "slashes datetime")]
#[test_case("2020-01-02 03:04:05 -08:00", utc(2020, 1, 2, 11, 4, 5); "tz colon")]
#[test_case("2020-01-02 03:04:05 +0900", utc(2020, 1, 1, 18, 4, 5); "tz no colon")]
#[test_case("2020-01-02T03:04:05+09:00", utc(2020, 1, 1, 18, 4, 5); "T tz")]
#[test_case("2020-01-02", utc(2020, 1, 2, 0, 0, 0))]
#[test_case("20200102", utc(2020, 1, 2, 0, 0, 0))]
#[test_case("2020/01/02", utc(2020, 1, 2, 0, 0, 0); "slashes date")]
#[test_case("12:00:01", utc(2020, 3, 15, 12, 0, 1))]
#[test_case("01:00", utc(2020, 3, 15, 1, 0, 0))]
#[test_case("01/02", utc(2020, 1, 2, 0, 0, 0))]
#[test_case("Jan 02", utc(2020, 1, 2, 0, 0, 0))]
#[test_case("January 02", utc(2020, 1, 2, 0, 0, 0))]
#[test_case("Jan 02 03:04:05", utc(2020, 1, 2, 3, 4, 5))]
#[test_case("-1d", utc(2020, 3, 14, 12, 30, 45))]
#[test_case("+30m", utc(2020, 3, 15, 13, 0, 45))]
#[test_case("-45s", utc(2020, 3, 15, 12, 30, 0))]
#[test_case("-1w2d3h4m5s", utc(2020, 3, 6, 9, 26, 40))]
#[test_case("2 hours ago", utc(2020, 3, 15, 10, 30, 45))]
#[test_case("1 day ago", utc(2020, 3, 14, 12, 30, 45))]
#[test_case("3 Days Ago", utc(2020, 3, 12, 12, 30, 45); "mixed case ago")]
#[test_case("5 mins ago", utc(2020, 3, 15, 12, 25, 45))]
#[test_case("90 sec ago", utc(2020, 3, 15, 12, 29, 15))]
#[test_case("1 week ago", utc(2020, 3, 8, 12, 30, 45))]
fn test_resolve_date_expr(
    expr: &str,
    expect: DateTimeL,
) {
    let result = resolve_date_expr(expr, &CLOCK, None);
    assert_eq!(result, Ok(expect), "expr {:?}", expr);
}

#[test]
fn test_resolve_date_expr_clock_offset() {
    // no timezone in the expression so the clock offset is used
    let clock = ReferenceClock::new(ymdhms(&FO_E9, 2020, 3, 15, 12, 30, 45));
    let dt = resolve_date_expr("2020-01-02 03:04:05", &clock, None).unwrap();
    assert_eq!(dt, ymdhms(&FO_E9, 2020, 1, 2, 3, 4, 5));
    assert_eq!(dt.offset(), &FO_E9);
    let dt = resolve_date_expr("today", &clock, None).unwrap();
    assert_eq!(dt, ymdhms(&FO_E9, 2020, 3, 15, 0, 0, 0));
}

#[test]
fn test_resolve_date_expr_other() {
    let other = utc(2020, 1, 2, 3, 0, 0);
    assert_eq!(resolve_date_expr("@+1h", &CLOCK, Some(&other)), Ok(utc(2020, 1, 2, 4, 0, 0)));
    assert_eq!(resolve_date_expr("@-1d", &CLOCK, Some(&other)), Ok(utc(2020, 1, 1, 3, 0, 0)));
    // an `other` does not affect absolute expressions
    assert_eq!(resolve_date_expr("-1h", &CLOCK, Some(&other)), Ok(utc(2020, 3, 15, 11, 30, 45)));
}

#[test]
fn test_resolve_date_expr_other_not_set() {
    assert_eq!(
        resolve_date_expr("@+1h", &CLOCK, None),
        Err(DateExprError::OtherNotSet(String::from("@+1h")))
    );
}

#[test_case(""; "empty")]
#[test_case("   "; "whitespace")]
fn test_resolve_date_expr_empty(expr: &str) {
    assert_eq!(resolve_date_expr(expr, &CLOCK, None), Err(DateExprError::Empty));
}

#[test_case("nonsense")]
#[test_case("-"; "lone minus")]
#[test_case("@+"; "lone at plus")]
#[test_case("-1x"; "bad unit")]
#[test_case("-1s1m"; "units out of order")]
#[test_case("2020-01-02 03:04:05 trailing"; "trailing text")]
#[test_case("2020-13-02"; "month 13")]
#[test_case("25:00"; "hour 25")]
#[test_case("1 fortnight ago"; "bad ago unit")]
#[test_case("ago"; "lone ago")]
fn test_resolve_date_expr_unparseable(expr: &str) {
    assert_eq!(
        resolve_date_expr(expr, &CLOCK, None),
        Err(DateExprError::Unparseable(String::from(expr)))
    );
}

#[test_case("+9999999999999999"; "epoch out of range")]
#[test_case("+99999999999999999999"; "epoch too many digits")]
#[test_case("-99999999999w"; "weeks too many")]
#[test_case("-99999999w"; "datetime out of range")]
fn test_resolve_date_expr_overflow(expr: &str) {
    assert_eq!(
        resolve_date_expr(expr, &CLOCK, None),
        Err(DateExprError::Overflow(String::from(expr)))
    );
}

#[test]
fn test_DateExprError_display() {
    let err = DateExprError::Unparseable(String::from("nonsense"));
    assert_eq!(err.to_string(), "parse error: nonsense");
    let err = DateExprError::OtherNotSet(String::from("@+1h"));
    assert!(err.to_string().contains("@+1h"));
}

#[test_case("@+1h", true)]
#[test_case(" @-1d", true)]
#[test_case("-1d", false)]
#[test_case("now", false)]
fn test_is_relative_to_other(
    expr: &str,
    expect: bool,
) {
    assert_eq!(is_relative_to_other(expr), expect);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// resolve_date_range
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test_case("2020-01-02 01:00:00", "2020-01-02 03:00:00", utc(2020, 1, 2, 1, 0, 0), utc(2020, 1, 2, 3, 0, 0); "absolute")]
#[test_case("2020-01-02 01:00:00", "@+2h", utc(2020, 1, 2, 1, 0, 0), utc(2020, 1, 2, 3, 0, 0); "to relative to from")]
#[test_case("@-2h", "2020-01-02 03:00:00", utc(2020, 1, 2, 1, 0, 0), utc(2020, 1, 2, 3, 0, 0); "from relative to to")]
#[test_case("-1h", "now", utc(2020, 3, 15, 11, 30, 45), utc(2020, 3, 15, 12, 30, 45); "last hour")]
fn test_resolve_date_range(
    from: &str,
    to: &str,
    expect_from: DateTimeL,
    expect_to: DateTimeL,
) {
    let expect = DateRange {
        from: expect_from,
        to: expect_to,
    };
    assert_eq!(resolve_date_range(from, to, &CLOCK), Ok(expect));
}

#[test]
fn test_resolve_date_range_both_relative() {
    let result = resolve_date_range("@-1h", "@+1h", &CLOCK);
    assert_eq!(result, Err(DateExprError::OtherNotSet(String::from("@+1h"))));
}

#[test]
fn test_resolve_date_range_error() {
    let result = resolve_date_range("nonsense", "now", &CLOCK);
    assert_eq!(result, Err(DateExprError::Unparseable(String::from("nonsense"))));
}
