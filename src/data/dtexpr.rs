// src/data/dtexpr.rs

//! Resolve user-passed date expressions, e.g. `"yesterday"`, `"-2h"`,
//! `"20200102T120000"`, `"3 days ago"`, to a [`DateTimeL`].
//!
//! All "now" relative forms are resolved against an injected
//! [`ReferenceClock`]. Expressions without a timezone are interpreted at the
//! clock's offset.
//!
//! [`DateTimeL`]: crate::data::datetime::DateTimeL
//! [`ReferenceClock`]: crate::data::datetime::ReferenceClock

use crate::data::datetime::{
    pattern_has_tz,
    DateTime,
    DateTimeL,
    DateTimeLOpt,
    DateTimePattern_str,
    Datelike,
    Duration,
    FixedOffset,
    NaiveDateTime,
    ReferenceClock,
    TimeZone,
};

use std::fmt;

use ::const_format::concatcp;
use ::lazy_static::lazy_static;
use ::phf::phf_map;
use ::regex::Regex;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Failure to resolve a date expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DateExprError {
    /// empty or whitespace-only expression
    Empty,
    /// no accepted form matched the expression
    Unparseable(String),
    /// expression is relative to the other boundary (`@+1d`) but the other
    /// boundary is not set
    OtherNotSet(String),
    /// resolved datetime is out of range
    Overflow(String),
}

impl fmt::Display for DateExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateExprError::Empty => write!(f, "empty date expression"),
            DateExprError::Unparseable(expr) => write!(f, "parse error: {}", expr),
            DateExprError::OtherNotSet(expr) => {
                write!(f, "parse error: {} is relative to the other datetime which is not set", expr)
            }
            DateExprError::Overflow(expr) => write!(f, "parse error: {} is out of range", expr),
        }
    }
}

impl std::error::Error for DateExprError {}

pub type ResultDateExpr = std::result::Result<DateTimeL, DateExprError>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// named timezones
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Map of unambiguous named timezone abbreviations to numeric offsets.
///
/// Abbreviations shared by several offsets (e.g. `IST`, `CST`) are absent.
#[allow(non_upper_case_globals)]
pub static MAP_TZZ_TO_TZz: phf::Map<&'static str, &'static str> = phf_map! {
    "UTC" => "+00:00",
    "GMT" => "+00:00",
    "Z" => "+00:00",
    "WET" => "+00:00",
    "WEST" => "+01:00",
    "CET" => "+01:00",
    "CEST" => "+02:00",
    "EET" => "+02:00",
    "EEST" => "+03:00",
    "JST" => "+09:00",
    "KST" => "+09:00",
    "AEST" => "+10:00",
    "AEDT" => "+11:00",
    "NZST" => "+12:00",
    "NZDT" => "+13:00",
    "HST" => "-10:00",
    "AKST" => "-09:00",
    "AKDT" => "-08:00",
    "PST" => "-08:00",
    "PDT" => "-07:00",
    "MST" => "-07:00",
    "MDT" => "-06:00",
    "EST" => "-05:00",
    "EDT" => "-04:00",
};

/// Dummy datetime used to parse a timezone offset string.
const TZ_PARSE_DUMMY: &str = "2000-01-02 03:04:05 ";

/// Transform a timezone string, numeric like `"+09:00"`, `"-0700"`, `"+09"`,
/// or named like `"JST"`, to a [`FixedOffset`].
pub fn tz_offset_from_str(tzo: &str) -> Option<FixedOffset> {
    defn!("({:?})", tzo);
    let tzo_upper = tzo.to_ascii_uppercase();
    let tzo_: &str = match MAP_TZZ_TO_TZz.get(tzo_upper.as_str()) {
        Some(tz_offset) => tz_offset,
        // no entry found, `tzo` is probably a numeric timezone offset
        None => tzo,
    };
    let mut data: String = String::from(TZ_PARSE_DUMMY);
    data.push_str(tzo_);
    for pattern in [
        "%Y-%m-%d %H:%M:%S %:z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S %#z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(data.as_str(), pattern) {
            defx!("return {:?}", dt.offset());
            return Some(*dt.offset());
        }
    }
    defx!("return None");

    None
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// absolute patterns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which fields an absolute date expression pattern carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PatternFields {
    /// date and time
    DateTime,
    /// date only; time is midnight
    Date,
    /// time only; date is today
    Time,
    /// month and day only; year is the current year, time is midnight
    MonthDay,
    /// month, day, and time; year is the current year
    MonthDayTime,
}

/// Absolute patterns tried in order. Patterns with a timezone precede the
/// same pattern without.
const DTEXPR_PATTERNS: [(&DateTimePattern_str, PatternFields); 19] = [
    ("%Y-%m-%d %H:%M:%S %:z", PatternFields::DateTime),
    ("%Y-%m-%d %H:%M:%S %z", PatternFields::DateTime),
    ("%Y-%m-%d %H:%M:%S", PatternFields::DateTime),
    ("%Y-%m-%dT%H:%M:%S%:z", PatternFields::DateTime),
    ("%Y-%m-%dT%H:%M:%S%z", PatternFields::DateTime),
    ("%Y-%m-%dT%H:%M:%S", PatternFields::DateTime),
    ("%Y%m%dT%H%M%S%z", PatternFields::DateTime),
    ("%Y%m%dT%H%M%S", PatternFields::DateTime),
    ("%Y/%m/%d %H:%M:%S %:z", PatternFields::DateTime),
    ("%Y/%m/%d %H:%M:%S", PatternFields::DateTime),
    ("%Y-%m-%d", PatternFields::Date),
    ("%Y%m%d", PatternFields::Date),
    ("%Y/%m/%d", PatternFields::Date),
    ("%H:%M:%S", PatternFields::Time),
    ("%H:%M", PatternFields::Time),
    ("%b %d %H:%M:%S", PatternFields::MonthDayTime),
    ("%m/%d", PatternFields::MonthDay),
    ("%b %d", PatternFields::MonthDay),
    ("%B %d", PatternFields::MonthDay),
];

/// Pattern and data prefixes that supply the year for `MonthDay` patterns.
const PATTERN_YEAR_PREFIX: &DateTimePattern_str = "%Y ";
/// Pattern and data suffixes that supply midnight for date-only patterns.
const PATTERN_TIME_SUFFIX: &DateTimePattern_str = " T%H%M%S";
const DATA_TIME_SUFFIX: &str = " T000000";
/// Pattern prefix that supplies today's date for time-only patterns.
const PATTERN_DATE_PREFIX: &DateTimePattern_str = "%Y%m%dT";

/// Try to parse `expr` exactly (no trailing text) with one absolute pattern.
fn parse_absolute(
    expr: &str,
    pattern_: &DateTimePattern_str,
    fields: PatternFields,
    clock: &ReferenceClock,
) -> DateTimeLOpt {
    let mut pattern = String::from(pattern_);
    let mut data = String::from(expr);
    let now = clock.now();
    match fields {
        PatternFields::DateTime => {}
        PatternFields::Date => {
            pattern.push_str(PATTERN_TIME_SUFFIX);
            data.push_str(DATA_TIME_SUFFIX);
        }
        PatternFields::Time => {
            pattern.insert_str(0, PATTERN_DATE_PREFIX);
            data.insert_str(0, format!("{:04}{:02}{:02}T", now.year(), now.month(), now.day()).as_str());
        }
        PatternFields::MonthDay => {
            pattern.insert_str(0, PATTERN_YEAR_PREFIX);
            data.insert_str(0, format!("{:04} ", now.year()).as_str());
            pattern.push_str(PATTERN_TIME_SUFFIX);
            data.push_str(DATA_TIME_SUFFIX);
        }
        PatternFields::MonthDayTime => {
            pattern.insert_str(0, PATTERN_YEAR_PREFIX);
            data.insert_str(0, format!("{:04} ", now.year()).as_str());
        }
    }
    let has_tz: bool = pattern_has_tz(pattern.as_str());
    // `parse_from_str` requires the entire `data` match, unlike the line
    // parser which allows trailing text
    let dt: DateTimeLOpt = match has_tz {
        true => DateTime::parse_from_str(data.as_str(), pattern.as_str()).ok(),
        false => match NaiveDateTime::parse_from_str(data.as_str(), pattern.as_str()) {
            Ok(naive) => clock.offset().from_local_datetime(&naive).earliest(),
            Err(_) => None,
        },
    };
    defo!("parse {:?} with {:?} returned {:?}", data, pattern, dt);

    dt
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// relative offsets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const CGN_DUR_OFFSET_TYPE: &str = "offset_type";
const CGN_DUR_OFFSET_ADDSUB: &str = "offset_addsub";
const CGN_DUR_OFFSET_WEEKS: &str = "weeks";
const CGN_DUR_OFFSET_DAYS: &str = "days";
const CGN_DUR_OFFSET_HOURS: &str = "hours";
const CGN_DUR_OFFSET_MINUTES: &str = "minutes";
const CGN_DUR_OFFSET_SECONDS: &str = "seconds";

const CGP_DUR_OFFSET_TYPE: &str = concatcp!("(?P<", CGN_DUR_OFFSET_TYPE, r">@?)");
const CGP_DUR_OFFSET_ADDSUB: &str = concatcp!("(?P<", CGN_DUR_OFFSET_ADDSUB, r">[+\-])");
const CGP_DUR_OFFSET_WEEKS: &str = concatcp!("(?:(?P<", CGN_DUR_OFFSET_WEEKS, r">\d+)w)?");
const CGP_DUR_OFFSET_DAYS: &str = concatcp!("(?:(?P<", CGN_DUR_OFFSET_DAYS, r">\d+)d)?");
const CGP_DUR_OFFSET_HOURS: &str = concatcp!("(?:(?P<", CGN_DUR_OFFSET_HOURS, r">\d+)h)?");
const CGP_DUR_OFFSET_MINUTES: &str = concatcp!("(?:(?P<", CGN_DUR_OFFSET_MINUTES, r">\d+)m)?");
const CGP_DUR_OFFSET_SECONDS: &str = concatcp!("(?:(?P<", CGN_DUR_OFFSET_SECONDS, r">\d+)s)?");

/// `"-1w2d"`, `"+30m"`, `"@-6h"`; units in descending order.
const RE_DUR_OFFSET: &str = concatcp!(
    "^",
    CGP_DUR_OFFSET_TYPE,
    CGP_DUR_OFFSET_ADDSUB,
    CGP_DUR_OFFSET_WEEKS,
    CGP_DUR_OFFSET_DAYS,
    CGP_DUR_OFFSET_HOURS,
    CGP_DUR_OFFSET_MINUTES,
    CGP_DUR_OFFSET_SECONDS,
    "$"
);

const CGN_AGO_COUNT: &str = "count";
const CGN_AGO_UNIT: &str = "unit";

/// `"2 hours ago"`, `"1 day ago"`
const RE_AGO: &str = concatcp!(
    r"^(?P<",
    CGN_AGO_COUNT,
    r">\d+)\s*(?P<",
    CGN_AGO_UNIT,
    r">second|sec|minute|min|hour|day|week)s?\s+ago$"
);

lazy_static! {
    static ref REGEX_DUR_OFFSET: Regex = {
        defñ!("lazy_static! REGEX_DUR_OFFSET::new()");
        Regex::new(RE_DUR_OFFSET).unwrap()
    };
    static ref REGEX_AGO: Regex = {
        defñ!("lazy_static! REGEX_AGO::new()");
        Regex::new(RE_AGO).unwrap()
    };
}

/// Relative offset is from now or from the other boundary?
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DurOffsetType {
    Now,
    Other,
}

/// Parse a count of one unit captured by `REGEX_DUR_OFFSET` and convert it to
/// a `Duration`.
fn capture_to_duration(
    captures: &regex::Captures,
    name: &str,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Option<Duration>, ()> {
    let match_ = match captures.name(name) {
        Some(match_) => match_,
        None => return Ok(None),
    };
    defo!("matched named group {:?}, match {:?}", name, match_.as_str());
    let count: i64 = match match_.as_str().parse::<i64>() {
        Ok(val) => val,
        Err(_err) => return Err(()),
    };
    match to_duration(count) {
        Some(duration) => Ok(Some(duration)),
        None => Err(()),
    }
}

/// Regular expression processing of a user-passed duration string like
/// `"-4m2s"`. Returns `None` if `expr` is not a relative offset.
fn string_wdhms_to_duration(expr: &str) -> Option<Result<(Duration, DurOffsetType), ()>> {
    defn!("({:?})", expr);
    let captures: regex::Captures = match REGEX_DUR_OFFSET.captures(expr) {
        Some(caps) => caps,
        None => {
            defx!("REGEX_DUR_OFFSET.captures(…) None");
            return None;
        }
    };
    let offset_type = match captures.name(CGN_DUR_OFFSET_TYPE) {
        Some(match_) if match_.as_str() == "@" => DurOffsetType::Other,
        _ => DurOffsetType::Now,
    };
    let negative: bool = matches!(captures.name(CGN_DUR_OFFSET_ADDSUB), Some(match_) if match_.as_str() == "-");

    let mut duration = Duration::zero();
    let mut any_unit: bool = false;
    for (name, to_duration) in [
        (CGN_DUR_OFFSET_WEEKS, Duration::try_weeks as fn(i64) -> Option<Duration>),
        (CGN_DUR_OFFSET_DAYS, Duration::try_days),
        (CGN_DUR_OFFSET_HOURS, Duration::try_hours),
        (CGN_DUR_OFFSET_MINUTES, Duration::try_minutes),
        (CGN_DUR_OFFSET_SECONDS, Duration::try_seconds),
    ] {
        match capture_to_duration(&captures, name, to_duration) {
            Ok(Some(d)) => {
                any_unit = true;
                duration = match duration.checked_add(&d) {
                    Some(val) => val,
                    None => return Some(Err(())),
                };
            }
            Ok(None) => {}
            Err(()) => {
                defx!("unit {:?} overflow", name);
                return Some(Err(()));
            }
        }
    }
    if !any_unit {
        // a lone sign like `"-"` or `"@+"`
        defx!("no units; return None");
        return None;
    }
    if negative {
        duration = -duration;
    }
    defx!("return {:?}, {:?}", duration, offset_type);

    Some(Ok((duration, offset_type)))
}

/// Regular expression processing of a user-passed string like
/// `"2 hours ago"`. Returns `None` if `expr` is not of that form.
fn string_ago_to_duration(expr: &str) -> Option<Result<Duration, ()>> {
    let captures: regex::Captures = REGEX_AGO.captures(expr)?;
    let count: i64 = match captures.name(CGN_AGO_COUNT)?.as_str().parse::<i64>() {
        Ok(val) => val,
        Err(_err) => return Some(Err(())),
    };
    let duration: Option<Duration> = match captures.name(CGN_AGO_UNIT)?.as_str() {
        "second" | "sec" => Duration::try_seconds(count),
        "minute" | "min" => Duration::try_minutes(count),
        "hour" => Duration::try_hours(count),
        "day" => Duration::try_days(count),
        "week" => Duration::try_weeks(count),
        _ => None,
    };
    defñ!("({:?}) duration {:?}", expr, duration);

    Some(duration.ok_or(()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse `"+<epoch seconds>"`.
fn string_epoch_to_datetime(
    expr: &str,
    clock: &ReferenceClock,
) -> Option<ResultDateExpr> {
    let digits = expr.strip_prefix('+')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let overflow = || DateExprError::Overflow(String::from(expr));
    let secs: i64 = match digits.parse::<i64>() {
        Ok(val) => val,
        Err(_err) => return Some(Err(overflow())),
    };
    let dt = match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.with_timezone(&clock.offset()),
        None => return Some(Err(overflow())),
    };

    Some(Ok(dt))
}

/// `true` if the expression is relative to the other boundary (`"@-1h"`).
pub fn is_relative_to_other(expr: &str) -> bool {
    expr.trim_start().starts_with('@')
}

/// Resolve a user-passed date expression to a [`DateTimeL`].
///
/// Accepted forms, tried in order:
/// 1. `now`, `today` (midnight), `yesterday` (midnight of the prior day)
/// 2. `+<epoch seconds>`
/// 3. absolute datetimes, dates, times of today, and month/day of the
///    current year, see `DTEXPR_PATTERNS`
/// 4. relative offsets from now (`"-1d2h"`) or from `other` (`"@+30m"`)
/// 5. `N <unit>[s] ago`
///
/// Expressions without a timezone are interpreted at the clock's offset.
pub fn resolve_date_expr(
    expr: &str,
    clock: &ReferenceClock,
    other: Option<&DateTimeL>,
) -> ResultDateExpr {
    defn!("({:?}, {:?}, {:?})", expr, clock, other);
    let expr_: &str = expr.trim();
    if expr_.is_empty() {
        defx!("empty");
        return Err(DateExprError::Empty);
    }
    let overflow = || DateExprError::Overflow(String::from(expr_));

    match expr_.to_ascii_lowercase().as_str() {
        "now" => {
            defx!("now");
            return Ok(clock.now());
        }
        "today" => {
            defx!("today");
            return Ok(clock.today());
        }
        "yesterday" => {
            defx!("yesterday");
            return Duration::try_days(1)
                .and_then(|day| clock.today().checked_sub_signed(day))
                .ok_or_else(overflow);
        }
        _ => {}
    }

    if let Some(result) = string_epoch_to_datetime(expr_, clock) {
        defx!("epoch {:?}", result);
        return result;
    }

    for (pattern, fields) in DTEXPR_PATTERNS.iter() {
        if let Some(dt) = parse_absolute(expr_, pattern, *fields, clock) {
            defx!("pattern {:?} return {:?}", pattern, dt);
            return Ok(dt);
        }
    }

    match string_wdhms_to_duration(expr_) {
        Some(Ok((duration, DurOffsetType::Now))) => {
            let dt = clock
                .now()
                .checked_add_signed(duration)
                .ok_or_else(overflow);
            defx!("relative to now {:?}", dt);
            return dt;
        }
        Some(Ok((duration, DurOffsetType::Other))) => {
            let dt = match other {
                Some(other) => other
                    .checked_add_signed(duration)
                    .ok_or_else(overflow),
                None => Err(DateExprError::OtherNotSet(String::from(expr_))),
            };
            defx!("relative to other {:?}", dt);
            return dt;
        }
        Some(Err(())) => {
            defx!("overflow");
            return Err(overflow());
        }
        None => {}
    }

    match string_ago_to_duration(expr_.to_ascii_lowercase().as_str()) {
        Some(Ok(duration)) => {
            let dt = clock
                .now()
                .checked_sub_signed(duration)
                .ok_or_else(overflow);
            defx!("ago {:?}", dt);
            dt
        }
        Some(Err(())) => {
            defx!("ago overflow");
            Err(overflow())
        }
        None => {
            defx!("unparseable");
            Err(DateExprError::Unparseable(String::from(expr_)))
        }
    }
}

/// Both boundaries of a search, resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateRange {
    pub from: DateTimeL,
    pub to: DateTimeL,
}

/// Resolve the `from` and `to` expressions as a pair.
///
/// An expression relative to the other boundary (`@`) is resolved second.
/// If both are relative to each other then `OtherNotSet` is returned.
pub fn resolve_date_range(
    from: &str,
    to: &str,
    clock: &ReferenceClock,
) -> std::result::Result<DateRange, DateExprError> {
    defñ!("({:?}, {:?})", from, to);
    if is_relative_to_other(from) {
        let to_dt = resolve_date_expr(to, clock, None)?;
        let from_dt = resolve_date_expr(from, clock, Some(&to_dt))?;
        return Ok(DateRange {
            from: from_dt,
            to: to_dt,
        });
    }
    let from_dt = resolve_date_expr(from, clock, None)?;
    let to_dt = resolve_date_expr(to, clock, Some(&from_dt))?;

    Ok(DateRange {
        from: from_dt,
        to: to_dt,
    })
}
