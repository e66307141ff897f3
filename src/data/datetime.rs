// src/data/datetime.rs

//! Functions to extract a timestamp from the leading bytes of a log line and
//! transform it to a chrono [`DateTime`] instance.
//!
//! Extracting a timestamp requires:
//! 1. narrowing the raw line bytes to the slice handed to the parser
//!    (capped length, newline removed, optionally skipping to the first `[`)
//! 2. parsing that slice with a chrono [`strftime`] pattern, allowing
//!    trailing text after the timestamp
//! 3. for patterns without a year, inferring the year from the
//!    [`ReferenceClock`]
//!
//! The most relevant type is [`DateTimeParseInstr`].
//!
//! [`DateTime`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html
//! [`strftime`]: https://docs.rs/chrono/0.4.40/chrono/format/strftime/index.html

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

use crate::common::{CRu8, NLu8};
#[cfg(any(debug_assertions, test))]
use crate::debug::printers::{buffer_to_String_noraw, str_to_String_noraw};

use std::fmt;

#[doc(hidden)]
pub use ::chrono::{
    DateTime,
    Datelike, // adds method `.year()` onto `DateTime`
    Duration,
    FixedOffset,
    Local,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
    Offset,
    TimeZone,
    Timelike,
    Utc,
};
use ::const_format::concatcp;
use ::memchr::memchr;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DateTime types and strftime patterns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A _Year_ in a date
pub type Year = i32;

/// Crate `chrono` [`strftime`] formatting pattern, passed to
/// chrono [`NaiveDateTime::parse_and_remainder`].
///
/// [`strftime`]: https://docs.rs/chrono/0.4.40/chrono/format/strftime/index.html
/// [`NaiveDateTime::parse_and_remainder`]: https://docs.rs/chrono/0.4.40/chrono/naive/struct.NaiveDateTime.html#method.parse_and_remainder
pub type DateTimePattern_str = str;
pub type DateTimePattern_string = String;

/// A chrono [`DateTime`] type used in _logcutlib_.
///
/// [`DateTime`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html
pub type DateTimeL = DateTime<FixedOffset>;
pub type DateTimeLOpt = Option<DateTimeL>;

/// ISO timestamp, e.g. `2006-01-10 01:02:03`
pub const DTP_ISO: &DateTimePattern_str = "%Y-%m-%d %T";
/// ANSI/syslog timestamp, e.g. `Jan 10 01:02:03`
pub const DTP_SYSLOG: &DateTimePattern_str = "%b %d %T";
/// web server access log timestamp, e.g. `10/Jan/2006:01:02:03`
pub const DTP_WEB: &DateTimePattern_str = "%d/%b/%Y:%T";

/// The web access log timestamp is preceded by a client address field and
/// begins after this byte.
pub const WEB_DELIMITER: u8 = b'[';

/// Maximum count of leading bytes of a line that are read for timestamp
/// parsing. Longer lines are truncated for parsing purposes only.
pub const LINE_READ_MAX: usize = 0x1000;

/// For datetimes missing a year, a filler year is used during parsing.
///
/// First leap year after Unix Epoch so that `Feb 29` parses.
const YEAR_FALLBACKDUMMY: &str = "1972";
pub const YEAR_FALLBACKDUMMY_VAL: Year = 1972;

/// Pattern prefix paired with `YEAR_FALLBACKDUMMY`.
const DTP_YEAR_PREFIX: &DateTimePattern_str = "%Y ";
const DATA_YEAR_PREFIX: &str = concatcp!(YEAR_FALLBACKDUMMY, " ");

/// strftime conversion specifiers that carry a year.
const SPECIFIERS_YEAR: &[char] = &['Y', 'y', 'C', 'G', 'g', 'D', 'F', 'c', '+', 's'];
/// strftime conversion specifiers that carry a timezone offset
/// (`%z`, `%:z`, `%::z`, `%#z`).
const SPECIFIERS_TZ: &[char] = &['z'];
/// strftime flags, widths, and modifiers that may come between `%` and the
/// conversion specifier.
const SPECIFIER_MODIFIERS: &[char] = &['-', '_', '0', '#', ':', '.', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Does the strftime `pattern` have a conversion specifier in `specifiers`?
///
/// Literal `%%` is skipped.
pub fn pattern_has_specifier(
    pattern: &DateTimePattern_str,
    specifiers: &[char],
) -> bool {
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        while let Some(m) = chars.peek() {
            if SPECIFIER_MODIFIERS.contains(m) {
                chars.next();
            } else {
                break;
            }
        }
        match chars.next() {
            Some('%') => {}
            Some(spec) if specifiers.contains(&spec) => return true,
            Some(_) => {}
            None => break,
        }
    }

    false
}

/// Does the strftime `pattern` have a year?
pub fn pattern_has_year(pattern: &DateTimePattern_str) -> bool {
    pattern_has_specifier(pattern, SPECIFIERS_YEAR)
}

/// Does the strftime `pattern` have a numeric timezone offset?
pub fn pattern_has_tz(pattern: &DateTimePattern_str) -> bool {
    pattern_has_specifier(pattern, SPECIFIERS_TZ)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimestampFormat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The timestamp format of the lines of a log file.
///
/// Only `WebAccess` skips to the first [`WEB_DELIMITER`] before parsing.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum TimestampFormat {
    /// [`DTP_ISO`]
    Iso,
    /// [`DTP_SYSLOG`]
    #[default]
    Syslog,
    /// [`DTP_WEB`]
    WebAccess,
    /// A user-passed strftime pattern.
    Custom(DateTimePattern_string),
}

impl TimestampFormat {
    /// The strftime pattern of this format.
    pub fn pattern(&self) -> &DateTimePattern_str {
        match self {
            TimestampFormat::Iso => DTP_ISO,
            TimestampFormat::Syslog => DTP_SYSLOG,
            TimestampFormat::WebAccess => DTP_WEB,
            TimestampFormat::Custom(pattern) => pattern.as_str(),
        }
    }

    /// Parsing begins after the first `[` in the line?
    pub const fn skip_to_bracket(&self) -> bool {
        matches!(self, TimestampFormat::WebAccess)
    }

    pub fn has_year(&self) -> bool {
        pattern_has_year(self.pattern())
    }

    pub fn has_tz(&self) -> bool {
        pattern_has_tz(self.pattern())
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::Iso => write!(f, "ISO {:?}", DTP_ISO),
            TimestampFormat::Syslog => write!(f, "syslog {:?}", DTP_SYSLOG),
            TimestampFormat::WebAccess => write!(f, "web access {:?}", DTP_WEB),
            TimestampFormat::Custom(pattern) => write!(f, "custom {:?}", pattern),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ReferenceClock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The "current time", captured once at program start and never changed.
///
/// Used for year inference of timestamps without a year and for resolving
/// relative date expressions like `"-2h"`.
/// Sub-second precision is dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReferenceClock {
    now: DateTimeL,
}

impl ReferenceClock {
    pub fn new(now: DateTimeL) -> ReferenceClock {
        let now = now.with_nanosecond(0).unwrap_or(now);
        defñ!("{:?}", now);

        ReferenceClock { now }
    }

    /// Current time in the local system timezone.
    pub fn now_local() -> ReferenceClock {
        let local: DateTime<Local> = Local::now();
        let offset: FixedOffset = *local.offset();

        ReferenceClock::new(local.with_timezone(&offset))
    }

    /// Current time in the passed timezone `offset`.
    pub fn now_with_offset(offset: &FixedOffset) -> ReferenceClock {
        ReferenceClock::new(Utc::now().with_timezone(offset))
    }

    #[inline(always)]
    pub const fn now(&self) -> DateTimeL {
        self.now
    }

    #[inline(always)]
    pub fn year(&self) -> Year {
        self.now.year()
    }

    /// Month, `1` to `12`.
    #[inline(always)]
    pub fn month(&self) -> u32 {
        self.now.month()
    }

    #[inline(always)]
    pub fn offset(&self) -> FixedOffset {
        *self.now.offset()
    }

    /// Timezone offset in minutes _west_ of UTC, e.g. `-540` for `+09:00`.
    pub fn tz_minutes_west(&self) -> i32 {
        -(self.offset().local_minus_utc() / 60)
    }

    /// Midnight at the start of today.
    pub fn today(&self) -> DateTimeL {
        let naive: NaiveDateTime = self.now.date_naive().and_time(NaiveTime::MIN);
        match self.offset().from_local_datetime(&naive).earliest() {
            Some(dt) => dt,
            None => self.now,
        }
    }
}

/// Infer the year of a timestamp that has only a `month` (`1` to `12`).
///
/// Log rotation windows rarely span a year, so a month later than the
/// current month must belong to the previous year.
pub fn infer_year(
    month: u32,
    clock: &ReferenceClock,
) -> Year {
    if month <= clock.month() {
        clock.year()
    } else {
        clock.year() - 1
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Timestamp
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A timestamp extracted from a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp {
    /// Whole seconds; compared as an instant.
    pub dt: DateTimeL,
    /// The year was inferred because the format has no year.
    pub year_implicit: bool,
}

/// `None` means the line is "unparseable"; not an error.
pub type TimestampOpt = Option<Timestamp>;

/// Create a `DateTimeL` from the passed values. Helper for tests.
///
/// Panics if the values are not a valid datetime.
#[cfg(test)]
pub fn ymdhms(
    fixedoffset: &FixedOffset,
    year: Year,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> DateTimeL {
    fixedoffset
        .with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

/// Decode the longest valid UTF-8 prefix of `data`.
///
/// Checking for ASCII first is much faster than a full UTF-8 check for
/// typical log lines. Falls back to [`encoding_rs`] for other data.
///
/// [`encoding_rs`]: https://docs.rs/encoding_rs/0.8.35/encoding_rs/struct.Encoding.html#method.utf8_valid_up_to
#[inline(always)]
pub fn u8_to_str(data: &[u8]) -> &str {
    let valid_up_to: usize = if data.is_ascii() {
        data.len()
    } else {
        ::encoding_rs::Encoding::utf8_valid_up_to(data)
    };
    // `valid_up_to` bytes were just checked
    unsafe { std::str::from_utf8_unchecked(&data[..valid_up_to]) }
}

/// Narrow the raw `line` to the bytes handed to the timestamp parser.
///
/// - at most [`LINE_READ_MAX`] bytes
/// - cut at the first `'\n'`, and a `'\r'` before it
/// - if `skip_to_bracket` then begin after the first [`WEB_DELIMITER`],
///   if there is one
pub fn line_timestamp_slice(
    line: &[u8],
    skip_to_bracket: bool,
) -> &[u8] {
    let mut slice: &[u8] = &line[..line.len().min(LINE_READ_MAX)];
    if let Some(at) = memchr(NLu8, slice) {
        slice = &slice[..at];
        if slice.last() == Some(&CRu8) {
            slice = &slice[..slice.len() - 1];
        }
    }
    if skip_to_bracket {
        if let Some(at) = memchr(WEB_DELIMITER, slice) {
            slice = &slice[at + 1..];
        }
    }

    slice
}

/// Parse a [`DateTimeL`] from the beginning of `data`; trailing text after
/// the datetime is ignored.
///
/// - `has_tz`, the `pattern` has a timezone (`%z`, `%:z`, etc.)?
/// - `tz_offset` fallback timezone offset when `!has_tz`
pub fn datetime_parse_from_str(
    data: &str,
    pattern: &DateTimePattern_str,
    has_tz: bool,
    tz_offset: &FixedOffset,
) -> DateTimeLOpt {
    defn!("(pattern {:?}, has_tz {}, tz_offset {:?}, data {:?})", pattern, has_tz, tz_offset, str_to_String_noraw(data));

    if has_tz {
        match DateTime::parse_and_remainder(data, pattern) {
            Ok((dt, _remainder)) => {
                defx!("return Some({:?})", dt);

                Some(dt)
            }
            Err(_err) => {
                defx!("DateTime::parse_and_remainder failed ParseError: {}", _err);

                None
            }
        }
    } else {
        // no timezone in `pattern` so first parse a `NaiveDateTime`
        let dt_naive: NaiveDateTime = match NaiveDateTime::parse_and_remainder(data, pattern) {
            Ok((val, _remainder)) => val,
            Err(_err) => {
                defx!("NaiveDateTime::parse_and_remainder failed ParseError: {}", _err);
                return None;
            }
        };
        // second convert the `NaiveDateTime` to `DateTime<FixedOffset>`
        let dt = tz_offset
            .from_local_datetime(&dt_naive)
            .earliest();
        defx!("return {:?}", dt);

        dt
    }
}

/// Create a new [`DateTimeL`] that is the passed `datetime` with the passed
/// `year`.
///
/// Returns `None` if the date does not exist in that year (i.e. `Feb 29`).
pub fn datetime_with_year(
    datetime: &DateTimeL,
    year: Year,
) -> DateTimeLOpt {
    datetime.with_year(year)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DateTimeParseInstr
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Instructions for extracting a [`Timestamp`] from a line, precomputed once
/// from a [`TimestampFormat`] and reused for every probed line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateTimeParseInstr {
    format: TimestampFormat,
    /// pattern passed to the parser; prefixed with `%Y ` when `!has_year`
    pattern: DateTimePattern_string,
    has_year: bool,
    has_tz: bool,
    skip_to_bracket: bool,
}

impl DateTimeParseInstr {
    pub fn new(format: &TimestampFormat) -> DateTimeParseInstr {
        let has_year = format.has_year();
        let pattern: DateTimePattern_string = match has_year {
            true => DateTimePattern_string::from(format.pattern()),
            false => {
                let mut pattern = DateTimePattern_string::from(DTP_YEAR_PREFIX);
                pattern.push_str(format.pattern());
                pattern
            }
        };

        DateTimeParseInstr {
            format: format.clone(),
            pattern,
            has_year,
            has_tz: format.has_tz(),
            skip_to_bracket: format.skip_to_bracket(),
        }
    }

    pub const fn format(&self) -> &TimestampFormat {
        &self.format
    }

    pub const fn has_year(&self) -> bool {
        self.has_year
    }

    /// Extract a [`Timestamp`] from the raw `line`. Returns `None` if the line
    /// does not match the format or is empty.
    pub fn extract(
        &self,
        line: &[u8],
        clock: &ReferenceClock,
    ) -> TimestampOpt {
        let slice: &[u8] = line_timestamp_slice(line, self.skip_to_bracket);
        defn!("(line {:?})", buffer_to_String_noraw(slice));
        if slice.is_empty() {
            defx!("empty line; return None");
            return None;
        }
        let data: &str = u8_to_str(slice);
        let tz_offset: FixedOffset = clock.offset();

        if self.has_year {
            let dt = datetime_parse_from_str(data, self.pattern.as_str(), self.has_tz, &tz_offset)?;
            defx!("return {:?}", dt);
            return Some(Timestamp {
                dt,
                year_implicit: false,
            });
        }

        let mut data_y = String::with_capacity(DATA_YEAR_PREFIX.len() + data.len());
        data_y.push_str(DATA_YEAR_PREFIX);
        data_y.push_str(data);
        let dt_dummy = datetime_parse_from_str(data_y.as_str(), self.pattern.as_str(), self.has_tz, &tz_offset)?;
        let year: Year = infer_year(dt_dummy.month(), clock);
        defo!("inferred year {} from month {}", year, dt_dummy.month());
        let dt = match datetime_with_year(&dt_dummy, year) {
            Some(dt) => dt,
            None => {
                defx!("{:?} does not exist in year {}; return None", dt_dummy, year);
                return None;
            }
        };
        defx!("return {:?}", dt);

        Some(Timestamp {
            dt,
            year_implicit: true,
        })
    }
}

/// Extract a [`Timestamp`] from the raw `line` using `format`.
///
/// Callers extracting from many lines should create one
/// [`DateTimeParseInstr`] and call [`DateTimeParseInstr::extract`].
pub fn extract_timestamp(
    line: &[u8],
    format: &TimestampFormat,
    clock: &ReferenceClock,
) -> TimestampOpt {
    DateTimeParseInstr::new(format).extract(line, clock)
}
