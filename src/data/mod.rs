// src/data/mod.rs

//! The `data` module is timestamp extraction from raw log lines and
//! resolution of user-passed date expressions.
//!
//! ## Definitions of data
//!
//! ### Line
//!
//! A "line" is sequence of bytes that:
//!
//! * begin after a prior "line" or the beginning of a file.
//! * end with a newline character `'\n'` or the end of a file.
//!
//! Lines are never stored. A bounded prefix of a line is read on demand by
//! a [`LineReader`].
//!
//! ### Timestamp
//!
//! A [`Timestamp`] is a point in time parsed from the leading bytes of a
//! line using a [`TimestampFormat`]. A line without a parseable timestamp is
//! not an error; it is skipped over during searching.
//!
//! ### Date expression
//!
//! A user-passed string like `"2 hours ago"` or `"20200102T120000"`
//! resolved by [`resolve_date_expr`] to a search boundary.
//!
//! [`LineReader`]: crate::readers::linereader::LineReader
//! [`Timestamp`]: crate::data::datetime::Timestamp
//! [`TimestampFormat`]: crate::data::datetime::TimestampFormat
//! [`resolve_date_expr`]: crate::data::dtexpr::resolve_date_expr

pub mod datetime;
pub mod dtexpr;
