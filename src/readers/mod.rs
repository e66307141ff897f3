// src/readers/mod.rs

//! "Readers" for _logcutlib_.
//!
//! ## Overview of readers
//!
//! * [`rangecutter::cut`] drives a [`TimeSearcher`] to find the byte range of
//!   a datetime range, then copies it.
//! * A `TimeSearcher` drives a [`LineReader`] to find line boundaries and
//!   read line prefixes for timestamp extraction.
//! * A `LineReader` drives a [`BlockReader`] to read [`Block`s].
//!
//! <br/>
//!
//! * A `BlockReader` only handles `u8` bytes.
//! * A `LineReader` only handles `u8` bytes; it finds `'\n'` bytes.
//! * A `TimeSearcher` converts a bounded line prefix to `str` for parsing.
//!
//! <br/>
//!
//! _These are not rust "Readers"; these structs do not implement the trait
//! [`Read`]. These are "readers" in an informal sense._
//!
//! [`Read`]: std::io::Read
//! [`Block`s]: crate::readers::blockreader::Block
//! [`BlockReader`]: crate::readers::blockreader::BlockReader
//! [`LineReader`]: crate::readers::linereader::LineReader
//! [`TimeSearcher`]: crate::readers::timesearcher::TimeSearcher
//! [`rangecutter::cut`]: crate::readers::rangecutter::cut

pub mod blockreader;
pub mod linereader;
pub mod rangecutter;
pub mod summary;
pub mod timesearcher;
