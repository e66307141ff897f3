// src/lib.rs

//! _logcutlib_ finds and copies the byte range of a chronologically sorted
//! log file whose lines have timestamps within a `[from, to)` interval.
//!
//! The file is treated as a sorted array of variable-length lines; the
//! boundaries are found with a binary search over byte offsets so only
//! _O(log n)_ blocks are read.
//!
//! * [`data`] holds the timestamp extraction and date expression parsing.
//! * [`readers`] holds the readers that locate lines, search, and cut.
//!
//! The _logcut_ binary program drives [`cut`] once per passed file.
//!
//! [`cut`]: crate::readers::rangecutter::cut

pub mod common;
pub mod data;
pub mod debug;
pub mod readers;
#[cfg(test)]
pub mod tests;
