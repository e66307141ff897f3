// src/readers/summary.rs

//! Implements `Summary` statistics tracking struct.

#![allow(non_snake_case)]

use crate::common::{Count, FPath, FileOffset};
use crate::data::datetime::DateTimeL;
use crate::readers::blockreader::SummaryBlockReader;
use crate::readers::linereader::SummaryLineReader;
use crate::readers::timesearcher::SummaryTimeSearcher;

use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Summary
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Statistics of cutting one file, printed with `--summary`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Summary {
    pub path: FPath,
    /// resolved lower boundary, inclusive
    pub dt_from: DateTimeL,
    /// resolved upper boundary, exclusive
    pub dt_to: DateTimeL,
    /// start of the copied range, inclusive
    pub fileoffset_start: FileOffset,
    /// end of the copied range, exclusive
    pub fileoffset_end: FileOffset,
    /// `Count` of bytes written to the output
    pub bytes_written: Count,
    pub summaryblockreader: SummaryBlockReader,
    pub summarylinereader: SummaryLineReader,
    pub summarytimesearcher: SummaryTimeSearcher,
}

impl Summary {
    /// Width of the left-hand labels in `Display`.
    const INDENT: &'static str = "  ";
}

impl fmt::Display for Summary {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        let indent: &str = Summary::INDENT;
        let br: &SummaryBlockReader = &self.summaryblockreader;
        let lr: &SummaryLineReader = &self.summarylinereader;
        let ts: &SummaryTimeSearcher = &self.summarytimesearcher;
        writeln!(f, "File: {:?}", self.path)?;
        writeln!(f, "{}file size     : {1} (0x{1:X}) (bytes)", indent, br.blockreader_bytes_total)?;
        writeln!(f, "{}datetime from : {}", indent, self.dt_from.to_rfc3339())?;
        writeln!(f, "{}datetime to   : {}", indent, self.dt_to.to_rfc3339())?;
        writeln!(
            f,
            "{}range         : [{}, {}) ({} bytes)",
            indent,
            self.fileoffset_start,
            self.fileoffset_end,
            self.fileoffset_end - self.fileoffset_start,
        )?;
        writeln!(f, "{}bytes written : {}", indent, self.bytes_written)?;
        writeln!(f, "{}bytes read    : {1} (0x{1:X})", indent, br.blockreader_bytes)?;
        writeln!(f, "{}block size    : {1} (0x{1:X})", indent, br.blockreader_blocksz)?;
        writeln!(f, "{}blocks read   : {}", indent, br.blockreader_blocks)?;
        writeln!(f, "{}blocks total  : {}", indent, br.blockreader_blocks_total)?;
        writeln!(
            f,
            "{}caching       : BlockReader::read_block() LRU cache hit {}, miss {}, put {}",
            indent,
            br.blockreader_read_block_lru_cache_hit,
            br.blockreader_read_block_lru_cache_miss,
            br.blockreader_read_block_lru_cache_put,
        )?;
        writeln!(
            f,
            "{}line lookups  : next {}, previous {}, prefix reads {}",
            indent,
            lr.linereader_next_line_start,
            lr.linereader_line_start_at_or_before,
            lr.linereader_read_line_prefix,
        )?;
        writeln!(f, "{}searches      : {}", indent, ts.timesearcher_searches)?;
        writeln!(f, "{}iterations    : {}", indent, ts.timesearcher_iterations)?;
        writeln!(f, "{}lines probed  : {}", indent, ts.timesearcher_lines_probed)?;
        write!(f, "{}unparseable   : {}", indent, ts.timesearcher_lines_unparseable)
    }
}
