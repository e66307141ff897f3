// src/readers/timesearcher.rs

//! Implements a [`TimeSearcher`], the driver of binary searching a sorted
//! log file for the first line at or after a datetime.
//!
//! [`TimeSearcher`]: crate::readers::timesearcher::TimeSearcher

use crate::common::{Count, FPath, File, FileOffset, FileSz};
use crate::data::datetime::{
    DateTimeL,
    DateTimeParseInstr,
    ReferenceClock,
    TimestampFormat,
    TimestampOpt,
};
#[cfg(any(debug_assertions, test))]
use crate::debug::printers::buffer_to_String_noraw;
use crate::readers::blockreader::BlockSz;
use crate::readers::linereader::LineReader;

use std::fmt;
use std::io::{Read, Result, Seek};

#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le, debug_assert_lt};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimeSearcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A `TimeSearcher` binary searches the byte offsets of a file whose lines
/// are sorted by timestamp.
///
/// The search window is a half-open range of byte offsets. Lines without a
/// parseable timestamp (blank lines, stack traces, continuation lines) are
/// skipped over by probing neighboring lines.
pub struct TimeSearcher<R = File> {
    pub(crate) linereader: LineReader<R>,
    dtpi: DateTimeParseInstr,
    clock: ReferenceClock,
    /// `Count` of calls to `search`.
    pub(super) count_searches: Count,
    /// `Count` of binary search iterations over all calls to `search`.
    pub(super) count_iterations: Count,
    /// `Count` of lines handed to the timestamp extractor.
    pub(super) count_lines_probed: Count,
    /// `Count` of probed lines without a parseable timestamp.
    pub(super) count_lines_unparseable: Count,
}

impl<R> fmt::Debug for TimeSearcher<R> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("TimeSearcher")
            .field("linereader", &self.linereader)
            .field("format", self.dtpi.format())
            .field("clock", &self.clock)
            .field("searches", &self.count_searches)
            .field("iterations", &self.count_iterations)
            .field("lines probed", &self.count_lines_probed)
            .field("lines unparseable", &self.count_lines_unparseable)
            .finish()
    }
}

#[allow(non_snake_case)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryTimeSearcher {
    pub timesearcher_searches: Count,
    pub timesearcher_iterations: Count,
    pub timesearcher_lines_probed: Count,
    pub timesearcher_lines_unparseable: Count,
}

impl TimeSearcher<File> {
    /// Create a new `TimeSearcher` for the file at `path`.
    pub fn new(
        path: FPath,
        blocksz: BlockSz,
        format: &TimestampFormat,
        clock: ReferenceClock,
    ) -> Result<TimeSearcher<File>> {
        defñ!("({:?}, {:?}, {:?})", path, blocksz, format);
        let linereader = LineReader::new(path, blocksz)?;

        Ok(TimeSearcher::from_linereader(linereader, format, clock))
    }
}

impl<R: Read + Seek> TimeSearcher<R> {
    /// Create a new `TimeSearcher` over an already opened stream.
    pub fn from_reader(
        path: FPath,
        reader: R,
        blocksz: BlockSz,
        format: &TimestampFormat,
        clock: ReferenceClock,
    ) -> Result<TimeSearcher<R>> {
        defñ!("({:?}, …, {:?}, {:?})", path, blocksz, format);
        let linereader = LineReader::from_reader(path, reader, blocksz)?;

        Ok(TimeSearcher::from_linereader(linereader, format, clock))
    }

    pub fn from_linereader(
        linereader: LineReader<R>,
        format: &TimestampFormat,
        clock: ReferenceClock,
    ) -> TimeSearcher<R> {
        TimeSearcher {
            linereader,
            dtpi: DateTimeParseInstr::new(format),
            clock,
            count_searches: 0,
            count_iterations: 0,
            count_lines_probed: 0,
            count_lines_unparseable: 0,
        }
    }

    #[inline(always)]
    pub const fn path(&self) -> &FPath {
        self.linereader.path()
    }

    #[inline(always)]
    pub const fn filesz(&self) -> FileSz {
        self.linereader.filesz()
    }

    #[inline(always)]
    pub const fn clock(&self) -> &ReferenceClock {
        &self.clock
    }

    #[inline(always)]
    pub fn linereader_mut(&mut self) -> &mut LineReader<R> {
        &mut self.linereader
    }

    /// Extract the timestamp of the line starting at `fileoffset`.
    ///
    /// `Ok(None)` if the line has no parseable timestamp, or `fileoffset` is
    /// the end of the file.
    pub fn timestamp_at(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<TimestampOpt> {
        self.linereader.seek(fileoffset);
        let line: &[u8] = self.linereader.read_line_prefix()?;
        self.count_lines_probed += 1;
        let ts: TimestampOpt = self.dtpi.extract(line, &self.clock);
        if ts.is_none() {
            self.count_lines_unparseable += 1;
        }
        defñ!("({}) {:?} {:?}", fileoffset, ts, buffer_to_String_noraw(line));

        Ok(ts)
    }

    /// Round `fileoffset` up to a line start, at most the file size.
    fn line_start_at_or_after(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<FileOffset> {
        if fileoffset == 0 || fileoffset >= self.filesz() {
            return Ok(std::cmp::min(fileoffset, self.filesz()));
        }
        self.linereader
            .next_line_start(fileoffset - 1)
    }

    /// Binary search the window \[`low`, `high`) for the start of the first
    /// line with a parseable timestamp at or after `target`.
    ///
    /// Returns `high` if there is no such line.
    /// `low` and `high` are rounded up to line starts, and `high` is clamped
    /// to the file size.
    ///
    /// Lines with equal timestamps resolve to the earliest of them.
    /// Unparseable lines are never returned unless `high` is; unparseable
    /// lines before the returned offset belong to the preceding record.
    ///
    /// The read cursor of the `LineReader` is left at the returned offset.
    pub fn search(
        &mut self,
        target: &DateTimeL,
        low: FileOffset,
        high: FileOffset,
    ) -> Result<FileOffset> {
        defn!("({:?}, {}, {})", target, low, high);
        self.count_searches += 1;
        let mut high: FileOffset = self.line_start_at_or_after(std::cmp::min(high, self.filesz()))?;
        let mut low: FileOffset = self.line_start_at_or_after(std::cmp::min(low, high))?;
        // a hard cap on neighbor probing; the count of lines in the window is
        // never more than its count of bytes
        let cap: Count = high - low + 1;

        while low < high {
            self.count_iterations += 1;
            let mid: FileOffset = low + (high - low) / 2;
            let mut probe: FileOffset = self
                .linereader
                .line_start_at_or_before(mid)?;
            debug_assert_le!(low, probe, "probe is before low");
            debug_assert_lt!(probe, high, "probe is at or after high");
            let mut ts: TimestampOpt = self.timestamp_at(probe)?;
            // step backward over unparseable lines, never before `low`
            let mut steps: Count = 0;
            while ts.is_none() && probe > low && steps < cap {
                probe = self
                    .linereader
                    .line_start_at_or_before(probe - 1)?;
                ts = self.timestamp_at(probe)?;
                steps += 1;
            }
            defo!("low {}, mid {}, high {}, probe {}, ts {:?}", low, mid, high, probe, ts);
            match ts {
                Some(ts) if *target <= ts.dt => {
                    // the boundary is at or before the probed line
                    high = probe;
                }
                _ => {
                    // the boundary is after the line holding `mid`; skip
                    // forward over unparseable lines, never past `high`
                    let mut next: FileOffset = std::cmp::min(self.linereader.next_line_start(mid)?, high);
                    let mut steps: Count = 0;
                    while next < high && steps < cap && self.timestamp_at(next)?.is_none() {
                        next = std::cmp::min(self.linereader.next_line_start(next)?, high);
                        steps += 1;
                    }
                    debug_assert_lt!(low, next, "low did not advance");
                    low = next;
                }
            }
        }
        self.linereader.seek(low);
        defx!("({:?}) return {}", target, low);

        Ok(low)
    }

    #[allow(non_snake_case)]
    pub fn summary(&self) -> SummaryTimeSearcher {
        SummaryTimeSearcher {
            timesearcher_searches: self.count_searches,
            timesearcher_iterations: self.count_iterations,
            timesearcher_lines_probed: self.count_lines_probed,
            timesearcher_lines_unparseable: self.count_lines_unparseable,
        }
    }
}
