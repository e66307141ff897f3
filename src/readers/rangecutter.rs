// src/readers/rangecutter.rs

//! Cut the lines within a datetime range out of a sorted log file.
//!
//! Two [`TimeSearcher::search`] calls find the start and end offsets, then
//! the bytes between are copied to a writer.
//!
//! [`TimeSearcher::search`]: crate::readers::timesearcher::TimeSearcher#method.search

use crate::common::{Count, FPath, File, FileOffset};
use crate::data::datetime::{DateTimeL, ReferenceClock, TimestampFormat};
use crate::readers::blockreader::BlockSz;
use crate::readers::summary::Summary;
use crate::readers::timesearcher::TimeSearcher;

use std::io::{Read, Result, Seek, Write};

#[allow(unused_imports)]
use ::more_asserts::debug_assert_le;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Half-open range of byte offsets \[`start`, `end`).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RangeOffsets {
    pub start: FileOffset,
    pub end: FileOffset,
}

impl RangeOffsets {
    #[inline(always)]
    pub const fn len(&self) -> Count {
        self.end - self.start
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Find the byte range of lines with timestamps in \[`dt_from`, `dt_to`).
///
/// The second search begins at the result of the first so `start ≤ end`.
pub fn search_range<R: Read + Seek>(
    timesearcher: &mut TimeSearcher<R>,
    dt_from: &DateTimeL,
    dt_to: &DateTimeL,
) -> Result<RangeOffsets> {
    defn!("({:?}, {:?})", dt_from, dt_to);
    let filesz = timesearcher.filesz();
    let start: FileOffset = timesearcher.search(dt_from, 0, filesz)?;
    let end: FileOffset = timesearcher.search(dt_to, start, filesz)?;
    debug_assert_le!(start, end, "search returned end before start");
    defx!("return [{}, {})", start, end);

    Ok(RangeOffsets { start, end })
}

/// Write the lines with timestamps in \[`dt_from`, `dt_to`) to `writer`.
///
/// An I/O error aborts the cut; bytes already written are not retracted.
pub fn cut<R: Read + Seek, W: Write>(
    timesearcher: &mut TimeSearcher<R>,
    dt_from: &DateTimeL,
    dt_to: &DateTimeL,
    writer: &mut W,
) -> Result<Summary> {
    defn!("({:?}, {:?}, {:?})", timesearcher.path(), dt_from, dt_to);
    let range: RangeOffsets = search_range(timesearcher, dt_from, dt_to)?;
    let bytes_written: Count = timesearcher
        .linereader_mut()
        .copy_to_writer(range.start, range.end, writer)?;
    let summary = Summary {
        path: timesearcher.path().clone(),
        dt_from: *dt_from,
        dt_to: *dt_to,
        fileoffset_start: range.start,
        fileoffset_end: range.end,
        bytes_written,
        summaryblockreader: timesearcher.linereader.blockreader.summary(),
        summarylinereader: timesearcher.linereader.summary(),
        summarytimesearcher: timesearcher.summary(),
    };
    defx!("wrote {} bytes", bytes_written);

    Ok(summary)
}

/// Open the file at `path` and [`cut`] it.
pub fn cut_file<W: Write>(
    path: &FPath,
    blocksz: BlockSz,
    format: &TimestampFormat,
    clock: &ReferenceClock,
    dt_from: &DateTimeL,
    dt_to: &DateTimeL,
    writer: &mut W,
) -> Result<Summary> {
    defñ!("({:?})", path);
    let mut timesearcher: TimeSearcher<File> = TimeSearcher::new(path.clone(), blocksz, format, *clock)?;

    cut(&mut timesearcher, dt_from, dt_to, writer)
}

/// [`cut`] an already opened stream, e.g. a `Cursor` over bytes.
#[allow(clippy::too_many_arguments)]
pub fn cut_reader<R: Read + Seek, W: Write>(
    path: FPath,
    reader: R,
    blocksz: BlockSz,
    format: &TimestampFormat,
    clock: &ReferenceClock,
    dt_from: &DateTimeL,
    dt_to: &DateTimeL,
    writer: &mut W,
) -> Result<Summary> {
    defñ!("({:?})", path);
    let mut timesearcher: TimeSearcher<R> = TimeSearcher::from_reader(path, reader, blocksz, format, *clock)?;

    cut(&mut timesearcher, dt_from, dt_to, writer)
}
