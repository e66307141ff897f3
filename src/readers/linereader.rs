// src/readers/linereader.rs

//! Implements a [`LineReader`], the driver of locating line boundaries
//! using a [`BlockReader`].
//!
//! [`BlockReader`]: crate::readers::blockreader::BlockReader

use crate::common::{Bytes, Count, FPath, File, FileOffset, FileSz, NLu8, ResultS3};
use crate::data::datetime::LINE_READ_MAX;
#[cfg(any(debug_assertions, test))]
use crate::debug::printers::buffer_to_String_noraw;
use crate::readers::blockreader::{BlockIndex, BlockOffset, BlockP, BlockReader, BlockSz, ResultS3ReadBlock};

use std::fmt;
use std::io::{Read, Result, Seek, Write};

use ::memchr::{memchr, memrchr};
#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LineReader
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A specialized reader that uses [`BlockReader`] to find line boundaries in
/// a file.
///
/// Every `FileOffset` returned by a `LineReader` is a _line start_: either
/// `0`, the file size, or the offset immediately after a `'\n'`.
///
/// Lines are never stored. The `LineReader` keeps a read cursor, positioned
/// by [`next_line_start`], [`line_start_at_or_before`], and [`seek`], from
/// which [`read_line_prefix`] reads a bounded prefix of one line.
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`next_line_start`]: self::LineReader#method.next_line_start
/// [`line_start_at_or_before`]: self::LineReader#method.line_start_at_or_before
/// [`seek`]: self::LineReader#method.seek
/// [`read_line_prefix`]: self::LineReader#method.read_line_prefix
/// [`Read`]: std::io::Read
pub struct LineReader<R = File> {
    pub(crate) blockreader: BlockReader<R>,
    /// Read cursor, always a line start.
    cursor: FileOffset,
    /// Scratch buffer for `read_line_prefix`, at most `LINE_READ_MAX` bytes.
    buffer: Bytes,
    /// `Count` of calls to `next_line_start`.
    pub(super) count_next_line_start: Count,
    /// `Count` of calls to `line_start_at_or_before`.
    pub(super) count_line_start_at_or_before: Count,
    /// `Count` of calls to `read_line_prefix`.
    pub(super) count_read_line_prefix: Count,
}

impl<R> fmt::Debug for LineReader<R> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("LineReader")
            .field("blockreader", &self.blockreader)
            .field("cursor", &self.cursor)
            .field("next_line_start", &self.count_next_line_start)
            .field("line_start_at_or_before", &self.count_line_start_at_or_before)
            .field("read_line_prefix", &self.count_read_line_prefix)
            .finish()
    }
}

#[allow(non_snake_case)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryLineReader {
    pub linereader_next_line_start: Count,
    pub linereader_line_start_at_or_before: Count,
    pub linereader_read_line_prefix: Count,
}

impl LineReader<File> {
    /// Create a new `LineReader` for the file at `path`.
    pub fn new(
        path: FPath,
        blocksz: BlockSz,
    ) -> Result<LineReader<File>> {
        defñ!("({:?}, {:?})", path, blocksz);
        let blockreader = BlockReader::new(path, blocksz)?;

        Ok(LineReader::from_blockreader(blockreader))
    }
}

impl<R: Read + Seek> LineReader<R> {
    /// Create a new `LineReader` over an already opened stream.
    pub fn from_reader(
        path: FPath,
        reader: R,
        blocksz: BlockSz,
    ) -> Result<LineReader<R>> {
        defñ!("({:?}, …, {:?})", path, blocksz);
        let blockreader = BlockReader::from_reader(path, reader, blocksz)?;

        Ok(LineReader::from_blockreader(blockreader))
    }

    pub fn from_blockreader(blockreader: BlockReader<R>) -> LineReader<R> {
        LineReader {
            blockreader,
            cursor: 0,
            buffer: Bytes::with_capacity(LINE_READ_MAX),
            count_next_line_start: 0,
            count_line_start_at_or_before: 0,
            count_read_line_prefix: 0,
        }
    }

    #[inline(always)]
    pub const fn path(&self) -> &FPath {
        self.blockreader.path()
    }

    #[inline(always)]
    pub const fn filesz(&self) -> FileSz {
        self.blockreader.filesz()
    }

    #[inline(always)]
    pub const fn blocksz(&self) -> BlockSz {
        self.blockreader.blocksz()
    }

    /// Current read cursor.
    #[inline(always)]
    pub const fn cursor(&self) -> FileOffset {
        self.cursor
    }

    /// Position the read cursor at `fileoffset`, clamped to the file size.
    ///
    /// The caller is responsible for passing a line start.
    pub fn seek(
        &mut self,
        fileoffset: FileOffset,
    ) {
        self.cursor = std::cmp::min(fileoffset, self.filesz());
        defñ!("({}) cursor {}", fileoffset, self.cursor);
    }

    /// Read the `Block` holding `fileoffset`. `None` if `fileoffset` is at or
    /// past the end of the file.
    fn block_at(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<Option<(BlockP, BlockIndex)>> {
        match self
            .blockreader
            .read_block_at_fileoffset(fileoffset)
        {
            ResultS3::Found(val) => Ok(Some(val)),
            ResultS3::Done => Ok(None),
            ResultS3::Err(err) => Err(err),
        }
    }

    /// Return the start of the line after the line holding `fileoffset`,
    /// i.e. the offset immediately after the first `'\n'` at or after
    /// `fileoffset`.
    ///
    /// If there is no `'\n'` then returns the file size.
    /// The read cursor is positioned at the returned offset.
    pub fn next_line_start(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<FileOffset> {
        defn!("({})", fileoffset);
        self.count_next_line_start += 1;
        let filesz: FileSz = self.filesz();
        let mut at: FileOffset = fileoffset;
        let mut result: FileOffset = filesz;
        // each pass consumes at least one byte
        while at < filesz {
            let (blockp, bi) = match self.block_at(at)? {
                Some(val) => val,
                None => break,
            };
            let slice: &[u8] = &blockp[bi..];
            match memchr(NLu8, slice) {
                Some(index) => {
                    result = at + (index as FileOffset) + 1;
                    defo!("found newline at {}", at + index as FileOffset);
                    break;
                }
                None => {
                    at += slice.len() as FileOffset;
                }
            }
        }
        self.cursor = result;
        defx!("({}) return {}", fileoffset, result);

        Ok(result)
    }

    /// Return the start of the line holding `fileoffset`, i.e. the offset
    /// immediately after the last `'\n'` before `fileoffset`, or `0`.
    ///
    /// A `fileoffset` that is already a line start is returned as-is.
    /// A `fileoffset` past the end of the file is clamped to the file size.
    /// The read cursor is positioned at the returned offset.
    pub fn line_start_at_or_before(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<FileOffset> {
        defn!("({})", fileoffset);
        self.count_line_start_at_or_before += 1;
        // search bytes [0, end) backwards, one block at a time
        let mut end: FileOffset = std::cmp::min(fileoffset, self.filesz());
        let mut result: FileOffset = 0;
        let blocksz: BlockSz = self.blocksz();
        while end > 0 {
            let blockoffset: BlockOffset = BlockReader::<R>::block_offset_at_file_offset(end - 1, blocksz);
            let blockp: BlockP = match self.blockreader.read_block(blockoffset) {
                ResultS3ReadBlock::Found(blockp) => blockp,
                ResultS3ReadBlock::Done => break,
                ResultS3ReadBlock::Err(err) => {
                    defx!("read_block({}) Err {}", blockoffset, err);
                    return Err(err);
                }
            };
            let block_beg: FileOffset = BlockReader::<R>::file_offset_at_block_offset(blockoffset, blocksz);
            let bi_end: BlockIndex = (end - block_beg) as BlockIndex;
            debug_assert_le!(bi_end, blockp.len());
            match memrchr(NLu8, &blockp[..bi_end]) {
                Some(index) => {
                    result = block_beg + (index as FileOffset) + 1;
                    defo!("found newline at {}", block_beg + index as FileOffset);
                    break;
                }
                None => {
                    end = block_beg;
                }
            }
        }
        self.cursor = result;
        defx!("({}) return {}", fileoffset, result);

        Ok(result)
    }

    /// Read the leading bytes of the line at the read cursor into the
    /// scratch buffer. Reads at most [`LINE_READ_MAX`] bytes and stops after
    /// the first `'\n'`.
    ///
    /// At the end of the file the returned slice is empty.
    /// The read cursor does not move.
    ///
    /// [`LINE_READ_MAX`]: crate::data::datetime::LINE_READ_MAX
    pub fn read_line_prefix(&mut self) -> Result<&[u8]> {
        defn!("() cursor {}", self.cursor);
        self.count_read_line_prefix += 1;
        self.buffer.clear();
        let filesz: FileSz = self.filesz();
        let mut at: FileOffset = self.cursor;
        while at < filesz && self.buffer.len() < LINE_READ_MAX {
            let (blockp, bi) = match self
                .blockreader
                .read_block_at_fileoffset(at)
            {
                ResultS3::Found(val) => val,
                ResultS3::Done => break,
                ResultS3::Err(err) => {
                    defx!("read_block_at_fileoffset({}) Err {}", at, err);
                    return Err(err);
                }
            };
            let want: usize = LINE_READ_MAX - self.buffer.len();
            let mut slice: &[u8] = &blockp[bi..];
            if slice.len() > want {
                slice = &slice[..want];
            }
            match memchr(NLu8, slice) {
                Some(index) => {
                    self.buffer.extend_from_slice(&slice[..=index]);
                    break;
                }
                None => {
                    self.buffer.extend_from_slice(slice);
                    at += slice.len() as FileOffset;
                }
            }
        }
        defx!("return {:?}", buffer_to_String_noraw(&self.buffer));

        Ok(&self.buffer)
    }

    /// Copy bytes \[`fileoffset_beg`, `fileoffset_end`) to `writer`.
    pub fn copy_to_writer<W: Write>(
        &mut self,
        fileoffset_beg: FileOffset,
        fileoffset_end: FileOffset,
        writer: &mut W,
    ) -> Result<Count> {
        self.blockreader
            .copy_to_writer(fileoffset_beg, fileoffset_end, writer)
    }

    #[allow(non_snake_case)]
    pub fn summary(&self) -> SummaryLineReader {
        SummaryLineReader {
            linereader_next_line_start: self.count_next_line_start,
            linereader_line_start_at_or_before: self.count_line_start_at_or_before,
            linereader_read_line_prefix: self.count_read_line_prefix,
        }
    }
}
