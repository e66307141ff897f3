// src/readers/blockreader.rs

//! Implements [`Block`s] and [`BlockReader`], the driver of reading bytes
//! from a file or any other seekable byte stream.
//!
//! [`Block`s]: crate::readers::blockreader::Block
//! [`BlockReader`]: crate::readers::blockreader::BlockReader

use crate::common::{Count, FPath, File, FileOffset, FileOpenOptions, FileSz, ResultS3};
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn, e_err, e_wrn};

use std::fmt;
use std::io::prelude::Read;
use std::io::{Error, ErrorKind, Result, Seek, SeekFrom, Write};
use std::num::NonZeroUsize;
use std::sync::Arc;

use ::lru::LruCache;
#[allow(unused_imports)]
use ::more_asserts::{assert_ge, assert_le, debug_assert_ge, debug_assert_le, debug_assert_lt};
#[allow(unused_imports)]
use ::si_trace_print::{def1n, def1o, def1x, defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// [`Block`] Size in bytes.
pub type BlockSz = u64;

/// Byte offset (Index) _into_ a [`Block`] from the beginning of that `Block`.
/// Zero based.
pub type BlockIndex = usize;

/// Offset into a file in [`Block`s], depends on [`BlockSz`] runtime value.
/// Zero based.
///
/// [`Block`s]: self::Block
pub type BlockOffset = u64;

/// A _Block_ of bytes read from the underlying stream. Never changed after
/// being read.
pub type Block = Vec<u8>;

/// Thread-safe [Atomic Reference Counting Pointer] to a [`Block`].
///
/// [Atomic Reference Counting Pointer]: std::sync::Arc
pub type BlockP = Arc<Block>;

/// Internal LRU cache for [`BlockReader::read_block`].
pub type BlocksLRUCache = LruCache<BlockOffset, BlockP>;

/// [`BlockReader::read_block`] result.
///
/// `Done` means the requested block is at or past the end of the stream.
pub type ResultS3ReadBlock = ResultS3<BlockP, Error>;

/// Minimum block size in bytes.
pub const BLOCKSZ_MIN: BlockSz = 1;

/// Maximum block size in bytes.
pub const BLOCKSZ_MAX: BlockSz = 0xFFFFFF;

/// Default block size in bytes.
pub const BLOCKSZ_DEF: BlockSz = 0x2000;

/// A `BlockReader` reads a seekable byte stream in [`Block`s] of a fixed
/// [`BlockSz`]. The last `Block` may be shorter.
///
/// Recently read `Block`s are kept in a small LRU cache; the binary search
/// repeatedly reads the same few blocks around a probe offset.
///
/// A `BlockReader` does not know about lines or `char`s, only bytes `u8`.
///
/// The type parameter `R` is typically a [`File`], or a [`Cursor`] in
/// tests.
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`Block`s]: self::Block
/// [`File`]: std::fs::File
/// [`Cursor`]: std::io::Cursor
/// [`Read`]: std::io::Read
pub struct BlockReader<R = File> {
    /// Path to the file, or a name for a stream; used in messages.
    path: FPath,
    /// The stream. Only read and seeked.
    reader: R,
    /// Size of the stream in bytes, measured once in `from_reader`.
    filesz: FileSz,
    /// Size of the stream in `Block`s.
    blockn: Count,
    /// Standard `Block` size in bytes.
    blocksz: BlockSz,
    /// `Count` of bytes read from the stream.
    count_bytes: Count,
    /// `Count` of `Block`s read from the stream.
    count_blocks_read: Count,
    /// Internal [LRU cache] for `fn read_block()`. Lookups _O(1)_.
    ///
    /// [LRU cache]: https://docs.rs/lru/0.13.0/lru/index.html
    read_block_lru_cache: BlocksLRUCache,
    /// Enable or disable use of `read_block_lru_cache`.
    ///
    /// Users should call functions `LRU_cache_enable` or `LRU_cache_disable`.
    read_block_lru_cache_enabled: bool,
    /// Internal LRU cache `Count` of lookup hits.
    pub(crate) read_block_cache_lru_hit: Count,
    /// Internal LRU cache `Count` of lookup misses.
    pub(crate) read_block_cache_lru_miss: Count,
    /// Internal LRU cache `Count` of lookup `.put`.
    pub(crate) read_block_cache_lru_put: Count,
}

impl<R> fmt::Debug for BlockReader<R> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("BlockReader")
            .field("path", &self.path)
            .field("filesz", &self.filesz)
            .field("blockn", &self.blockn)
            .field("blocksz", &self.blocksz)
            .field("blocks read", &self.count_blocks_read)
            .field("bytes read", &self.count_bytes)
            .field("cache LRU hit", &self.read_block_cache_lru_hit)
            .field("miss", &self.read_block_cache_lru_miss)
            .field("put", &self.read_block_cache_lru_put)
            .finish()
    }
}

/// Statistics of a [`BlockReader`], copied out for printing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryBlockReader {
    pub blockreader_bytes: Count,
    pub blockreader_bytes_total: FileSz,
    pub blockreader_blocks: Count,
    pub blockreader_blocks_total: Count,
    pub blockreader_blocksz: BlockSz,
    pub blockreader_read_block_lru_cache_hit: Count,
    pub blockreader_read_block_lru_cache_miss: Count,
    pub blockreader_read_block_lru_cache_put: Count,
}

impl BlockReader<File> {
    /// Create a new `BlockReader` for the file at `path`.
    ///
    /// Returns an `Error` if the file cannot be opened, is a directory, or
    /// `blocksz` is out of range.
    pub fn new(
        path: FPath,
        blocksz: BlockSz,
    ) -> Result<BlockReader<File>> {
        def1n!("({:?}, {:?})", path, blocksz);
        let mut open_options = FileOpenOptions::new();
        let file: File = match open_options
            .read(true)
            .open(path.as_str())
        {
            Ok(val) => val,
            Err(err) => {
                def1x!("return Err {}", err);
                return Err(err);
            }
        };
        let metadata = file.metadata()?;
        if metadata.is_dir() {
            def1x!("return Err {:?} is a directory", path);
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Path is a directory {:?}", path),
            ));
        }
        let blockreader = BlockReader::from_reader(path, file, blocksz);
        def1x!("return {:?}", blockreader);

        blockreader
    }
}

/// Implements the `BlockReader`.
impl<R: Read + Seek> BlockReader<R> {
    /// Cache slots for `read_block` LRU cache.
    const READ_BLOCK_LRU_CACHE_SZ: usize = 4;

    /// Default state of LRU cache.
    const CACHE_ENABLE_DEFAULT: bool = true;

    /// Create a new `BlockReader` over an already opened stream `reader`.
    ///
    /// `path` is only used in messages.
    pub fn from_reader(
        path: FPath,
        mut reader: R,
        blocksz: BlockSz,
    ) -> Result<BlockReader<R>> {
        defn!("({:?}, …, {:?})", path, blocksz);
        if !(BLOCKSZ_MIN..=BLOCKSZ_MAX).contains(&blocksz) {
            defx!("return Err; bad blocksz {}", blocksz);
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Block Size must be {} ≤ BLOCKSZ ≤ {}, it was {}", BLOCKSZ_MIN, BLOCKSZ_MAX, blocksz),
            ));
        }
        let filesz: FileSz = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        let blockn: Count = BlockReader::<R>::count_blocks(filesz, blocksz);
        let cache_sz = match NonZeroUsize::new(BlockReader::<R>::READ_BLOCK_LRU_CACHE_SZ) {
            Some(val) => val,
            None => NonZeroUsize::MIN,
        };
        defx!("filesz {}, blockn {}", filesz, blockn);

        Ok(BlockReader {
            path,
            reader,
            filesz,
            blockn,
            blocksz,
            count_bytes: 0,
            count_blocks_read: 0,
            read_block_lru_cache: BlocksLRUCache::new(cache_sz),
            read_block_lru_cache_enabled: BlockReader::<R>::CACHE_ENABLE_DEFAULT,
            read_block_cache_lru_hit: 0,
            read_block_cache_lru_miss: 0,
            read_block_cache_lru_put: 0,
        })
    }

    #[inline(always)]
    pub const fn path(&self) -> &FPath {
        &self.path
    }

    /// File size in bytes.
    #[inline(always)]
    pub const fn filesz(&self) -> FileSz {
        self.filesz
    }

    #[inline(always)]
    pub const fn blocksz(&self) -> BlockSz {
        self.blocksz
    }

    /// File size in `Block`s.
    #[inline(always)]
    pub const fn blockn(&self) -> Count {
        self.blockn
    }

    /// Return nearest preceding `BlockOffset` for given `FileOffset`.
    #[inline(always)]
    pub const fn block_offset_at_file_offset(
        file_offset: FileOffset,
        blocksz: BlockSz,
    ) -> BlockOffset {
        (file_offset / blocksz) as BlockOffset
    }

    #[inline(always)]
    pub const fn block_offset_at_file_offset_self(
        &self,
        file_offset: FileOffset,
    ) -> BlockOffset {
        file_offset / self.blocksz
    }

    /// Return `FileOffset` (byte offset) at given `BlockOffset`.
    #[inline(always)]
    pub const fn file_offset_at_block_offset(
        block_offset: BlockOffset,
        blocksz: BlockSz,
    ) -> FileOffset {
        (block_offset * blocksz) as FileOffset
    }

    #[inline(always)]
    pub const fn file_offset_at_block_offset_self(
        &self,
        block_offset: BlockOffset,
    ) -> FileOffset {
        block_offset * self.blocksz
    }

    /// Return `BlockIndex` (byte offset into a `Block`) for the `Block` that
    /// corresponds to the passed `FileOffset`.
    #[inline(always)]
    pub const fn block_index_at_file_offset(
        file_offset: FileOffset,
        blocksz: BlockSz,
    ) -> BlockIndex {
        (file_offset % blocksz) as BlockIndex
    }

    #[inline(always)]
    pub const fn block_index_at_file_offset_self(
        &self,
        file_offset: FileOffset,
    ) -> BlockIndex {
        (file_offset % self.blocksz) as BlockIndex
    }

    /// Return `Count` of [`Block`s] in a file.
    ///
    /// Not a count of `Block`s that have been read; the calculated
    /// count of `Block`s based on the `FileSz`.
    ///
    /// [`Block`s]: crate::readers::blockreader::Block
    #[inline(always)]
    pub const fn count_blocks(
        filesz: FileSz,
        blocksz: BlockSz,
    ) -> Count {
        filesz / blocksz + (if filesz % blocksz > 0 { 1 } else { 0 })
    }

    /// Last valid `BlockOffset` of the file. For an empty file, `0`.
    pub const fn blockoffset_last(&self) -> BlockOffset {
        if self.filesz == 0 {
            return 0;
        }
        self.blockn - 1
    }

    /// Specific `BlockSz` (size in bytes) of block at `BlockOffset`.
    pub fn blocksz_at_blockoffset(
        &self,
        blockoffset: &BlockOffset,
    ) -> BlockSz {
        let beg: FileOffset = self.file_offset_at_block_offset_self(*blockoffset);
        if beg >= self.filesz {
            return 0;
        }
        std::cmp::min(self.blocksz, self.filesz - beg)
    }

    /// `Count` of blocks read from the stream. Cache hits are not counted.
    #[inline(always)]
    pub const fn count_blocks_processed(&self) -> Count {
        self.count_blocks_read
    }

    /// `Count` of bytes read from the stream. Cache hits are not counted.
    #[inline(always)]
    pub const fn count_bytes(&self) -> Count {
        self.count_bytes
    }

    /// Enable internal LRU cache used by `read_block`.
    #[allow(non_snake_case)]
    pub fn LRU_cache_enable(&mut self) {
        if self.read_block_lru_cache_enabled {
            return;
        }
        self.read_block_lru_cache_enabled = true;
        self.read_block_lru_cache
            .clear();
    }

    /// Disable internal LRU cache used by `read_block`.
    #[allow(non_snake_case)]
    pub fn LRU_cache_disable(&mut self) {
        self.read_block_lru_cache_enabled = false;
        self.read_block_lru_cache
            .clear();
    }

    #[allow(non_snake_case)]
    fn store_block_in_LRU_cache(
        &mut self,
        blockoffset: BlockOffset,
        blockp: &BlockP,
    ) {
        if !self.read_block_lru_cache_enabled {
            return;
        }
        defo!("LRU cache put({}, BlockP@{:p})", blockoffset, blockp);
        self.read_block_lru_cache
            .put(blockoffset, blockp.clone());
        self.read_block_cache_lru_put += 1;
    }

    /// Read a `Block` of data of max size `self.blocksz` from the stream.
    ///
    /// A successful read returns [`Found(BlockP)`].
    ///
    /// When at or past the end of the file and no data was read, returns
    /// [`Done`].
    ///
    /// All other `std::io` errors are propagated to the caller in [`Err`].
    ///
    /// [`Found(BlockP)`]: crate::common::ResultS3
    /// [`Done`]: crate::common::ResultS3
    /// [`Err`]: crate::common::ResultS3
    pub fn read_block(
        &mut self,
        blockoffset: BlockOffset,
    ) -> ResultS3ReadBlock {
        defn!(
            "({0}): (fileoffset {1} (0x{1:08X})), blocksz {2} (0x{2:08X}), filesz {3} (0x{3:08X})",
            blockoffset, self.file_offset_at_block_offset_self(blockoffset), self.blocksz, self.filesz,
        );
        if self.filesz == 0 || blockoffset > self.blockoffset_last() {
            defx!("({}) is past blockoffset_last {}; return Done", blockoffset, self.blockoffset_last());
            return ResultS3ReadBlock::Done;
        }
        if self.read_block_lru_cache_enabled {
            match self
                .read_block_lru_cache
                .get(&blockoffset)
            {
                Some(bp) => {
                    self.read_block_cache_lru_hit += 1;
                    defx!("return Found(BlockP@{:p}); hit LRU cache Block[{}] len {}", &**bp, blockoffset, bp.len());
                    return ResultS3ReadBlock::Found(bp.clone());
                }
                None => {
                    self.read_block_cache_lru_miss += 1;
                    defo!("blockoffset {} not found LRU cache", blockoffset);
                }
            }
        }

        let seek: FileOffset = self.file_offset_at_block_offset_self(blockoffset);
        if let Err(err) = self.reader.seek(SeekFrom::Start(seek)) {
            de_err!("reader.seek(Start({})) {:?} {}", seek, self.path, err);
            defx!("({}): return Err({})", blockoffset, err);
            return ResultS3ReadBlock::Err(err);
        }
        let cap: BlockSz = self.blocksz_at_blockoffset(&blockoffset);
        let mut buffer = Block::with_capacity(cap as usize);
        match (&mut self.reader)
            .take(cap)
            .read_to_end(&mut buffer)
        {
            Ok(0) => {
                defx!("({}): read 0 bytes; return Done for {:?}", blockoffset, self.path);
                return ResultS3ReadBlock::Done;
            }
            Ok(_val) => {
                defo!("read {} bytes", _val);
            }
            Err(err) => {
                de_err!("reader.read_to_end(buffer) path {:?} {}", self.path, err);
                defx!("({}): return Err({})", blockoffset, err);
                return ResultS3ReadBlock::Err(err);
            }
        }
        self.count_bytes += buffer.len() as Count;
        self.count_blocks_read += 1;
        let blockp: BlockP = BlockP::new(buffer);
        self.store_block_in_LRU_cache(blockoffset, &blockp);
        defx!("({}): return Found; len {}", blockoffset, blockp.len());

        ResultS3ReadBlock::Found(blockp)
    }

    /// Read the `Block` holding `fileoffset`, returning the `Block` and the
    /// `BlockIndex` of `fileoffset` within it.
    ///
    /// `Done` if `fileoffset` is at or past the end of the stream.
    pub fn read_block_at_fileoffset(
        &mut self,
        fileoffset: FileOffset,
    ) -> ResultS3<(BlockP, BlockIndex), Error> {
        if fileoffset >= self.filesz {
            return ResultS3::Done;
        }
        let blockoffset: BlockOffset = self.block_offset_at_file_offset_self(fileoffset);
        match self.read_block(blockoffset) {
            ResultS3ReadBlock::Found(blockp) => {
                let bi: BlockIndex = self.block_index_at_file_offset_self(fileoffset);
                debug_assert_lt!(bi, blockp.len(), "BlockIndex past end of Block {}", blockoffset);
                ResultS3::Found((blockp, bi))
            }
            ResultS3ReadBlock::Done => ResultS3::Done,
            ResultS3ReadBlock::Err(err) => ResultS3::Err(err),
        }
    }

    /// Copy bytes \[`fileoffset_beg`, `fileoffset_end`) to `writer`, one
    /// `Block` at a time. `fileoffset_end` is clamped to the file size.
    ///
    /// Returns the `Count` of bytes written.
    pub fn copy_to_writer<W: Write>(
        &mut self,
        fileoffset_beg: FileOffset,
        fileoffset_end: FileOffset,
        writer: &mut W,
    ) -> Result<Count> {
        defn!("({}, {})", fileoffset_beg, fileoffset_end);
        let fileoffset_end: FileOffset = std::cmp::min(fileoffset_end, self.filesz);
        let mut at: FileOffset = fileoffset_beg;
        let mut written: Count = 0;
        while at < fileoffset_end {
            let (blockp, bi) = match self.read_block_at_fileoffset(at) {
                ResultS3::Found(val) => val,
                ResultS3::Done => {
                    defo!("read_block_at_fileoffset({}) returned Done", at);
                    break;
                }
                ResultS3::Err(err) => {
                    defx!("read_block_at_fileoffset({}) returned Err {}", at, err);
                    return Err(err);
                }
            };
            let remain: usize = (fileoffset_end - at) as usize;
            let bi_end: BlockIndex = std::cmp::min(blockp.len(), bi + remain);
            let slice: &[u8] = &blockp[bi..bi_end];
            writer.write_all(slice)?;
            written += slice.len() as Count;
            at += slice.len() as FileOffset;
        }
        defx!("return {}", written);

        Ok(written)
    }

    #[allow(non_snake_case)]
    pub fn summary(&self) -> SummaryBlockReader {
        SummaryBlockReader {
            blockreader_bytes: self.count_bytes,
            blockreader_bytes_total: self.filesz,
            blockreader_blocks: self.count_blocks_read,
            blockreader_blocks_total: self.blockn,
            blockreader_blocksz: self.blocksz,
            blockreader_read_block_lru_cache_hit: self.read_block_cache_lru_hit,
            blockreader_read_block_lru_cache_miss: self.read_block_cache_lru_miss,
            blockreader_read_block_lru_cache_put: self.read_block_cache_lru_put,
        }
    }
}
