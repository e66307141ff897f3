// src/tests/linereader_tests.rs

//! tests for `linereader.rs`

#![allow(non_snake_case)]

use crate::common::{FPath, FileOffset};
use crate::data::datetime::LINE_READ_MAX;
use crate::readers::blockreader::BlockSz;
use crate::readers::linereader::LineReader;
use crate::tests::common::{BLOCKSZS, NTF_EMPTY_FPATH, NTF_SYSLOG_5_FPATH, SYSLOG_5};

use std::io::Cursor;

use ::si_trace_print::stack::stack_offset_set;
use ::test_case::test_case;

/// helper to wrap the match and panic checks
fn new_LineReader(
    data: &[u8],
    blocksz: BlockSz,
) -> LineReader<Cursor<Vec<u8>>> {
    stack_offset_set(Some(2));
    match LineReader::from_reader(FPath::from("cursor"), Cursor::new(data.to_vec()), blocksz) {
        Ok(val) => val,
        Err(err) => {
            panic!("ERROR: LineReader::from_reader(…, {}) failed {}", blocksz, err);
        }
    }
}

/// `"a\nbb\n\nccc"`; line starts are 0, 2, 5, 6
const DATA_ABC: &[u8] = b"a\nbb\n\nccc";

/// `(fileoffset, expect)` pairs for `next_line_start` over `DATA_ABC`
const NEXT_LINE_START_ABC: [(FileOffset, FileOffset); 11] = [
    (0, 2),
    (1, 2),
    (2, 5),
    (3, 5),
    (4, 5),
    (5, 6),
    (6, 9),
    (7, 9),
    (8, 9),
    (9, 9),
    (100, 9),
];

/// `(fileoffset, expect)` pairs for `line_start_at_or_before` over `DATA_ABC`
const LINE_START_AT_OR_BEFORE_ABC: [(FileOffset, FileOffset); 11] = [
    (0, 0),
    (1, 0),
    (2, 2),
    (3, 2),
    (4, 2),
    (5, 5),
    (6, 6),
    (7, 6),
    (8, 6),
    (9, 6),
    (100, 6),
];

#[test]
fn test_next_line_start() {
    for blocksz in BLOCKSZS {
        let mut lr = new_LineReader(DATA_ABC, blocksz);
        for (fileoffset, expect) in NEXT_LINE_START_ABC {
            let result = lr.next_line_start(fileoffset).unwrap();
            assert_eq!(result, expect, "next_line_start({}) blocksz {}", fileoffset, blocksz);
            assert_eq!(lr.cursor(), expect);
        }
    }
}

#[test]
fn test_line_start_at_or_before() {
    for blocksz in BLOCKSZS {
        let mut lr = new_LineReader(DATA_ABC, blocksz);
        for (fileoffset, expect) in LINE_START_AT_OR_BEFORE_ABC {
            let result = lr
                .line_start_at_or_before(fileoffset)
                .unwrap();
            assert_eq!(result, expect, "line_start_at_or_before({}) blocksz {}", fileoffset, blocksz);
            assert_eq!(lr.cursor(), expect);
        }
    }
}

#[test]
fn test_line_start_at_or_before_line_starts_unchanged() {
    // every line start is returned as-is, every other offset rounds down
    for blocksz in BLOCKSZS {
        let mut lr = new_LineReader(SYSLOG_5.as_bytes(), blocksz);
        let filesz = lr.filesz();
        let mut fileoffset: FileOffset = 0;
        while fileoffset < filesz {
            let next = lr.next_line_start(fileoffset).unwrap();
            assert_eq!(lr.line_start_at_or_before(fileoffset).unwrap(), fileoffset);
            if next - fileoffset > 1 {
                assert_eq!(lr.line_start_at_or_before(next - 1).unwrap(), fileoffset);
            }
            fileoffset = next;
        }
        assert_eq!(lr.line_start_at_or_before(filesz).unwrap(), filesz, "trailing newline blocksz {}", blocksz);
    }
}

/// `(data, next_line_start(0), line_start_at_or_before(filesz))` for tiny
/// streams
#[test_case(b"", 0, 0; "empty")]
#[test_case(b"x", 1, 0; "one byte")]
#[test_case(b"\n", 1, 1; "newline")]
#[test_case(b"xy", 2, 0; "two bytes")]
#[test_case(b"x\n", 2, 2; "byte newline")]
#[test_case(b"\nx", 1, 1; "newline byte")]
#[test_case(b"\n\n", 1, 2; "two newlines")]
fn test_tiny_streams(
    data: &[u8],
    expect_next: FileOffset,
    expect_before_end: FileOffset,
) {
    for blocksz in BLOCKSZS {
        let mut lr = new_LineReader(data, blocksz);
        assert_eq!(lr.filesz(), data.len() as FileOffset);
        assert_eq!(lr.next_line_start(0).unwrap(), expect_next, "blocksz {}", blocksz);
        assert_eq!(lr.line_start_at_or_before(lr.filesz()).unwrap(), expect_before_end, "blocksz {}", blocksz);
        assert_eq!(lr.line_start_at_or_before(0).unwrap(), 0);
    }
}

#[test_case(0, b"a\n")]
#[test_case(2, b"bb\n")]
#[test_case(5, b"\n"; "blank line")]
#[test_case(6, b"ccc"; "no trailing newline")]
#[test_case(9, b""; "at end")]
#[test_case(99, b""; "past end")]
fn test_read_line_prefix(
    fileoffset: FileOffset,
    expect: &[u8],
) {
    for blocksz in BLOCKSZS {
        let mut lr = new_LineReader(DATA_ABC, blocksz);
        lr.seek(fileoffset);
        let cursor = lr.cursor();
        let prefix = lr.read_line_prefix().unwrap();
        assert_eq!(prefix, expect, "read_line_prefix at {} blocksz {}", fileoffset, blocksz);
        // the cursor does not move
        assert_eq!(lr.cursor(), cursor);
    }
}

#[test]
fn test_read_line_prefix_long_line() {
    let mut data: Vec<u8> = vec![b'x'; LINE_READ_MAX + 1000];
    data.extend_from_slice(b"\nnext\n");
    for blocksz in [7, 0x400, 0x2000] {
        let mut lr = new_LineReader(&data, blocksz);
        let prefix = lr.read_line_prefix().unwrap();
        assert_eq!(prefix.len(), LINE_READ_MAX, "blocksz {}", blocksz);
        assert!(prefix.iter().all(|b| *b == b'x'));
        let next = lr.next_line_start(0).unwrap();
        assert_eq!(next, (LINE_READ_MAX + 1001) as FileOffset);
        assert_eq!(lr.read_line_prefix().unwrap(), b"next\n");
    }
}

#[test]
fn test_copy_to_writer() {
    let mut lr = new_LineReader(DATA_ABC, 2);
    let mut buffer: Vec<u8> = Vec::new();
    assert_eq!(lr.copy_to_writer(2, 6, &mut buffer).unwrap(), 4);
    assert_eq!(buffer.as_slice(), b"bb\n\n");
}

#[test]
fn test_summary() {
    let mut lr = new_LineReader(DATA_ABC, 2);
    lr.next_line_start(0).unwrap();
    lr.next_line_start(2).unwrap();
    lr.line_start_at_or_before(4).unwrap();
    lr.read_line_prefix().unwrap();
    let summary = lr.summary();
    assert_eq!(summary.linereader_next_line_start, 2);
    assert_eq!(summary.linereader_line_start_at_or_before, 1);
    assert_eq!(summary.linereader_read_line_prefix, 1);
}

#[test]
fn test_LineReader_new_file() {
    let mut lr = match LineReader::new(NTF_SYSLOG_5_FPATH.clone(), 16) {
        Ok(val) => val,
        Err(err) => panic!("LineReader::new failed {}", err),
    };
    assert_eq!(lr.filesz(), SYSLOG_5.len() as FileOffset);
    assert_eq!(lr.blocksz(), 16);
    assert_eq!(lr.path(), &*NTF_SYSLOG_5_FPATH);
    let next = lr.next_line_start(0).unwrap();
    assert_eq!(next, SYSLOG_5.find('\n').unwrap() as FileOffset + 1);
}

#[test]
fn test_LineReader_new_file_empty() {
    let mut lr = match LineReader::new(NTF_EMPTY_FPATH.clone(), 16) {
        Ok(val) => val,
        Err(err) => panic!("LineReader::new failed {}", err),
    };
    assert_eq!(lr.filesz(), 0);
    assert_eq!(lr.next_line_start(0).unwrap(), 0);
    assert_eq!(lr.line_start_at_or_before(0).unwrap(), 0);
    assert_eq!(lr.read_line_prefix().unwrap(), b"");
}
