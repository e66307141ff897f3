// src/tests/common.rs

//! Common data and helpers for tests.

#![allow(non_upper_case_globals)]

use crate::common::{Bytes, FPath, FileOffset};
use crate::data::datetime::{
    ymdhms,
    DateTimeL,
    Duration,
    FixedOffset,
    ReferenceClock,
};
use crate::debug::helpers::{create_temp_file, ntf_fpath, NamedTempFile};
use crate::readers::blockreader::{BlockSz, BLOCKSZ_DEF};

use ::lazy_static::lazy_static;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// timezones and clocks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const FO_0: FixedOffset = match FixedOffset::east_opt(0) {
    Some(fo) => fo,
    None => panic!("bad offset 0"),
};

pub const FO_E9: FixedOffset = match FixedOffset::east_opt(9 * 3600) {
    Some(fo) => fo,
    None => panic!("bad offset +9"),
};

pub const FO_W8: FixedOffset = match FixedOffset::west_opt(8 * 3600) {
    Some(fo) => fo,
    None => panic!("bad offset -8"),
};

/// Helper to create a `ReferenceClock` at UTC.
pub fn clock_at(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> ReferenceClock {
    ReferenceClock::new(ymdhms(&FO_0, year, month, day, hour, min, sec))
}

lazy_static! {
    /// "now" is 2006-02-15 12:00:00 UTC
    pub static ref CLOCK_2006_02: ReferenceClock = clock_at(2006, 2, 15, 12, 0, 0);
    /// "now" is 2006-01-10 05:00:00 UTC
    pub static ref CLOCK_2006_01_10: ReferenceClock = clock_at(2006, 1, 10, 5, 0, 0);
}

/// Block sizes exercised by reader tests; smaller than a line, odd, and
/// larger than a file.
pub const BLOCKSZS: [BlockSz; 6] = [1, 2, 3, 7, 64, BLOCKSZ_DEF];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// generated logs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

lazy_static! {
    /// first timestamp of generated ISO logs, 2006-01-10 00:00:00 UTC
    pub static ref DT_BASE: DateTimeL = ymdhms(&FO_0, 2006, 1, 10, 0, 0, 0);
}

/// `DT_BASE` plus `secs` seconds.
pub fn dt_base_plus(secs: i64) -> DateTimeL {
    *DT_BASE + Duration::try_seconds(secs).unwrap()
}

/// A generated log: the bytes, and per record the start offset and
/// datetime. Noise lines are not records.
#[derive(Debug)]
pub struct GenLog {
    pub data: Bytes,
    pub offsets: Vec<FileOffset>,
    pub dts: Vec<DateTimeL>,
}

impl GenLog {
    /// Offset of the first record with datetime at or after `target`, or the
    /// data length.
    pub fn lower_bound(
        &self,
        target: &DateTimeL,
    ) -> FileOffset {
        for (offset, dt) in self.offsets.iter().zip(self.dts.iter()) {
            if target <= dt {
                return *offset;
            }
        }
        self.data.len() as FileOffset
    }

    /// Interesting search targets: before all, each record, between records,
    /// after all.
    pub fn targets(&self) -> Vec<DateTimeL> {
        let one = Duration::try_seconds(1).unwrap();
        let mut targets: Vec<DateTimeL> = Vec::with_capacity(self.dts.len() * 3 + 2);
        targets.push(*DT_BASE - one);
        for dt in self.dts.iter() {
            targets.push(*dt - one);
            targets.push(*dt);
            targets.push(*dt + one);
        }
        if let Some(dt) = self.dts.last() {
            targets.push(*dt + one + one);
        }
        targets
    }
}

/// Generate an ISO format log with one record per value of `secs`, each
/// `DT_BASE + secs[i]`. Before record `i`, `noise[i]` is inserted verbatim
/// (if `noise` is long enough).
pub fn gen_iso_log(
    secs: &[i64],
    noise: &[&str],
) -> GenLog {
    let mut data = Bytes::new();
    let mut offsets: Vec<FileOffset> = Vec::with_capacity(secs.len());
    let mut dts: Vec<DateTimeL> = Vec::with_capacity(secs.len());
    for (i, sec) in secs.iter().enumerate() {
        if let Some(noise_) = noise.get(i) {
            data.extend_from_slice(noise_.as_bytes());
        }
        let dt = dt_base_plus(*sec);
        offsets.push(data.len() as FileOffset);
        dts.push(dt);
        let line = format!("{} record {} host sshd[{}]: message\n", dt.format("%Y-%m-%d %H:%M:%S"), i, 100 + i);
        data.extend_from_slice(line.as_bytes());
    }
    if let Some(noise_) = noise.get(secs.len()) {
        data.extend_from_slice(noise_.as_bytes());
    }

    GenLog { data, offsets, dts }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// files
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Five syslog lines, one per hour of Jan 10.
pub const SYSLOG_5: &str = "\
Jan 10 00:00:00 host app[1]: zero
Jan 10 01:00:00 host app[1]: one
Jan 10 02:00:00 host app[1]: two
Jan 10 03:00:00 host app[1]: three
Jan 10 04:00:00 host app[1]: four
";

pub const SYSLOG_5_LINE1: &str = "Jan 10 01:00:00 host app[1]: one\n";
pub const SYSLOG_5_LINE2: &str = "Jan 10 02:00:00 host app[1]: two\n";

lazy_static! {
    pub static ref NTF_SYSLOG_5: NamedTempFile = create_temp_file(SYSLOG_5);
    pub static ref NTF_SYSLOG_5_FPATH: FPath = ntf_fpath(&NTF_SYSLOG_5);
    pub static ref NTF_EMPTY: NamedTempFile = create_temp_file("");
    pub static ref NTF_EMPTY_FPATH: FPath = ntf_fpath(&NTF_EMPTY);
}
