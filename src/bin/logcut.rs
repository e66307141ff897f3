// src/bin/logcut.rs

//! Driver program _logcut_ drives the [_logcutlib_].
//!
//! Processes user-passed command-line arguments, resolves the `--from` and
//! `--to` date expressions once, then for each passed file, in order, cuts
//! the lines within `[from, to)` to STDOUT using [`cut_file`].
//!
//! Any error is fatal: a diagnostic naming the failing path is printed to
//! STDERR and the process exits `1`. Bytes already written are not
//! retracted.
//!
//! If passed CLI option `--summary`, a [`Summary`] about each file is
//! printed to STDERR.
//!
//! [_logcutlib_]: logcutlib
//! [`cut_file`]: logcutlib::readers::rangecutter::cut_file
//! [`Summary`]: logcutlib::readers::summary::Summary

#![allow(non_camel_case_types)]

// first setup the custom global allocator
use ::logcutlib::common::AllocatorChosen;

cfg_if::cfg_if! {
    if #[cfg(feature = "jemalloc")] {
        use ::tikv_jemallocator::Jemalloc;
        #[global_allocator]
        static GLOBAL: Jemalloc = Jemalloc;
        const ALLOCATOR_CHOSEN: AllocatorChosen = AllocatorChosen::Jemalloc;
        const CLI_HELP_AFTER_ALLOCATOR: &str = "jemalloc";
    }
    else if #[cfg(feature = "mimalloc")] {
        use ::mimalloc::MiMalloc;
        #[global_allocator]
        static GLOBAL: MiMalloc = MiMalloc;
        const ALLOCATOR_CHOSEN: AllocatorChosen = AllocatorChosen::Mimalloc;
        const CLI_HELP_AFTER_ALLOCATOR: &str = "mimalloc";
    }
    else {
        const ALLOCATOR_CHOSEN: AllocatorChosen = AllocatorChosen::System;
        const CLI_HELP_AFTER_ALLOCATOR: &str = "system";
    }
}

use std::io::{BufWriter, Write};
use std::process::ExitCode;

use ::anyhow::Context;
use ::clap::error::ErrorKind as ClapErrorKind;
use ::clap::{ArgGroup, Parser};
use ::const_format::concatcp;
use ::logcutlib::common::{FPath, FPaths};
use ::logcutlib::data::datetime::{
    FixedOffset,
    ReferenceClock,
    TimestampFormat,
    DTP_ISO,
    DTP_SYSLOG,
    DTP_WEB,
};
use ::logcutlib::data::dtexpr::{resolve_date_range, tz_offset_from_str, DateRange};
#[allow(unused_imports)]
use ::logcutlib::debug::printers::{de_err, de_wrn, e_err, e_wrn};
use ::logcutlib::readers::blockreader::{BlockSz, BLOCKSZ_DEF, BLOCKSZ_MAX, BLOCKSZ_MIN};
use ::logcutlib::readers::rangecutter::cut_file;
use ::logcutlib::readers::summary::Summary;
use ::si_trace_print::stack::stack_offset_set;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// --------------------
// command-line parsing

const EXIT_OK: u8 = 0;
const EXIT_ERR: u8 = 1;

/// default `--to` value
const CLI_TO_DEFAULT: &str = "now";

#[cfg(debug_assertions)]
const CLI_HELP_AFTER_NOTE_DEBUG: &str = "\nDEBUG BUILD";
#[cfg(not(debug_assertions))]
const CLI_HELP_AFTER_NOTE_DEBUG: &str = "";

/// `--help` _afterword_ message.
const CLI_HELP_AFTER: &str = concatcp!(
    "\
Each file must be sorted by timestamp. The lines with timestamps at or after
FROM and before TO are written to STDOUT. Lines without a parseable timestamp
are written along with the preceding line.

Timestamp formats:
    --iso   \"", DTP_ISO, "\"
    --ansi  \"", DTP_SYSLOG, "\" (default)
    --web   \"", DTP_WEB, "\" after the first '['
    --format  any strftime pattern, e.g. \"%Y-%m-%dT%H:%M:%S%z\"

A timestamp without a year is given the current year, or the prior year if
its month is later than the current month.

DateTime expressions FROM and TO may be:
    \"now\", \"today\", \"yesterday\"
    \"+946684800\" (Unix epoch seconds)
    \"20200102T120000\", \"2020-01-02 12:00:00\", \"2020-01-02T12:00:00-0800\"
    \"2020-01-02\", \"20200102\", \"2020/01/02\"
    \"12:00:00\", \"12:00\" (today)
    \"01/02\", \"Jan 02\", \"Jan 02 12:00:00\" (current year)
    \"-1d2h\", \"+30m\" (relative to now; units w d h m s)
    \"@-1h\", \"@+1d\" (relative to the other datetime)
    \"2 hours ago\", \"3 days ago\"
To pass a value with leading \"-\" use \"=\" notation, e.g. \"--from=-1h\".

Allocator: ", CLI_HELP_AFTER_ALLOCATOR,
    CLI_HELP_AFTER_NOTE_DEBUG,
);

/// clap command-line arguments build-time definitions.
#[derive(Parser, Debug)]
#[clap(
    about = env!("CARGO_PKG_DESCRIPTION"),
    author = env!("CARGO_PKG_AUTHORS"),
    name = "logcut",
    // write expanded information for the `--version` output
    version = concatcp!(
        "\n",
        "Version: ",
        env!("CARGO_PKG_VERSION_MAJOR"), ".",
        env!("CARGO_PKG_VERSION_MINOR"), ".",
        env!("CARGO_PKG_VERSION_PATCH"), "\n",
        "MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "\n",
        "Allocator: ", CLI_HELP_AFTER_ALLOCATOR , "\n",
        "License: ", env!("CARGO_PKG_LICENSE"), "\n",
    ),
    after_help = CLI_HELP_AFTER,
    verbatim_doc_comment,
    group(
        ArgGroup::new("format")
            .multiple(false)
            .required(false)
    ),
)]
struct CLI_Args {
    /// Path(s) of sorted log files. Processed in the order passed.
    #[clap(
        required = true,
        verbatim_doc_comment,
    )]
    paths: Vec<String>,

    /// Write lines with a timestamp at or after this datetime.
    /// For example, "20200102T120000" or "-5d".
    #[clap(
        short = 'f',
        long,
        required = true,
        allow_hyphen_values = true,
        verbatim_doc_comment,
    )]
    from: String,

    /// Write lines with a timestamp before this datetime.
    /// For example, "2020-01-03 23:00:00" or "@+1d".
    #[clap(
        short = 't',
        long,
        allow_hyphen_values = true,
        default_value = CLI_TO_DEFAULT,
        verbatim_doc_comment,
    )]
    to: String,

    /// Timestamps are ISO format "%Y-%m-%d %T".
    #[clap(
        short = 'i',
        long,
        group = "format",
    )]
    iso: bool,

    /// Timestamps are ANSI syslog format "%b %d %T". The default.
    #[clap(
        short = 'a',
        long,
        group = "format",
    )]
    ansi: bool,

    /// Timestamps are web server access log format "%d/%b/%Y:%T",
    /// after the first '['.
    #[clap(
        short = 'w',
        long,
        group = "format",
        verbatim_doc_comment,
    )]
    web: bool,

    /// Timestamps are this strftime format.
    #[clap(
        short = 'F',
        long = "format",
        group = "format",
        value_parser = cli_parse_format,
    )]
    custom_format: Option<String>,

    /// Timezone offset for timestamps and datetime expressions without a
    /// timezone.
    /// Example values, "+12", "-0800", "+02:00", or "EDT".
    /// If not passed then the local system timezone offset is used.
    #[clap(
        short = 'z',
        long,
        allow_hyphen_values = true,
        verbatim_doc_comment,
        value_parser = cli_process_tz_offset,
    )]
    tz_offset: Option<FixedOffset>,

    /// Read blocks of this size in bytes.
    /// May pass value as any radix (hexadecimal, decimal, octal, binary).
    /// Using the default value is recommended.
    /// Most useful for developers.
    #[clap(
        required = false,
        long,
        verbatim_doc_comment,
        default_value_t = BLOCKSZ_DEF,
        value_parser = cli_process_blocksz,
    )]
    blocksz: BlockSz,

    /// Print a summary of files processed to stderr.
    /// Most useful for developers.
    #[clap(
        short,
        long,
        verbatim_doc_comment,
    )]
    summary: bool,
}

impl CLI_Args {
    /// The [`TimestampFormat`] selected by the mutually exclusive format
    /// options.
    fn timestamp_format(&self) -> TimestampFormat {
        if let Some(pattern) = self.custom_format.as_ref() {
            return TimestampFormat::Custom(pattern.clone());
        }
        if self.ansi {
            return TimestampFormat::Syslog;
        }
        if self.iso {
            return TimestampFormat::Iso;
        }
        if self.web {
            return TimestampFormat::WebAccess;
        }

        TimestampFormat::Syslog
    }
}

/// `clap` argument processor for `--blocksz`.
/// This implementation, as opposed to clap built-in number parsing, allows more
/// flexibility for how the user may pass a number
/// e.g. "0xF00", or "0b10100", etc.
fn cli_process_blocksz(blockszs: &str) -> std::result::Result<BlockSz, String> {
    let errs = format!("Unable to parse a number for --blocksz {:?}", blockszs);
    let (digits, radix): (&str, u32) = if let Some(digits) = blockszs.strip_prefix("0x") {
        (digits, 16)
    } else if let Some(digits) = blockszs.strip_prefix("0o") {
        (digits, 8)
    } else if let Some(digits) = blockszs.strip_prefix("0b") {
        (digits, 2)
    } else {
        (blockszs, 10)
    };
    let blocksz: BlockSz = match BlockSz::from_str_radix(digits, radix) {
        Ok(val) => val,
        Err(err) => return Err(format!("{} {}", errs, err)),
    };
    if !(BLOCKSZ_MIN <= blocksz && blocksz <= BLOCKSZ_MAX) {
        return Err(format!("--blocksz must be {} ≤ BLOCKSZ ≤ {}, it was {:?}", BLOCKSZ_MIN, BLOCKSZ_MAX, blockszs));
    }

    Ok(blocksz)
}

/// `clap` argument processor for `--tz-offset`.
fn cli_process_tz_offset(tzo: &str) -> std::result::Result<FixedOffset, String> {
    match tz_offset_from_str(tzo) {
        Some(fo) => Ok(fo),
        None => Err(format!("Unable to parse a timezone offset for --tz-offset {:?}", tzo)),
    }
}

/// `clap` argument validator for `--format`.
fn cli_parse_format(format: &str) -> std::result::Result<String, String> {
    if format.trim().is_empty() {
        return Err(String::from("--format must not be empty"));
    }
    if !format.contains('%') {
        return Err(format!("--format {:?} has no strftime specifiers", format));
    }

    Ok(String::from(format))
}

/// Process user-passed command-line arguments.
///
/// Returns the exit code to exit with if processing should not continue.
fn cli_process_args<I, T>(args: I) -> std::result::Result<CLI_Args, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match CLI_Args::try_parse_from(args) {
        Ok(args) => {
            defo!("args {:?}", args);
            Ok(args)
        }
        Err(err) => {
            // help and version are not errors; `--help` prints to STDOUT
            let exitcode = match err.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => EXIT_OK,
                _ => EXIT_ERR,
            };
            if let Err(_err) = err.print() {
                de_err!("clap Error::print failed {}", _err);
            }
            Err(exitcode)
        }
    }
}

/// Cut each file in `paths`, in order, to `writer`.
///
/// Stops at the first error.
fn process_paths<W: Write>(
    paths: &FPaths,
    blocksz: BlockSz,
    format: &TimestampFormat,
    clock: &ReferenceClock,
    range: &DateRange,
    summary: bool,
    writer: &mut W,
) -> anyhow::Result<()> {
    defn!("({:?}, {}, {:?}, {:?})", paths, blocksz, format, range);
    for path in paths.iter() {
        let summary_: Summary = cut_file(path, blocksz, format, clock, &range.from, &range.to, writer)
            .with_context(|| format!("processing file {:?}", path))?;
        defo!("{:?}", summary_);
        if summary {
            // keep the summary after the file's output
            writer
                .flush()
                .with_context(|| format!("flushing output of file {:?}", path))?;
            eprintln!("{}", summary_);
        }
    }
    writer
        .flush()
        .context("flushing output")?;
    defx!();

    Ok(())
}

pub fn main() -> ExitCode {
    if cfg!(debug_assertions) {
        stack_offset_set(Some(0));
    }
    defn!("allocator {:?}", ALLOCATOR_CHOSEN);

    let args: CLI_Args = match cli_process_args(std::env::args_os()) {
        Ok(args) => args,
        Err(exitcode) => {
            defx!("exitcode {:?}", exitcode);
            return ExitCode::from(exitcode);
        }
    };
    let format: TimestampFormat = args.timestamp_format();
    let clock: ReferenceClock = match args.tz_offset.as_ref() {
        Some(tz_offset) => ReferenceClock::now_with_offset(tz_offset),
        None => ReferenceClock::now_local(),
    };
    defo!("format {:?}, clock {:?}", format, clock);

    // resolve both boundaries before touching any file
    let range: DateRange = match resolve_date_range(args.from.as_str(), args.to.as_str(), &clock) {
        Ok(range) => range,
        Err(err) => {
            e_err!("{}", err);
            defx!("exitcode {}", EXIT_ERR);
            return ExitCode::from(EXIT_ERR);
        }
    };
    if range.to < range.from {
        e_wrn!("--to {} is before --from {}; nothing will be written", range.to, range.from);
    }

    let paths: FPaths = args
        .paths
        .iter()
        .map(FPath::from)
        .collect();
    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    let exitcode = match process_paths(&paths, args.blocksz, &format, &clock, &range, args.summary, &mut writer) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            e_err!("{:#}", err);
            ExitCode::from(EXIT_ERR)
        }
    };
    defx!("exitcode {:?}", exitcode);

    exitcode
}

// --------------------------------------------------------------------------------
