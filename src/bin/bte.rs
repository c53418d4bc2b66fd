// src/bin/bte.rs

//! Driver program _bte_ drives the [_btelib_].
//!
//! Processes user-passed command-line arguments.
//! Then enumerates the boot archives under `INDIR`, laid out as
//! `INDIR/<release>/<archive>`.
//!
//! Each boot archive is processed by one of `--jobs` worker threads using
//! [`process_boot_archive`]. Workers receive archives over one channel
//! and send back [`BootRecord`]s over another.
//! The main thread collects the records, orders them by release and
//! archive name, and writes them as CSV.
//!
//! An archive that fails is reported on STDERR and left out of the CSV.
//!
//! If passed CLI option `--summary`, the main thread prints a [`Summary`]
//! to STDERR.
//!
//! `bte.rs` should be the main thread and the only thread that writes the
//! CSV.
//!
//! [_btelib_]: btelib
//! [`process_boot_archive`]: btelib::readers::bootprocessor::process_boot_archive
//! [`BootRecord`]: btelib::data::record::BootRecord
//! [`Summary`]: btelib::printer::summary::Summary

#![allow(non_camel_case_types)]

use std::io::{Error, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use ::anyhow::{Context, Result};
use ::clap::Parser;
use ::const_format::concatcp;
use ::crossbeam_channel;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};
use ::si_trace_print::stack::stack_offset_set;
use ::walkdir::WalkDir;

use ::btelib::common::{Count, FPath};
use ::btelib::data::record::BootRecord;
use ::btelib::debug::printers::{e_err, e_wrn};
use ::btelib::printer::csvwriter::BootRecordCsvWriter;
use ::btelib::printer::summary::{print_summary, Summary};
use ::btelib::readers::blame::BLAME_UNIT_DEFAULT;
use ::btelib::readers::bootprocessor::{
    process_boot_archive,
    BootArchiveError,
    ExtractConfig,
    BLAME_ENTRY_DEFAULT,
    CLOUDINIT_BUNDLE_ENTRY_DEFAULT,
    CLOUDINIT_LOG_ENTRY_DEFAULT,
    SYSTEMD_ONLY_BOOT_DEFAULT,
};
use ::btelib::readers::cloudinitlog::{COMMAND_MARKER_DEFAULT, DATASOURCE_MARKER_DEFAULT};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// command-line parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// default `INDIR`
const CLI_INDIR_DEFAULT: &str = "./tmp/output";
/// default output file name, within `INDIR`
const CLI_OUTPUT_FILE_NAME: &str = "data.csv";
/// `--output` value meaning STDOUT
const CLI_OUTPUT_STDOUT: &str = "-";

const CLI_HELP_AFTER: &str = concatcp!(
    "Boot archives are read from INDIR/<release>/<archive>.\n",
    "An archive is a .tar, .tar.gz, .tar.xz, or .tar.bz2 named\n",
    "<timestamp>-<base_or_update>-<boot>[-...] holding\n",
    "  ", BLAME_ENTRY_DEFAULT, "\n",
    "  ", CLOUDINIT_BUNDLE_ENTRY_DEFAULT, " which holds <dir>/", CLOUDINIT_LOG_ENTRY_DEFAULT, "\n",
    "\n",
    "CSV columns:\n",
    "  release,timestamp,base_or_update,boot,systemd_local_time,local_time,netplan_time\n",
    "A metric that was not found is an empty field.\n",
);

fn cli_default_jobs() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Parser, Debug)]
#[clap(
    about = env!("CARGO_PKG_DESCRIPTION"),
    name = "bte",
    version = concatcp!(
        "(Boot Timeline Extractor)\n",
        "Version: ",
        env!("CARGO_PKG_VERSION_MAJOR"), ".",
        env!("CARGO_PKG_VERSION_MINOR"), ".",
        env!("CARGO_PKG_VERSION_PATCH"), "\n",
        "MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "\n",
        "License: ", env!("CARGO_PKG_LICENSE"), "\n",
    ),
    after_help = CLI_HELP_AFTER,
    verbatim_doc_comment,
)]
struct CLI_Args {
    /// Directory of release directories holding boot archives.
    #[clap(
        default_value = CLI_INDIR_DEFAULT,
        verbatim_doc_comment,
    )]
    indir: String,

    /// Write the CSV to this file. Pass "-" for STDOUT.
    /// Default is "INDIR/data.csv".
    #[clap(
        short = 'o',
        long,
        verbatim_doc_comment,
    )]
    output: Option<String>,

    /// Unit looked up in systemd_blame.txt.
    #[clap(
        long,
        default_value = BLAME_UNIT_DEFAULT,
    )]
    unit: String,

    /// Marker of the cloud-init.log line that ends local datasource
    /// detection. The line before it must say "took <float> seconds".
    #[clap(
        long,
        default_value = DATASOURCE_MARKER_DEFAULT,
        verbatim_doc_comment,
    )]
    datasource_marker: String,

    /// Marker of the cloud-init.log command line. The time from its last
    /// occurrence to the following line is the "netplan_time".
    #[clap(
        long,
        default_value = COMMAND_MARKER_DEFAULT,
        verbatim_doc_comment,
    )]
    command_marker: String,

    /// Boot tag (third part of the archive name) for which only
    /// systemd_blame.txt is read; cloud-init metrics are left empty.
    /// May be passed more than once, e.g. "--systemd-only-boot 1st".
    /// Passing this option replaces the default.
    #[clap(
        long = "systemd-only-boot",
        default_value = SYSTEMD_ONLY_BOOT_DEFAULT,
        verbatim_doc_comment,
    )]
    systemd_only_boots: Vec<String>,

    /// Number of archive processing threads.
    #[clap(
        short = 'j',
        long,
        default_value_t = cli_default_jobs(),
    )]
    jobs: usize,

    /// Print a summary of processed archives to STDERR.
    #[clap(
        short = 's',
        long,
    )]
    summary: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// archive enumeration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One boot archive to process.
#[derive(Clone, Debug)]
struct ArchiveJob {
    release: String,
    path: PathBuf,
}

/// Find `indir/<release>/<archive>` files, ordered by release then
/// archive file name. Symbolic links are followed.
fn find_archives(indir: &Path) -> Result<Vec<ArchiveJob>> {
    defn!("({:?})", indir);
    let mut jobs: Vec<ArchiveJob> = Vec::new();
    for entry_res in WalkDir::new(indir)
        .follow_links(true)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
    {
        let entry = entry_res.with_context(|| format!("failed to read directory {:?}", indir))?;
        if !entry.file_type().is_file() {
            defo!("skip non-file {:?}", entry.path());
            continue;
        }
        let release: String = match entry.path().parent().and_then(|p| p.file_name()) {
            Some(val) => val.to_string_lossy().to_string(),
            None => continue,
        };
        defo!("release {:?} archive {:?}", release, entry.path());
        jobs.push(ArchiveJob {
            release,
            path: entry.into_path(),
        });
    }
    defx!("found {} archives", jobs.len());

    Ok(jobs)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// processing threads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sent from a processing thread to the main thread: the index of the
/// [`ArchiveJob`] and its result.
type ChanDatum = (usize, std::result::Result<BootRecord, BootArchiveError>);

/// Processes one archive on a processing thread, normally
/// [`process_boot_archive`].
type ProcessArchiveFn = fn(&Path, &str, &ExtractConfig) -> std::result::Result<BootRecord, BootArchiveError>;

/// Order `results` by job index. A job with no result, because its
/// processing thread panicked, gets an error result.
fn fill_missing_results(mut results: Vec<ChanDatum>, jobs: &[ArchiveJob]) -> Vec<ChanDatum> {
    let mut received: Vec<bool> = vec![false; jobs.len()];
    for (index, _) in results.iter() {
        if let Some(val) = received.get_mut(*index) {
            *val = true;
        }
    }
    for (index, job) in jobs.iter().enumerate() {
        if received[index] {
            continue;
        }
        defo!("no result for job {} {:?}", index, job.path);
        let err = Error::new(
            ErrorKind::Other,
            format!("processing thread panicked for file {:?}", job.path),
        );
        results.push((index, Err(BootArchiveError::Io(err))));
    }
    results.sort_by_key(|(index, _)| *index);

    results
}

/// Process all `jobs` with `process` on `thread_count` threads. Results
/// are returned in the order of `jobs`, one per job.
fn process_archives(
    jobs: &[ArchiveJob],
    config: ExtractConfig,
    thread_count: usize,
    process: ProcessArchiveFn,
) -> Result<Vec<ChanDatum>> {
    defn!("({} jobs, thread_count {})", jobs.len(), thread_count);
    let (send_job, recv_job) = crossbeam_channel::unbounded::<(usize, ArchiveJob)>();
    let (send_result, recv_result) = crossbeam_channel::unbounded::<ChanDatum>();
    for (index, job) in jobs.iter().enumerate() {
        send_job
            .send((index, job.clone()))
            .context("failed to queue archive")?;
    }
    // workers exit once the queue is drained
    drop(send_job);

    let config = Arc::new(config);
    let mut handles: Vec<thread::JoinHandle<()>> = Vec::with_capacity(thread_count);
    for thread_index in 0..thread_count.clamp(1, jobs.len().max(1)) {
        let recv_job = recv_job.clone();
        let send_result = send_result.clone();
        let config = Arc::clone(&config);
        let handle = thread::Builder::new()
            .name(format!("bte_worker_{}", thread_index))
            .spawn(move || {
                for (index, job) in recv_job.iter() {
                    defo!("thread {} processing {:?}", thread_index, job.path);
                    let result = process(&job.path, &job.release, &config);
                    if send_result.send((index, result)).is_err() {
                        break;
                    }
                }
            })
            .with_context(|| format!("failed to spawn thread {}", thread_index))?;
        handles.push(handle);
    }
    // the main thread keeps no sender so `recv_result.iter()` ends when
    // the last worker exits
    drop(send_result);

    let results: Vec<ChanDatum> = recv_result.iter().collect();
    for handle in handles {
        if let Err(_err) = handle.join() {
            e_err!("a processing thread panicked");
        }
    }
    let results = fill_missing_results(results, jobs);
    defx!("return {} results", results.len());

    Ok(results)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// main
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn write_records(records: &[BootRecord], output: &str) -> Result<usize> {
    defn!("({} records, {:?})", records.len(), output);
    let sink: Box<dyn Write> = if output == CLI_OUTPUT_STDOUT {
        Box::new(std::io::stdout().lock())
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("failed to create output file {:?}", output))?;
        Box::new(std::io::BufWriter::new(file))
    };
    let mut writer = BootRecordCsvWriter::new(sink)
        .with_context(|| format!("failed to write CSV header to {:?}", output))?;
    for record in records.iter() {
        writer
            .write(record)
            .with_context(|| format!("failed to write CSV row to {:?}", output))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {:?}", output))?;
    defx!("wrote {} rows", writer.rows());

    Ok(writer.rows())
}

fn run(args: CLI_Args) -> Result<bool> {
    let start_time = Instant::now();
    let indir = PathBuf::from(&args.indir);
    let output: String = match args.output {
        Some(val) => val,
        None => indir.join(CLI_OUTPUT_FILE_NAME).to_string_lossy().to_string(),
    };
    let mut config = ExtractConfig::default()
        .with_markers(&args.datasource_marker, &args.command_marker);
    config.blame_unit = args.unit;
    config.systemd_only_boots = args.systemd_only_boots;
    defo!("config {:?}", config);

    let jobs: Vec<ArchiveJob> = find_archives(&indir)?;
    if jobs.is_empty() {
        e_err!("no boot archives found under {:?}", indir);
        return Ok(false);
    }

    let mut summary = Summary::new(start_time);
    let mut records: Vec<BootRecord> = Vec::with_capacity(jobs.len());
    for (index, result) in process_archives(&jobs, config, args.jobs, process_boot_archive)? {
        let job: &ArchiveJob = &jobs[index];
        match result {
            Ok(record) => {
                if record.metrics.systemd_local_time.is_none() {
                    e_wrn!("unit not found in blame report of {:?}", job.path);
                }
                summary.add_record(&record);
                records.push(record);
            }
            Err(err) => {
                e_err!("{}", err);
                let fpath: FPath = job.path.to_string_lossy().to_string();
                summary.add_error(&job.release, &fpath, err.to_string());
            }
        }
    }
    records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    write_records(&records, &output)?;

    if args.summary {
        print_summary(&summary);
    }
    let failed: Count = summary.failed();

    Ok(failed == 0)
}

pub fn main() -> ExitCode {
    if cfg!(debug_assertions) {
        stack_offset_set(Some(0));
    }
    defn!();
    let args = CLI_Args::parse();
    defo!("args {:?}", args);

    let exitcode = match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            e_err!("{:#}", err);
            ExitCode::FAILURE
        }
    };
    defx!("exitcode {:?}", exitcode);

    exitcode
}
