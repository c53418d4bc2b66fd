// src/readers/bootprocessor.rs

//! Derive one [`BootRecord`] from one boot archive.
//!
//! A boot archive holds
//!
//! ```text
//! ./systemd_blame.txt
//! ./cloud-init.tar.gz
//!     cloud-init-logs-2023-03-27/cloud-init.log
//! ...
//! ```
//!
//! and is named `<timestamp>-<base_or_update>-<boot>[-...]`, see
//! [`BootArchiveName`].

use std::fmt;
use std::io::Error;
use std::path::Path;

use crate::common::{Bytes, ExtractError, FPath, SUBPATH_SEP};
use crate::data::line::Marker;
use crate::data::record::{BootArchiveName, BootMetrics, BootRecord};
use crate::readers::archivereader::{archive_entry, read_archive_file};
use crate::readers::blame::{extract_unit_blame, BLAME_UNIT_DEFAULT};
use crate::readers::cloudinitlog::{
    extract_cloud_init_log,
    CloudInitMarkers,
    CloudInitTimes,
};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Name of the blame report within a boot archive.
pub const BLAME_ENTRY_DEFAULT: &str = "systemd_blame.txt";
/// Name of the cloud-init log bundle within a boot archive.
pub const CLOUDINIT_BUNDLE_ENTRY_DEFAULT: &str = "cloud-init.tar.gz";
/// Name of the log within the cloud-init log bundle.
pub const CLOUDINIT_LOG_ENTRY_DEFAULT: &str = "cloud-init.log";
/// Boot tag whose archives are collected without cloud-init logs.
pub const SYSTEMD_ONLY_BOOT_DEFAULT: &str = "1s";

/// What to look for in a boot archive.
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    /// unit looked up in the blame report
    pub blame_unit: String,
    pub markers: CloudInitMarkers,
    pub blame_entry: String,
    pub cloudinit_bundle_entry: String,
    pub cloudinit_log_entry: String,
    /// boot tags for which only the blame report is read; defaults to
    /// [`SYSTEMD_ONLY_BOOT_DEFAULT`]
    pub systemd_only_boots: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            blame_unit: String::from(BLAME_UNIT_DEFAULT),
            markers: CloudInitMarkers::default(),
            blame_entry: String::from(BLAME_ENTRY_DEFAULT),
            cloudinit_bundle_entry: String::from(CLOUDINIT_BUNDLE_ENTRY_DEFAULT),
            cloudinit_log_entry: String::from(CLOUDINIT_LOG_ENTRY_DEFAULT),
            systemd_only_boots: vec![String::from(SYSTEMD_ONLY_BOOT_DEFAULT)],
        }
    }
}

impl ExtractConfig {
    /// Replace the cloud-init markers.
    pub fn with_markers(mut self, datasource_marker: &str, command_marker: &str) -> Self {
        self.markers = CloudInitMarkers {
            datasource: Marker::from(datasource_marker),
            command: Marker::from(command_marker),
        };

        self
    }

    /// Should the cloud-init log of a boot tagged `boot` be skipped?
    pub fn is_systemd_only(&self, boot: &str) -> bool {
        self.systemd_only_boots.iter().any(|tag| tag == boot)
    }
}

/// Errors from [`process_boot_archive`].
#[derive(Debug)]
pub enum BootArchiveError {
    /// The archive file name is not `<timestamp>-<base_or_update>-<boot>...`
    ArchiveName(FPath),
    /// Reading or decompressing failed.
    Io(Error),
    /// A required entry is not in the archive.
    MissingEntry {
        entry: String,
        fpath: FPath,
    },
    /// An extraction over an entry failed.
    Extract {
        entry: String,
        fpath: FPath,
        error: ExtractError,
    },
}

impl fmt::Display for BootArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootArchiveError::ArchiveName(fpath) => {
                write!(f, "archive name {:?} is not <timestamp>-<base_or_update>-<boot>", fpath)
            }
            BootArchiveError::Io(err) => write!(f, "{}", err),
            BootArchiveError::MissingEntry { entry, fpath } => {
                write!(f, "entry {:?} not found in {:?}", entry, fpath)
            }
            BootArchiveError::Extract { entry, fpath, error } => {
                write!(f, "{} in entry {:?} of {:?}", error, entry, fpath)
            }
        }
    }
}

impl std::error::Error for BootArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootArchiveError::Io(err) => Some(err),
            BootArchiveError::Extract { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<Error> for BootArchiveError {
    fn from(err: Error) -> Self {
        BootArchiveError::Io(err)
    }
}

fn required_entry(archive_bytes: &[u8], entry: &str, fpath: &FPath) -> Result<Bytes, BootArchiveError> {
    match archive_entry(archive_bytes, entry, fpath)? {
        Some(data) => Ok(data),
        None => Err(BootArchiveError::MissingEntry {
            entry: entry.to_string(),
            fpath: fpath.clone(),
        }),
    }
}

/// Extract the [`BootMetrics`] from the bytes of a boot archive.
///
/// `boot` is the boot tag of the archive, checked against
/// [`ExtractConfig::systemd_only_boots`].
pub fn extract_boot_metrics(
    archive_bytes: &[u8],
    boot: &str,
    config: &ExtractConfig,
    fpath: &FPath,
) -> Result<BootMetrics, BootArchiveError> {
    defn!("(archive_bytes len {}, {:?}, {:?})", archive_bytes.len(), boot, fpath);
    let mut metrics = BootMetrics::default();

    let blame: Bytes = required_entry(archive_bytes, &config.blame_entry, fpath)?;
    metrics.systemd_local_time = extract_unit_blame(&blame, &config.blame_unit)
        .map_err(|error| BootArchiveError::Extract {
            entry: config.blame_entry.clone(),
            fpath: fpath.clone(),
            error,
        })?;
    defo!("systemd_local_time {:?}", metrics.systemd_local_time);

    if config.is_systemd_only(boot) {
        defx!("boot {:?} is systemd only; return {:?}", boot, metrics);
        return Ok(metrics);
    }

    let bundle: Bytes = required_entry(archive_bytes, &config.cloudinit_bundle_entry, fpath)?;
    let bundle_fpath: FPath = format!("{}{}{}", fpath, SUBPATH_SEP, config.cloudinit_bundle_entry);
    let log: Bytes = required_entry(&bundle, &config.cloudinit_log_entry, &bundle_fpath)?;
    let times: CloudInitTimes = extract_cloud_init_log(&log, &config.markers)
        .map_err(|error| BootArchiveError::Extract {
            entry: config.cloudinit_log_entry.clone(),
            fpath: bundle_fpath.clone(),
            error,
        })?;
    metrics.local_time = Some(times.local_time);
    metrics.netplan_time = Some(times.netplan_time);
    defx!("return {:?}", metrics);

    Ok(metrics)
}

/// Process the boot archive at `path` in release directory `release`.
pub fn process_boot_archive(
    path: &Path,
    release: &str,
    config: &ExtractConfig,
) -> Result<BootRecord, BootArchiveError> {
    defn!("({:?}, {:?})", path, release);
    let fpath: FPath = path.to_string_lossy().to_string();
    let file_name: String = match path.file_name() {
        Some(val) => val.to_string_lossy().to_string(),
        None => return Err(BootArchiveError::ArchiveName(fpath)),
    };
    let name: BootArchiveName = match BootArchiveName::from_file_name(&file_name) {
        Some(val) => val,
        None => {
            defx!("bad archive name {:?}", file_name);
            return Err(BootArchiveError::ArchiveName(fpath));
        }
    };
    let archive_bytes: Bytes = read_archive_file(path)?;
    let metrics: BootMetrics = extract_boot_metrics(&archive_bytes, &name.boot, config, &fpath)?;
    defx!("return metrics {:?}", metrics);

    Ok(BootRecord {
        release: release.to_string(),
        name,
        path: fpath,
        metrics,
    })
}
