// src/data/record.rs

//! The per-archive results: [`BootArchiveName`], [`BootMetrics`], and
//! [`BootRecord`].

use std::collections::BTreeMap;

use crate::common::FPath;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Metric name of the systemd blame duration of the local unit.
pub const METRIC_SYSTEMD_LOCAL_TIME: &str = "systemd_local_time";
/// Metric name of the cloud-init local datasource detection time.
pub const METRIC_LOCAL_TIME: &str = "local_time";
/// Metric name of the latency after the network config generation
/// command.
pub const METRIC_NETPLAN_TIME: &str = "netplan_time";

/// Separator of the tags in a boot archive file name.
pub const ARCHIVE_NAME_SEP: char = '-';

/// Tags encoded in a boot archive file name
/// `<timestamp>-<base_or_update>-<boot>[-<anything>]`,
/// e.g. `20230327T154906-base-1st-boot-analysis.tar.xz`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BootArchiveName {
    pub timestamp: String,
    /// archive variant, e.g. `base` or `update`
    pub base_or_update: String,
    /// boot ordinal tag, e.g. `1st`
    pub boot: String,
}

impl BootArchiveName {
    /// Split a file name into its tags. Returns `None` if there are fewer
    /// than three non-empty tags.
    pub fn from_file_name(file_name: &str) -> Option<BootArchiveName> {
        defñ!("({:?})", file_name);
        let mut parts = file_name.splitn(4, ARCHIVE_NAME_SEP);
        let timestamp = parts.next()?;
        let base_or_update = parts.next()?;
        let boot = parts.next()?;
        if timestamp.is_empty() || base_or_update.is_empty() || boot.is_empty() {
            return None;
        }

        Some(BootArchiveName {
            timestamp: timestamp.to_string(),
            base_or_update: base_or_update.to_string(),
            boot: boot.to_string(),
        })
    }
}

/// Durations in seconds derived from one boot archive.
///
/// `None` means the value was not found or not extracted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BootMetrics {
    /// [`METRIC_SYSTEMD_LOCAL_TIME`]
    pub systemd_local_time: Option<f64>,
    /// [`METRIC_LOCAL_TIME`]
    pub local_time: Option<f64>,
    /// [`METRIC_NETPLAN_TIME`]
    pub netplan_time: Option<f64>,
}

impl BootMetrics {
    /// `(name, value)` of every metric in column order.
    pub fn named(&self) -> [(&'static str, Option<f64>); 3] {
        [
            (METRIC_SYSTEMD_LOCAL_TIME, self.systemd_local_time),
            (METRIC_LOCAL_TIME, self.local_time),
            (METRIC_NETPLAN_TIME, self.netplan_time),
        ]
    }

    /// Map of metric name to value for the metrics that are present.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.named()
            .into_iter()
            .filter_map(|(name, value)| value.map(|value_| (name, value_)))
            .collect()
    }
}

/// One row of the aggregated table: one boot archive.
#[derive(Clone, Debug, PartialEq)]
pub struct BootRecord {
    /// name of the release directory holding the archive
    pub release: String,
    pub name: BootArchiveName,
    /// path of the archive file
    pub path: FPath,
    pub metrics: BootMetrics,
}

impl BootRecord {
    /// Sort key of records: release then archive path.
    pub fn sort_key(&self) -> (&str, &str) {
        (self.release.as_str(), self.path.as_str())
    }
}
