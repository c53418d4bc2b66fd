// src/printer/summary.rs

//! CLI option `--summary` printing functions.
//! Only used by `bte.rs`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::common::{Count, FPath};
use crate::data::record::BootRecord;

use ::si_trace_print::defñ;

/// Per-release counts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReleaseCounts {
    pub archives: Count,
    pub failed: Count,
    /// records missing the blame unit
    pub no_blame_unit: Count,
}

/// Accumulated statistics about one run of _bte_.
#[derive(Debug)]
pub struct Summary {
    start: Instant,
    releases: BTreeMap<String, ReleaseCounts>,
    /// `(archive path, error message)`
    errors: Vec<(FPath, String)>,
}

impl Default for Summary {
    fn default() -> Self {
        Summary::new(Instant::now())
    }
}

impl Summary {
    pub fn new(start: Instant) -> Summary {
        Summary {
            start,
            releases: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_record(&mut self, record: &BootRecord) {
        defñ!("{:?}", record.path);
        let counts = self.releases.entry(record.release.clone()).or_default();
        counts.archives += 1;
        if record.metrics.systemd_local_time.is_none() {
            counts.no_blame_unit += 1;
        }
    }

    pub fn add_error(&mut self, release: &str, fpath: &FPath, error: String) {
        defñ!("{:?}", fpath);
        let counts = self.releases.entry(release.to_string()).or_default();
        counts.archives += 1;
        counts.failed += 1;
        self.errors.push((fpath.clone(), error));
    }

    pub fn archives(&self) -> Count {
        self.releases.values().map(|counts| counts.archives).sum()
    }

    pub fn failed(&self) -> Count {
        self.releases.values().map(|counts| counts.failed).sum()
    }

    pub fn release_counts(&self, release: &str) -> Option<&ReleaseCounts> {
        self.releases.get(release)
    }

    pub fn errors(&self) -> &[(FPath, String)] {
        &self.errors
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Render the summary as lines of text.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::with_capacity(self.releases.len() + self.errors.len() + 4);
        lines.push(String::from("Summary:"));
        for (release, counts) in self.releases.iter() {
            lines.push(format!(
                "  release {:?}: archives {}, failed {}, without blame unit {}",
                release, counts.archives, counts.failed, counts.no_blame_unit,
            ));
        }
        lines.push(format!(
            "  archives {}, failed {}",
            self.archives(),
            self.failed(),
        ));
        for (fpath, error) in self.errors.iter() {
            lines.push(format!("  error {:?}: {}", fpath, error));
        }
        lines.push(format!("  elapsed {:?}", self.elapsed()));

        lines
    }
}

/// Print the [`Summary`] to STDERR.
pub fn print_summary(summary: &Summary) {
    for line in summary.lines() {
        eprintln!("{}", line);
    }
}
