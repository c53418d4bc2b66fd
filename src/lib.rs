// src/lib.rs

//! _btelib_ is the library used by the program _bte_, the Boot Timeline
//! Extractor.
//!
//! _btelib_ scrapes boot timing metrics out of
//! [`systemd-analyze blame`] reports and [`cloud-init`] logs.
//!
//! The core extraction functions take an in-memory byte buffer and return
//! seconds as `f64`:
//!
//! * [`extract_unit_blame`] finds the startup duration of a systemd unit.
//! * [`extract_datasource_detection_time`] finds how long cloud-init took
//!   to search for local datasources.
//! * [`extract_last_command_duration`] finds the latency between the last
//!   invocation of a command and the next logged event.
//!
//! Surrounding those are the archive handling in [`archivereader`], the
//! per-archive processing in [`bootprocessor`], and the CSV printing in
//! [`csvwriter`].
//!
//! Also see [_Definitions of data_].
//!
//! [`systemd-analyze blame`]: https://www.freedesktop.org/software/systemd/man/systemd-analyze.html
//! [`cloud-init`]: https://cloudinit.readthedocs.io/
//! [`extract_unit_blame`]: crate::readers::blame::extract_unit_blame
//! [`extract_datasource_detection_time`]: crate::readers::cloudinitlog::extract_datasource_detection_time
//! [`extract_last_command_duration`]: crate::readers::cloudinitlog::extract_last_command_duration
//! [`archivereader`]: crate::readers::archivereader
//! [`bootprocessor`]: crate::readers::bootprocessor
//! [`csvwriter`]: crate::printer::csvwriter
//! [_Definitions of data_]: crate::data

pub mod common;
pub mod data;
pub mod debug;
pub mod printer;
pub mod readers;
#[cfg(test)]
pub mod tests;
