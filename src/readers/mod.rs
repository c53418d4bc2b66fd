// src/readers/mod.rs

//! "Readers" for _btelib_.
//!
//! ## Overview of readers
//!
//! * [`bootprocessor`] drives [`archivereader`] to pull log files out of a
//!   boot archive, then drives the extractors on those files to derive a
//!   [`BootRecord`].
//! * [`blame`] extracts a unit duration from a `systemd-analyze blame`
//!   report.
//! * [`cloudinitlog`] extracts elapsed times from a `cloud-init.log`.
//!
//! The extractors only handle `u8` bytes of an in-memory buffer and have
//! no side effects. Conversion to `str` happens only for the small fields
//! that are parsed as numbers or timestamps.
//!
//! [`BootRecord`]: crate::data::record::BootRecord

pub mod archivereader;
pub mod blame;
pub mod bootprocessor;
pub mod cloudinitlog;
