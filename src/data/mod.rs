// src/data/mod.rs

//! The `data` module is specialized data containers for log [`LogLine`]s,
//! their [`LogTimestamp`]s, and the per-archive [`BootRecord`]s.
//!
//! ## Definitions of data
//!
//! ### Line
//!
//! A "line" is a sequence of bytes in a log buffer that:
//!
//! * begins after a prior "line" or the beginning of the buffer.
//! * ends before a newline character `'\n'` or the end of the buffer.
//!
//! A "line" is represented by a [`LogLine`] and visited by a
//! [`LineCursor`] in either [`ScanDirection`].
//!
//! ### Marker
//!
//! A "marker" is a fixed substring identifying a meaningful line, e.g. a
//! unit name or a completion message. A "marker" is represented by a
//! [`Marker`].
//!
//! ### Boot archive
//!
//! A "boot archive" is a tarball collected after one boot of an instance.
//! It holds a `systemd-analyze blame` report and a bundle of cloud-init
//! logs. The metrics derived from one boot archive are a [`BootRecord`].
//!
//! [`LogLine`]: crate::data::line::LogLine
//! [`LineCursor`]: crate::data::line::LineCursor
//! [`ScanDirection`]: crate::data::line::ScanDirection
//! [`Marker`]: crate::data::line::Marker
//! [`LogTimestamp`]: crate::data::datetime::LogTimestamp
//! [`BootRecord`]: crate::data::record::BootRecord

pub mod datetime;
pub mod line;
pub mod record;
