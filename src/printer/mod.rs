// src/printer/mod.rs

//! The `printer` module is for writing user-facing output: the
//! [`BootRecord`s] as CSV and the CLI option `--summary`.
//!
//! [`BootRecord`s]: crate::data::record::BootRecord

pub mod csvwriter;
pub mod summary;
