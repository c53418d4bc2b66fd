// src/debug/mod.rs

//! The `debug` module is the printing macros for errors and warnings,
//! and helper functions for test builds.

#[cfg(test)]
pub mod helpers;

pub mod printers;
