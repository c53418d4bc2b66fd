// src/tests/mod.rs

//! Tests for _btelib_.
//!
//! Tests are placed at `src/tests/`, inside the `btelib`, for
//! crate-internal visibility. Tests placed at top-level path `tests/` only
//! see the public API.

pub mod archivereader_tests;
pub mod common;
