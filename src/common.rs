// src/common.rs
//
// common imports, type aliases, and other globals (avoids circular imports)

use std::fmt;
use std::io::{Error, ErrorKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// file-handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub use std::fs::File;
pub use std::path::Path;

/// `F`ake `Path` or `F`ile `Path`
pub type FPath = String;

/// Separates the path of an archive from the path of an entry within
/// it, e.g. `path/to/boot.tar.xz|cloud-init.tar.gz`
pub const SUBPATH_SEP: char = '|';

/// Offset into a file or buffer in bytes
pub type FileOffset = usize;

/// Sequence of Bytes
pub type Bytes = Vec<u8>;

/// General purpose counter
pub type Count = u64;

/// Single-byte newLine char as u8
#[allow(non_upper_case_globals)]
pub const NLu8: u8 = b'\n';
/// Single-byte carriage return char as u8
#[allow(non_upper_case_globals)]
pub const CRu8: u8 = b'\r';

/// The container formats of a boot archive or a nested log bundle.
///
/// Determined from the leading "magic" bytes, the same way Python
/// `tarfile.open` does, so the file name suffix does not matter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FileTypeArchive {
    /// plain `.tar`
    Tar,
    /// `.tar.gz`, `.tgz`
    TarGz,
    /// `.tar.xz`, `.txz`
    TarXz,
    /// `.tar.bz2`, `.tbz2`
    TarBz2,
}

impl fmt::Display for FileTypeArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileTypeArchive::Tar => "tar",
            FileTypeArchive::TarGz => "tar.gz",
            FileTypeArchive::TarXz => "tar.xz",
            FileTypeArchive::TarBz2 => "tar.bz2",
        };
        write!(f, "{}", s)
    }
}

/// Create a new `Error` with the path attached to the error message.
pub fn err_from_err_path(error: &Error, fpath: &FPath, mesg: Option<&str>) -> Error {
    match mesg {
        Some(mesg_) => Error::new(error.kind(), format!("{} for file {:?}; {}", error, fpath, mesg_)),
        None => Error::new(error.kind(), format!("{} for file {:?}", error, fpath)),
    }
}

/// Create a new `Error` of kind `InvalidData` from any displayable
/// error, e.g. a decoder error that is not a `std::io::Error`.
pub fn err_invalid_data<E: fmt::Display>(error: E, fpath: &FPath, mesg: &str) -> Error {
    Error::new(
        ErrorKind::InvalidData,
        format!("{} for file {:?}; {}", error, fpath, mesg),
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// extraction errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Errors from the extraction functions in [`readers::blame`] and
/// [`readers::cloudinitlog`].
///
/// The kinds are kept apart so a caller can tell an expected absence
/// from a broken log.
///
/// [`readers::blame`]: crate::readers::blame
/// [`readers::cloudinitlog`]: crate::readers::cloudinitlog
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractError {
    /// A required marker never appeared in the scanned lines.
    MarkerNotFound {
        marker: String,
    },
    /// A located line did not have the expected token structure.
    MalformedLine {
        line: String,
        reason: String,
    },
    /// A clock field of a located line could not be parsed.
    TimestampParse {
        field: String,
        reason: String,
    },
}

impl ExtractError {
    /// Returns `true` if this is [`ExtractError::MarkerNotFound`].
    pub const fn is_marker_not_found(&self) -> bool {
        matches!(*self, ExtractError::MarkerNotFound { .. })
    }

    /// Returns `true` if this is [`ExtractError::MalformedLine`].
    pub const fn is_malformed_line(&self) -> bool {
        matches!(*self, ExtractError::MalformedLine { .. })
    }

    /// Returns `true` if this is [`ExtractError::TimestampParse`].
    pub const fn is_timestamp_parse(&self) -> bool {
        matches!(*self, ExtractError::TimestampParse { .. })
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::MarkerNotFound { marker } => {
                write!(f, "marker {:?} not found", marker)
            }
            ExtractError::MalformedLine { line, reason } => {
                write!(f, "malformed line {:?}: {}", line, reason)
            }
            ExtractError::TimestampParse { field, reason } => {
                write!(f, "bad timestamp {:?}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// `Result` for the extraction functions
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
