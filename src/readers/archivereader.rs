// src/readers/archivereader.rs

//! The `archivereader` module is for reading files out of boot archives.
//!
//! A boot archive is a `.tar` possibly compressed with gzip, xz, or bzip2.
//! The compression is detected from the leading "magic" bytes, like
//! Python `tarfile.open` does, not from the file name.
//!
//! Archives are small (a few megabytes) so an archive is decompressed
//! entirely into memory. This also allows reading an archive nested in
//! another archive, e.g. `cloud-init.tar.gz` inside a boot archive.

use std::io::{Error, ErrorKind, Read, Result};
use std::path::Path;

use crate::common::{err_from_err_path, err_invalid_data, Bytes, FPath, FileTypeArchive};

use ::bzip2_rs::DecoderReader as Bz2DecoderReader;
// `flate2` is for gzip files.
use ::flate2::read::GzDecoder;
// `lzma_rs` is for xz files.
use ::lzma_rs;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// gzip magic bytes
pub const MAGIC_GZ: [u8; 2] = [0x1F, 0x8B];
/// xz magic bytes
pub const MAGIC_XZ: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];
/// bzip2 magic bytes
pub const MAGIC_BZ2: [u8; 3] = [b'B', b'Z', b'h'];

/// Determine the archive type from the leading bytes of `bytes`.
///
/// Anything that is not gzip, xz, or bzip2 is presumed to be a plain
/// `.tar`; reading it as one will fail if it is not.
pub fn archive_type_from_magic(bytes: &[u8]) -> FileTypeArchive {
    let archive_type = if bytes.starts_with(&MAGIC_GZ) {
        FileTypeArchive::TarGz
    } else if bytes.starts_with(&MAGIC_XZ) {
        FileTypeArchive::TarXz
    } else if bytes.starts_with(&MAGIC_BZ2) {
        FileTypeArchive::TarBz2
    } else {
        FileTypeArchive::Tar
    };
    defñ!("return {:?}", archive_type);

    archive_type
}

/// Decompress `bytes` of `archive_type` into the plain `.tar` bytes.
///
/// `fpath` is only used in error messages.
pub fn decompress_bytes(bytes: &[u8], archive_type: FileTypeArchive, fpath: &FPath) -> Result<Bytes> {
    defn!("(bytes len {}, {:?}, {:?})", bytes.len(), archive_type, fpath);
    let mut buffer: Bytes = Bytes::with_capacity(bytes.len() * 4);
    match archive_type {
        FileTypeArchive::Tar => {
            buffer.extend_from_slice(bytes);
        }
        FileTypeArchive::TarGz => {
            let mut decoder: GzDecoder<&[u8]> = GzDecoder::new(bytes);
            if let Err(err) = decoder.read_to_end(&mut buffer) {
                defx!("GzDecoder.read_to_end() Error, return {:?}", err);
                return Err(err_from_err_path(&err, fpath, Some("GzDecoder.read_to_end() failed")));
            }
        }
        FileTypeArchive::TarXz => {
            let mut bufreader: &[u8] = bytes;
            if let Err(err) = lzma_rs::xz_decompress(&mut bufreader, &mut buffer) {
                defx!("xz_decompress Error, return {:?}", err);
                return Err(err_invalid_data(format!("{:?}", err), fpath, "xz_decompress() failed"));
            }
        }
        FileTypeArchive::TarBz2 => {
            let mut decoder = Bz2DecoderReader::new(bytes);
            if let Err(err) = decoder.read_to_end(&mut buffer) {
                defx!("Bz2DecoderReader.read_to_end() Error, return {:?}", err);
                return Err(err_from_err_path(&err, fpath, Some("Bz2DecoderReader.read_to_end() failed")));
            }
        }
    }
    defx!("return Ok(buffer len {})", buffer.len());

    Ok(buffer)
}

/// The final path component of a tar entry path, e.g. `cloud-init.log`
/// for `cloud-init-logs-2023-03-27/cloud-init.log` and `systemd_blame.txt`
/// for `./systemd_blame.txt`.
fn entry_file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Read the first regular-file entry of `tar_bytes` whose final path
/// component is `file_name`.
///
/// Returns `Ok(None)` if there is no such entry. An entry with fewer bytes
/// than its header size is an `UnexpectedEof` error.
pub fn tar_entry_by_name(tar_bytes: &[u8], file_name: &str, fpath: &FPath) -> Result<Option<Bytes>> {
    defn!("(tar_bytes len {}, {:?}, {:?})", tar_bytes.len(), file_name, fpath);
    let mut archive = tar::Archive::new(tar_bytes);
    let entries = match archive.entries() {
        Ok(val) => val,
        Err(err) => {
            defx!("archive.entries() Error, return {:?}", err);
            return Err(err_from_err_path(&err, fpath, Some("archive.entries() failed")));
        }
    };
    for entry_res in entries {
        let mut entry = match entry_res {
            Ok(val) => val,
            Err(err) => {
                defx!("entry Error, return {:?}", err);
                return Err(err_from_err_path(&err, fpath, Some("reading tar entry failed")));
            }
        };
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let matches: bool = match entry.path() {
            Ok(path) => {
                defo!("entry {:?}", path);
                entry_file_name(&path) == Some(file_name)
            }
            Err(_err) => {
                defo!("entry.path() Err {:?}", _err);
                false
            }
        };
        if !matches {
            continue;
        }
        // the header size of a corrupt archive may be far larger than the
        // archive itself
        let size: u64 = entry.size();
        let capacity: u64 = std::cmp::min(size, tar_bytes.len() as u64);
        let mut data: Bytes = Bytes::with_capacity(capacity as usize);
        if let Err(err) = entry.read_to_end(&mut data) {
            defx!("entry.read_to_end() Error, return {:?}", err);
            return Err(err_from_err_path(&err, fpath, Some("reading tar entry data failed")));
        }
        if (data.len() as u64) < size {
            defx!("entry truncated, read {} of {} bytes, return Err", data.len(), size);
            let err = Error::new(
                ErrorKind::UnexpectedEof,
                format!("tar entry {:?} has {} of {} bytes", file_name, data.len(), size),
            );
            return Err(err_from_err_path(&err, fpath, Some("tar entry is truncated")));
        }
        defx!("found {:?}, return Ok(Some(data len {}))", file_name, data.len());

        return Ok(Some(data));
    }
    defx!("{:?} not found, return Ok(None)", file_name);

    Ok(None)
}

/// Find `file_name` in the possibly compressed archive `archive_bytes`.
pub fn archive_entry(archive_bytes: &[u8], file_name: &str, fpath: &FPath) -> Result<Option<Bytes>> {
    defn!("(archive_bytes len {}, {:?}, {:?})", archive_bytes.len(), file_name, fpath);
    let archive_type: FileTypeArchive = archive_type_from_magic(archive_bytes);
    let entry = match archive_type {
        FileTypeArchive::Tar => tar_entry_by_name(archive_bytes, file_name, fpath)?,
        _ => {
            let tar_bytes: Bytes = decompress_bytes(archive_bytes, archive_type, fpath)?;
            tar_entry_by_name(&tar_bytes, file_name, fpath)?
        }
    };
    defx!("return found {}", entry.is_some());

    Ok(entry)
}

/// Read the entire file at `path`.
///
/// The file handle is closed before returning, on success or error.
pub fn read_archive_file(path: &Path) -> Result<Bytes> {
    defn!("({:?})", path);
    let fpath: FPath = path.to_string_lossy().to_string();
    let bytes: Bytes = {
        let mut file = match std::fs::File::open(path) {
            Ok(val) => val,
            Err(err) => {
                defx!("File::open() Error, return {:?}", err);
                return Err(err_from_err_path(&err, &fpath, Some("File::open() failed")));
            }
        };
        let mut bytes: Bytes = Bytes::new();
        if let Err(err) = file.read_to_end(&mut bytes) {
            defx!("file.read_to_end() Error, return {:?}", err);
            return Err(err_from_err_path(&err, &fpath, Some("read_to_end() failed")));
        }

        bytes
    };
    if bytes.is_empty() {
        defx!("empty file, return Err");
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("file {:?} is empty", fpath),
        ));
    }
    defx!("return Ok(bytes len {})", bytes.len());

    Ok(bytes)
}
