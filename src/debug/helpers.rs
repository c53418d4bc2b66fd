// src/debug/helpers.rs

//! Helper functions for testing: temporary directories and in-memory
//! archives shaped like boot archives.

use std::fs::create_dir_all;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::Bytes;

use ::flate2::write::GzEncoder;
use ::flate2::Compression;
use ::lzma_rs;
use ::si_trace_print::defñ;
use ::tar::{Builder, EntryType, Header};

#[doc(hidden)]
pub use ::tempfile::TempDir;

/// Temporary directories default to this prefix.
pub const STR_TEMPDIR_PREFIX: &str = "tmp-bte-test-";

/// A `systemd-analyze blame` report with `cloud-init-local.service`.
pub const BLAME_REPORT: &str = "\
         5.112s snapd.seeded.service
  1min 3.201s apt-daily.service
         2.539s cloud-init-local.service
          539ms systemd-journald.service
         1.004s cloud-init-local.service
";

/// A `cloud-init.log` with two datasource searches and two
/// `netplan generate` runs; the last of each is the expected one.
pub const CLOUDINIT_LOG: &str = "\
2023-03-27 15:49:05,001 - util.py[DEBUG]: cloud-init mode 'init' took 9.999 seconds (10.00)
2023-03-27 15:49:05,002 - handlers.py[DEBUG]: finish: init-local: SUCCESS: searching for local datasources
2023-03-27 15:49:06,100 - subp.py[DEBUG]: Running command ['netplan', 'generate'] with allowed return codes [0] (shell=False, capture=True)
2023-03-27 15:49:06,200 - subp.py[DEBUG]: Running command ['udevadm', 'settle'] with allowed return codes [0] (shell=False, capture=True)
2023-03-27 15:49:06,560 - subp.py[DEBUG]: Running command ['netplan', 'generate'] with allowed return codes [0] (shell=False, capture=True)
2023-03-27 15:49:06,890 - subp.py[DEBUG]: Running command ['udevadm', 'test-builtin', 'net_setup_link', '/sys/class/net/ens4'] with allowed return codes [0] (shell=False, capture=True)
2023-03-27 15:52:22,568 - util.py[DEBUG]: cloud-init mode 'init' took 0.333 seconds (0.34)
2023-03-27 15:52:22,569 - handlers.py[DEBUG]: finish: init-local: SUCCESS: searching for local datasources
2023-03-27 15:52:23,001 - handlers.py[DEBUG]: start: init-network: searching for network datasources
";

/// A `.tar.bz2` holding `./systemd_blame.txt` with
/// `2.539s cloud-init-local.service\n` and
/// `cloud-init-logs-2023-03-27/cloud-init.log` with `log data\n`.
///
/// Made by Python `tarfile` (GNU format) and `bz2.compress(.., 9)`.
pub const TAR_BZ2_SAMPLE: &[u8] = &[
    0x42, 0x5A, 0x68, 0x39, 0x31, 0x41, 0x59, 0x26, 0x53, 0x59, 0xDE, 0x6B,
    0xC7, 0x3E, 0x00, 0x00, 0x69, 0xFF, 0x82, 0xCA, 0x10, 0x02, 0x00, 0x40,
    0x03, 0xFF, 0xA0, 0x00, 0x02, 0x00, 0x00, 0xFE, 0xA7, 0x9F, 0x60, 0x00,
    0x02, 0x04, 0x08, 0x30, 0x00, 0xBB, 0x36, 0x2B, 0xD5, 0x32, 0x06, 0x26,
    0x83, 0x4D, 0x00, 0xD0, 0x03, 0x26, 0x82, 0x50, 0xA9, 0xE4, 0x9E, 0x28,
    0xD3, 0x46, 0xF5, 0x4D, 0x1A, 0x06, 0x9A, 0x68, 0x0D, 0x04, 0x92, 0xA6,
    0x35, 0x31, 0x1A, 0x36, 0x91, 0xA0, 0x7A, 0x4C, 0x11, 0x81, 0xB4, 0x3F,
    0x73, 0x22, 0x98, 0x69, 0x58, 0x00, 0x67, 0x24, 0x84, 0x3F, 0xAB, 0xC9,
    0xC3, 0x81, 0x2D, 0x2C, 0x38, 0x42, 0x18, 0x56, 0x7B, 0x8B, 0x91, 0x90,
    0xC7, 0x9B, 0x2E, 0x65, 0xC1, 0x37, 0x0F, 0x5B, 0x63, 0xAF, 0x97, 0x1A,
    0xCB, 0x76, 0x80, 0x90, 0xE9, 0x60, 0x14, 0xBD, 0xD3, 0x49, 0x7C, 0xAA,
    0x16, 0x1C, 0x39, 0x99, 0xCA, 0x2B, 0x36, 0x47, 0x2A, 0x4A, 0x14, 0x52,
    0x44, 0xC1, 0x61, 0x13, 0x64, 0x58, 0xD4, 0x34, 0xDB, 0x42, 0xBA, 0x96,
    0xE2, 0xEC, 0x43, 0x0F, 0x59, 0x5D, 0x9F, 0x0E, 0x1E, 0xC6, 0x92, 0xA1,
    0xA7, 0x0F, 0xC4, 0x3C, 0x72, 0xF3, 0x5E, 0xD2, 0xA4, 0x6F, 0x2D, 0x81,
    0x80, 0x14, 0x86, 0x77, 0x47, 0x59, 0x20, 0xC8, 0x20, 0x1D, 0x62, 0x65,
    0x8D, 0x8C, 0xEB, 0x92, 0x02, 0x41, 0xB8, 0xBB, 0x92, 0x29, 0xC2, 0x84,
    0x86, 0xF3, 0x5E, 0x39, 0xF0,
];

/// Create a temporary directory
pub fn create_temp_dir() -> TempDir {
    defñ!();
    match ::tempfile::Builder::new()
        .prefix(STR_TEMPDIR_PREFIX)
        .tempdir()
    {
        Ok(val) => val,
        Err(err) => panic!("tempfile::Builder::tempdir() return Err {}", err),
    }
}

/// Write `data` to `relpath` under `dir`, creating parent directories.
pub fn create_file_in_dir(dir: &Path, relpath: &str, data: &[u8]) -> PathBuf {
    let path: PathBuf = dir.join(relpath);
    if let Some(parent) = path.parent() {
        if let Err(err) = create_dir_all(parent) {
            panic!("create_dir_all({:?}) return Err {}", parent, err);
        }
    }
    if let Err(err) = std::fs::write(&path, data) {
        panic!("fs::write({:?}) return Err {}", path, err);
    }

    path
}

/// Create a plain `.tar` holding `entries` of `(path, data)`.
pub fn tar_bytes(entries: &[(&str, &[u8])]) -> Bytes {
    let mut builder: Builder<Bytes> = Builder::new(Bytes::new());
    for (path, data) in entries.iter() {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1679932146);
        if let Err(err) = builder.append_data(&mut header, path, *data) {
            panic!("Builder::append_data({:?}) return Err {}", path, err);
        }
    }
    match builder.into_inner() {
        Ok(val) => val,
        Err(err) => panic!("Builder::into_inner() return Err {}", err),
    }
}

/// Create a plain `.tar` with one regular-file entry `path` holding `data`
/// whose header claims `size` bytes, like a corrupt or truncated archive.
///
/// `size` above 8 GiB is written in the GNU base-256 form.
pub fn tar_bytes_claimed_size(path: &str, data: &[u8], size: u64) -> Bytes {
    let mut header = Header::new_gnu();
    if let Err(err) = header.set_path(path) {
        panic!("Header::set_path({:?}) return Err {}", path, err);
    }
    header.set_entry_type(EntryType::Regular);
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(1679932146);
    header.set_cksum();
    let mut bytes: Bytes = header.as_bytes().to_vec();
    bytes.extend_from_slice(data);
    let padding: usize = (512 - data.len() % 512) % 512;
    bytes.resize(bytes.len() + padding + 1024, 0);

    bytes
}

/// gzip `data`
pub fn gz_bytes(data: &[u8]) -> Bytes {
    let mut encoder = GzEncoder::new(Bytes::new(), Compression::default());
    if let Err(err) = encoder.write_all(data) {
        panic!("GzEncoder::write_all() return Err {}", err);
    }
    match encoder.finish() {
        Ok(val) => val,
        Err(err) => panic!("GzEncoder::finish() return Err {}", err),
    }
}

/// xz `data`
pub fn xz_bytes(data: &[u8]) -> Bytes {
    let mut output: Bytes = Bytes::new();
    let mut input: &[u8] = data;
    if let Err(err) = lzma_rs::xz_compress(&mut input, &mut output) {
        panic!("xz_compress() return Err {}", err);
    }

    output
}

/// The `cloud-init.tar.gz` bundle holding `log` as
/// `cloud-init-logs-2023-03-27/cloud-init.log`.
pub fn cloudinit_bundle_bytes(log: &[u8]) -> Bytes {
    gz_bytes(&tar_bytes(&[
        ("cloud-init-logs-2023-03-27/version", &b"25.1\n"[..]),
        ("cloud-init-logs-2023-03-27/cloud-init.log", log),
    ]))
}

/// A plain `.tar` boot archive holding `./systemd_blame.txt` and, if
/// `log` is given, `./cloud-init.tar.gz`.
pub fn boot_archive_tar_bytes(blame: &[u8], log: Option<&[u8]>) -> Bytes {
    match log {
        Some(log_) => {
            let bundle: Bytes = cloudinit_bundle_bytes(log_);
            tar_bytes(&[
                ("./systemd_blame.txt", blame),
                ("./systemd_critical_chain.txt", &b"graphical.target @9.1s\n"[..]),
                ("./cloud-init.tar.gz", bundle.as_slice()),
            ])
        }
        None => tar_bytes(&[("./systemd_blame.txt", blame)]),
    }
}
