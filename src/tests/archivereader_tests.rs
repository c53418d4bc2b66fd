// src/tests/archivereader_tests.rs

//! tests for `archivereader.rs` functions

#![allow(non_snake_case)]

use std::io::ErrorKind;

use crate::common::{FPath, FileTypeArchive};
use crate::debug::helpers::{
    create_file_in_dir,
    create_temp_dir,
    gz_bytes,
    tar_bytes,
    tar_bytes_claimed_size,
    xz_bytes,
    TAR_BZ2_SAMPLE,
};
use crate::readers::archivereader::{
    archive_entry,
    archive_type_from_magic,
    decompress_bytes,
    read_archive_file,
    tar_entry_by_name,
};

use ::test_case::test_case;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn fpath_test() -> FPath {
    FPath::from("/tmp/test-archive")
}

fn sample_tar() -> Vec<u8> {
    tar_bytes(&[
        ("./systemd_blame.txt", &b"2.539s cloud-init-local.service\n"[..]),
        ("cloud-init-logs-2023-03-27/cloud-init.log", &b"log data\n"[..]),
        ("cloud-init-logs-2023-03-27/nested/systemd_blame.txt", &b"not this one\n"[..]),
    ])
}

#[test]
fn test_archive_type_from_magic_tar() {
    assert_eq!(archive_type_from_magic(&sample_tar()), FileTypeArchive::Tar);
}

#[test]
fn test_archive_type_from_magic_gz() {
    assert_eq!(archive_type_from_magic(&gz_bytes(&sample_tar())), FileTypeArchive::TarGz);
}

#[test]
fn test_archive_type_from_magic_xz() {
    assert_eq!(archive_type_from_magic(&xz_bytes(&sample_tar())), FileTypeArchive::TarXz);
}

#[test_case(b"BZh91AY&SY", FileTypeArchive::TarBz2; "bz2")]
#[test_case(b"", FileTypeArchive::Tar; "empty")]
#[test_case(b"\x1f", FileTypeArchive::Tar; "short gz magic")]
fn test_archive_type_from_magic_bytes(bytes: &[u8], expect: FileTypeArchive) {
    assert_eq!(archive_type_from_magic(bytes), expect);
}

#[test]
fn test_decompress_bytes_gz() {
    let tar = sample_tar();
    let out = decompress_bytes(&gz_bytes(&tar), FileTypeArchive::TarGz, &fpath_test()).unwrap();
    assert_eq!(out, tar);
}

#[test]
fn test_decompress_bytes_xz() {
    let tar = sample_tar();
    let out = decompress_bytes(&xz_bytes(&tar), FileTypeArchive::TarXz, &fpath_test()).unwrap();
    assert_eq!(out, tar);
}

#[test]
fn test_archive_type_from_magic_bz2_sample() {
    assert_eq!(archive_type_from_magic(TAR_BZ2_SAMPLE), FileTypeArchive::TarBz2);
}

#[test]
fn test_decompress_bytes_bz2() {
    let out = decompress_bytes(TAR_BZ2_SAMPLE, FileTypeArchive::TarBz2, &fpath_test()).unwrap();
    // Python `tarfile` pads to a 10240 byte record
    assert_eq!(out.len(), 10240);
    let entry = tar_entry_by_name(&out, "cloud-init.log", &fpath_test()).unwrap();
    assert_eq!(entry.as_deref(), Some(&b"log data\n"[..]));
}

#[test_case("systemd_blame.txt", Some(&b"2.539s cloud-init-local.service\n"[..]); "leading dot dir")]
#[test_case("cloud-init.log", Some(&b"log data\n"[..]); "in subdirectory")]
#[test_case("cloud-init.tar.gz", None; "absent")]
fn test_archive_entry_bz2(file_name: &str, expect: Option<&[u8]>) {
    let entry = archive_entry(TAR_BZ2_SAMPLE, file_name, &fpath_test()).unwrap();
    assert_eq!(entry.as_deref(), expect);
}

#[test_case(FileTypeArchive::TarGz)]
#[test_case(FileTypeArchive::TarXz)]
fn test_decompress_bytes_corrupt(archive_type: FileTypeArchive) {
    let bytes: &[u8] = b"this is not compressed data at all";
    let err = decompress_bytes(bytes, archive_type, &fpath_test()).unwrap_err();
    assert!(err.to_string().contains("/tmp/test-archive"), "{}", err);
}

#[test_case("systemd_blame.txt", Some(&b"2.539s cloud-init-local.service\n"[..]); "leading dot dir")]
#[test_case("cloud-init.log", Some(&b"log data\n"[..]); "in subdirectory")]
#[test_case("cloud-init.tar.gz", None; "absent")]
#[test_case("cloud-init-logs-2023-03-27", None; "directory name")]
fn test_tar_entry_by_name(file_name: &str, expect: Option<&[u8]>) {
    let entry = tar_entry_by_name(&sample_tar(), file_name, &fpath_test()).unwrap();
    assert_eq!(entry.as_deref(), expect);
}

#[test]
fn test_tar_entry_by_name_not_a_tar() {
    let bytes: Vec<u8> = vec![b'x'; 1024];
    let err = tar_entry_by_name(&bytes, "systemd_blame.txt", &fpath_test()).unwrap_err();
    assert!(err.to_string().contains("/tmp/test-archive"), "{}", err);
}

#[test_case(b"2.539s cloud-init-local.service\n".len() as u64, true; "exact size")]
#[test_case(1 << 20, false; "one MiB")]
#[test_case(1 << 46, false; "base-256 size")]
#[test_case(u64::MAX >> 1, false; "near u64 max")]
fn test_tar_entry_by_name_claimed_size(size: u64, expect_ok: bool) {
    let data: &[u8] = b"2.539s cloud-init-local.service\n";
    let bytes = tar_bytes_claimed_size("./systemd_blame.txt", data, size);
    let result = tar_entry_by_name(&bytes, "systemd_blame.txt", &fpath_test());
    if expect_ok {
        assert_eq!(result.unwrap().as_deref(), Some(data));
    } else {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof, "{}", err);
        assert!(err.to_string().contains("/tmp/test-archive"), "{}", err);
    }
}

#[test]
fn test_archive_entry_claimed_size_gz() {
    let bytes = gz_bytes(&tar_bytes_claimed_size("./systemd_blame.txt", b"2.539s x\n", 1 << 46));
    let err = archive_entry(&bytes, "systemd_blame.txt", &fpath_test()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof, "{}", err);
}

#[test]
fn test_archive_entry_plain_gz_xz() {
    let tar = sample_tar();
    for bytes in [tar.clone(), gz_bytes(&tar), xz_bytes(&tar)].iter() {
        let entry = archive_entry(bytes, "cloud-init.log", &fpath_test()).unwrap();
        assert_eq!(entry.as_deref(), Some(&b"log data\n"[..]));
    }
}

#[test]
fn test_archive_entry_nested() {
    let inner = gz_bytes(&tar_bytes(&[("logs/cloud-init.log", &b"inner\n"[..])]));
    let outer = xz_bytes(&tar_bytes(&[("./cloud-init.tar.gz", inner.as_slice())]));
    let bundle = archive_entry(&outer, "cloud-init.tar.gz", &fpath_test())
        .unwrap()
        .unwrap();
    let log = archive_entry(&bundle, "cloud-init.log", &fpath_test())
        .unwrap()
        .unwrap();
    assert_eq!(log, b"inner\n");
}

#[test]
fn test_read_archive_file() {
    let tmpdir = create_temp_dir();
    let path = create_file_in_dir(tmpdir.path(), "jammy/a-base-1st.tar", b"some bytes");
    assert_eq!(read_archive_file(&path).unwrap(), b"some bytes");
}

#[test]
fn test_read_archive_file_empty() {
    let tmpdir = create_temp_dir();
    let path = create_file_in_dir(tmpdir.path(), "empty.tar", b"");
    let err = read_archive_file(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_read_archive_file_not_found() {
    let tmpdir = create_temp_dir();
    let path = tmpdir.path().join("does-not-exist.tar");
    let err = read_archive_file(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
