// src/printer/csvwriter.rs

//! Write [`BootRecord`]s as delimited text, one row per boot archive.
//!
//! ```text
//! release,timestamp,base_or_update,boot,systemd_local_time,local_time,netplan_time
//! jammy,20230327T154906,base,1st,2.539,,
//! jammy,20230327T155222,base,2nd,2.611,0.333,0.33
//! ```
//!
//! An absent metric is an empty field.

use std::io::{Error, ErrorKind, Result, Write};

use crate::data::record::{
    BootRecord,
    METRIC_LOCAL_TIME,
    METRIC_NETPLAN_TIME,
    METRIC_SYSTEMD_LOCAL_TIME,
};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Column names in order.
pub const CSV_HEADER: [&str; 7] = [
    "release",
    "timestamp",
    "base_or_update",
    "boot",
    METRIC_SYSTEMD_LOCAL_TIME,
    METRIC_LOCAL_TIME,
    METRIC_NETPLAN_TIME,
];

fn csv_err(err: csv::Error) -> Error {
    Error::new(ErrorKind::Other, err)
}

fn metric_field(value: Option<f64>) -> String {
    match value {
        // whole numbers keep a decimal point, `1.0` not `1`
        Some(val) if val.is_finite() && val.fract() == 0.0 => format!("{:.1}", val),
        Some(val) => val.to_string(),
        None => String::new(),
    }
}

/// Writes the header once, then one row per [`BootRecord`].
pub struct BootRecordCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    /// rows written, not counting the header
    rows: usize,
}

impl<W: Write> BootRecordCsvWriter<W> {
    /// Create the writer and write the header row.
    pub fn new(inner: W) -> Result<Self> {
        defn!();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(CSV_HEADER).map_err(csv_err)?;
        defx!();

        Ok(BootRecordCsvWriter { writer, rows: 0 })
    }

    pub fn write(&mut self, record: &BootRecord) -> Result<()> {
        defñ!("{:?}", record.path);
        let mut row: Vec<String> = vec![
            record.release.clone(),
            record.name.timestamp.clone(),
            record.name.base_or_update.clone(),
            record.name.boot.clone(),
        ];
        for (_name, value) in record.metrics.named() {
            row.push(metric_field(value));
        }
        self.writer.write_record(&row).map_err(csv_err)?;
        self.rows += 1;

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))
    }
}
