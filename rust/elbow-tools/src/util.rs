// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use std::any::Any;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_csv::{reader::Format, ReaderBuilder, Writer};
use arrow_schema::ArrowError;
use elbow_core::Result;
use log::debug;

/// Rows sampled to infer the column types of a CSV file.
const SCHEMA_INFER_RECORDS: usize = 1000;

/// Text of a panic payload, for the payloads `panic!` produces.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Report panics as a single `elbow-tools panicked at <file>:<line>: <message>`
/// line, followed by a backtrace when `RUST_BACKTRACE` is set and not `0`.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!(" at {}:{}", l.file(), l.line()))
            .unwrap_or_default();
        eprintln!(
            "elbow-tools panicked{}: {}",
            location,
            panic_message(panic_info.payload())
        );
        if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v != "0") {
            eprintln!("{}", std::backtrace::Backtrace::force_capture());
        }
    }));
}

/// Read a CSV file with a header row, inferring the column types.
pub fn read_csv(path: &Path) -> Result<Vec<RecordBatch>> {
    let mut file = File::open(path)?;
    let format = Format::default().with_header(true);
    let (schema, num_records) = format.infer_schema(&mut file, Some(SCHEMA_INFER_RECORDS))?;
    debug!(
        "Inferred schema of {} from {} records: {:?}",
        path.display(),
        num_records,
        schema
    );
    file.seek(SeekFrom::Start(0))?;

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_format(format)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    Ok(batches)
}

/// Write batches to a CSV file with a header row, replacing any existing file.
pub fn write_csv(path: &Path, batches: &[RecordBatch]) -> Result<()> {
    let mut writer = Writer::new(File::create(path)?);
    for batch in batches {
        writer.write(batch)?;
    }
    Ok(())
}
