use sift_core::{cell, CanonicalRecord, CanonicalRow, RawTable};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Statement ended inside the {0} leading rows to skip")]
    TooShort(usize),
}

/// Read a bank export into a [`RawTable`] keyed by its header row.
///
/// `skip_rows` physical lines (account banners, statement period notes) are
/// discarded before the header.
pub fn read_statement<R: Read>(data: R, skip_rows: usize) -> Result<RawTable, CsvError> {
    let mut buffered = BufReader::new(data);
    let mut discard = String::new();
    for _ in 0..skip_rows {
        discard.clear();
        if buffered.read_line(&mut discard)? == 0 {
            return Err(CsvError::TooShort(skip_rows));
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(buffered);

    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut table = RawTable::new(columns);

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(cell).collect());
    }

    Ok(table)
}

pub fn read_statement_file(path: &Path, skip_rows: usize) -> Result<RawTable, CsvError> {
    read_statement(File::open(path)?, skip_rows)
}

/// Write rows in the five-column canonical schema, header included.
pub fn write_canonical_csv<W: Write>(rows: &[CanonicalRow], out: W) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(CanonicalRecord::from(row))?;
    }
    writer.flush()?;
    Ok(())
}
