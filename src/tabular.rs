//! CSV collaborators: load an exported table into [`Record`]s and write
//! tables back out in a spreadsheet-friendly form.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};
use crate::model::Record;

/// Header cells are lower-cased and spaces become underscores.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Read a CSV file whose first row is the header.
///
/// Short rows leave trailing columns absent; surplus cells are ignored.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| malformed(path, err))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| malformed(path, err))?;
        let mut record = Record::new();
        for (index, header) in headers.iter().enumerate() {
            record.insert(header.as_str(), row.get(index).map(str::to_string));
        }
        records.push(record);
    }
    Ok(records)
}

fn malformed(path: &Path, err: csv::Error) -> MigrateError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => MigrateError::Io(io),
        _ => MigrateError::MalformedTable {
            path: path.display().to_string(),
            message,
        },
    }
}

/// Write `header` then `rows`, replacing `path` only once the whole table is on disk.
pub fn write_table<R, C>(path: &Path, header: &[String], rows: R) -> Result<()>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<[u8]>,
{
    let staging = staging_path(path);
    let result = (|| -> Result<()> {
        let mut writer = csv::Writer::from_path(&staging)?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            fs::rename(&staging, path)?;
            Ok(())
        }
        Err(err) => {
            let _ = fs::remove_file(&staging);
            Err(err)
        }
    }
}

/// Write records whose columns are the union of every record's keys, in
/// first-seen order. Absent values become empty cells.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }

    let rows = records.iter().map(|record| {
        columns
            .iter()
            .map(|column| record.get(column).unwrap_or_default())
            .collect::<Vec<_>>()
    });
    write_table(path, &columns, rows)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
