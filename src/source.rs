//! Reading a job's source rows from its materials file.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::SourceRow;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Invalid row {line} in {path}: {source}")]
    Row {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Read every row of a delimited materials file.
///
/// The first line is a header; `id`, `fileurl` and `name` are matched by
/// name and any other column is ignored.
pub fn read_source_rows(path: &Path, delimiter: u8) -> Result<Vec<SourceRow>, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Open {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    read_rows(file, delimiter).map_err(|(line, source)| SourceError::Row {
        path: path.to_path_buf(),
        line,
        source,
    })
}

/// Parse rows from any reader. Errors carry the 1-based line number.
pub fn read_rows<R: io::Read>(
    reader: R,
    delimiter: u8,
) -> Result<Vec<SourceRow>, (u64, csv::Error)> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize::<SourceRow>() {
        let row = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            (line, e)
        })?;
        rows.push(row);
    }
    Ok(rows)
}
