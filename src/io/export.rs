//! CSV export of the production chronics.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::assemble::{OutputTable, ProductionChronics};
use crate::config::OutputConfig;
use crate::error::{GenerationError, Result};

/// Header of the time index column.
pub const TIME_COLUMN: &str = "datetime";
/// Timestamp layout of the time index column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serializes one table into a byte sink.
pub trait TableWriter {
    /// Writes `table` to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn write_table(&self, table: &OutputTable, writer: &mut dyn Write) -> Result<()>;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;
}

/// Delimited text writer with fixed decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvTableWriter {
    delimiter: u8,
    precision: usize,
}

impl Default for CsvTableWriter {
    fn default() -> Self {
        Self::new(b';', 1)
    }
}

impl CsvTableWriter {
    pub fn new(delimiter: u8, precision: usize) -> Self {
        Self {
            delimiter,
            precision,
        }
    }

    /// Writer configured by the `[output]` section.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the delimiter is not a single ASCII
    /// character.
    pub fn from_config(cfg: &OutputConfig) -> Result<Self> {
        if !cfg.delimiter.is_ascii() {
            return Err(GenerationError::config(
                "output.delimiter",
                format!("\"{}\" is not an ASCII character", cfg.delimiter),
            ));
        }
        Ok(Self::new(cfg.delimiter as u8, cfg.float_precision))
    }

    fn format_value(&self, v: f64) -> String {
        // Avoid "-0.0" for values that round to zero.
        let rounded = format!("{:.*}", self.precision, v);
        if rounded.starts_with('-') && rounded[1..].bytes().all(|b| b == b'0' || b == b'.') {
            rounded[1..].to_string()
        } else {
            rounded
        }
    }
}

impl TableWriter for CsvTableWriter {
    fn write_table(&self, table: &OutputTable, writer: &mut dyn Write) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        let mut header: Vec<&str> = Vec::with_capacity(table.columns().len() + 1);
        if table.with_index() {
            header.push(TIME_COLUMN);
        }
        header.extend(table.columns().iter().map(String::as_str));
        if header.is_empty() {
            return Ok(());
        }
        wtr.write_record(&header)?;

        for (row, ts) in table.timestamps().iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            if table.with_index() {
                record.push(ts.format(TIMESTAMP_FORMAT).to_string());
            }
            record.extend(table.row(row).map(|v| self.format_value(v)));
            wtr.write_record(&record)?;
        }

        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}

/// Writes every table of `chronics` into `dir`, all or nothing.
///
/// Each table is first written to a hidden temporary file next to its final
/// name. Only once every table is written are the temporaries renamed; on
/// failure they are removed and no final file is created.
///
/// # Errors
///
/// Returns an I/O error tagged with the failing path, or the writer's error.
pub fn write_chronics(
    dir: &Path,
    chronics: &ProductionChronics,
    writer: &dyn TableWriter,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| GenerationError::io(dir, e))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
    for table in chronics.tables() {
        let file_name = format!("{}.{}", table.name(), writer.extension());
        let final_path = dir.join(&file_name);
        let tmp_path = dir.join(format!(".{file_name}.tmp"));
        staged.push((tmp_path.clone(), final_path));
        if let Err(e) = write_one(&tmp_path, table, writer) {
            discard(&staged);
            return Err(e);
        }
    }

    let mut written = Vec::with_capacity(staged.len());
    for (i, (tmp, dest)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, dest) {
            discard(&staged[i..]);
            return Err(GenerationError::io(dest, e));
        }
        written.push(dest.clone());
    }
    Ok(written)
}

fn write_one(path: &Path, table: &OutputTable, writer: &dyn TableWriter) -> Result<()> {
    let file = File::create(path).map_err(|e| GenerationError::io(path, e))?;
    let mut buf = BufWriter::new(file);
    writer.write_table(table, &mut buf)?;
    buf.flush().map_err(|e| GenerationError::io(path, e))?;
    Ok(())
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        match fs::remove_file(tmp) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %tmp.display(), error = %e, "could not remove temporary file"),
        }
    }
}
