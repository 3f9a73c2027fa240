use crate::core::{OutputRow, RowSink};
use crate::utils::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// UTF-8 CSV output, opened once and flushed at the end of the run.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    destination: String,
}

impl CsvSink<File> {
    /// Creates (or truncates) the output file, creating parent directories first.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        Ok(Self::from_writer(file, path.display().to_string()))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W, destination: impl Into<String>) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            destination: destination.into(),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::utils::error::EtlError::IoError(e.into_error()))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn destination(&self) -> &str {
        &self.destination
    }

    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        self.writer.write_record(columns)?;
        Ok(())
    }

    fn write_row(&mut self, row: &OutputRow) -> Result<()> {
        self.writer.write_record(row.to_csv_record())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
