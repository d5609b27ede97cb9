use crate::flatten::types::FlatRow;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Writes records as JSON Lines, one record per line
pub struct RowWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> RowWriter<W> {
    pub fn new(writer: W) -> Self {
        RowWriter { writer, written: 0 }
    }

    /// Number of lines written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_rows(&mut self, rows: &[FlatRow]) -> Result<()> {
        for row in rows {
            self.write_record(row)?;
        }
        Ok(())
    }

    /// Write any serializable record (e.g. a normalized value) as one line
    pub fn write_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        let json = serde_json::to_string(record)
            .context("Failed to serialize record")?;
        writeln!(self.writer, "{}", json)
            .context("Failed to write record")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
