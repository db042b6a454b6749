//! JSONL export of canonical records.
//!
//! Stands in for the indexer: every record becomes one JSON object per line,
//! keys in record order.

use std::io::{self, BufWriter, Write};

use evingest_core::EventRecord;

pub struct JsonlExporter<W: Write> {
    out: BufWriter<W>,
    written: usize,
}

impl<W: Write> JsonlExporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
            written: 0,
        }
    }

    pub fn write(&mut self, record: &EventRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}
