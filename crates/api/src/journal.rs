//! Durable liquidation journal: append-only JSON lines.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use liqwatch_chain::LiquidationRecord;

use crate::sink::{RecordSink, SinkError};

/// Static service identifier stamped on every entry.
const SERVICE: &str = "liquidator";

/// One journal line: the record plus generation metadata.
#[derive(Serialize)]
struct JournalEntry<'a> {
    #[serde(flatten)]
    record: &'a LiquidationRecord,
    /// When this entry was written, not when the block was produced.
    logged_at: String,
    service: &'static str,
}

/// Append-only record journal. No rotation and no retention policy; entries
/// are flushed as they are written so a crash loses at most the entry in
/// flight.
pub struct RecordJournal {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RecordJournal {
    /// Open (or create) the journal file for appending.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        info!(path = %path.display(), "liquidation journal opened");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a JSON line and flush it to disk.
    pub fn append(&mut self, record: &LiquidationRecord) -> Result<(), SinkError> {
        let entry = JournalEntry {
            record,
            logged_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            service: SERVICE,
        };

        let line = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for RecordJournal {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[async_trait]
impl RecordSink for RecordJournal {
    async fn deliver(&mut self, record: &LiquidationRecord) -> Result<(), SinkError> {
        self.append(record)
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(height: u64) -> LiquidationRecord {
        LiquidationRecord {
            block_height: height,
            block_time: "2021-11-05 08:34:56.789000".to_string(),
            tx_link: "https://finder.extraterrestrial.money/mainnet/tx/ABC123".to_string(),
            tx_index: 0,
            liquidator: Some("terra1liq".to_string()),
            borrower: None,
            repay_amount: Some(150.0),
        }
    }

    #[test]
    fn appends_one_json_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "liqwatch-journal-lines-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let mut journal = RecordJournal::open(&path).unwrap();
            journal.append(&record(100)).unwrap();
            journal.append(&record(101)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["block_height"], 100);
        assert_eq!(first["service"], "liquidator");
        assert!(first["logged_at"].is_string());
        // Absent optional fields stay absent in the journal too.
        assert!(first.get("borrower").is_none());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["block_height"], 101);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reopening_appends_rather_than_truncates() {
        let path = std::env::temp_dir().join(format!(
            "liqwatch-journal-reopen-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let mut journal = RecordJournal::open(&path).unwrap();
            journal.append(&record(1)).unwrap();
        }
        {
            let mut journal = RecordJournal::open(&path).unwrap();
            journal.append(&record(2)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        std::fs::remove_file(&path).unwrap();
    }
}
