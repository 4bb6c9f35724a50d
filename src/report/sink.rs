//! Destinations for result records and aggregate reports.

use super::types::{CommandRecord, UseCaseReport};
use super::{junit, text};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;

pub const RECORDS_FILE: &str = "results.jsonl";

pub trait ResultSink: Send + Sync {
    fn write_record(&self, record: &CommandRecord) -> Result<()>;
    fn write_report(&self, report: &UseCaseReport) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes records as JSON lines plus a text and JUnit report per use case
pub struct FileSink {
    output_dir: PathBuf,
    // Serializes appends from concurrent writers
    records: Mutex<()>,
}

impl FileSink {
    pub fn new(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            records: Mutex::new(()),
        })
    }

    pub fn records_path(&self) -> PathBuf {
        self.output_dir.join(RECORDS_FILE)
    }

    fn report_stem(name: &str) -> String {
        name.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

impl ResultSink for FileSink {
    fn write_record(&self, record: &CommandRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let _guard = lock(&self.records);
        let path = self.records_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn write_report(&self, report: &UseCaseReport) -> Result<()> {
        let stem = Self::report_stem(&report.name);
        let text_path = self.output_dir.join(format!("{}-report.txt", stem));
        std::fs::write(&text_path, text::render(report))
            .with_context(|| format!("Failed to write {}", text_path.display()))?;
        junit::write_report(
            std::slice::from_ref(report),
            &self.output_dir.join(format!("{}-junit.xml", stem)),
        )
    }
}

/// Message forwarded by [`ChannelSink`]
#[derive(Debug, Clone)]
pub enum SinkMessage {
    Record(CommandRecord),
    Report(UseCaseReport),
}

/// Forwards everything to a tokio channel
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SinkMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ResultSink for ChannelSink {
    fn write_record(&self, record: &CommandRecord) -> Result<()> {
        self.sender
            .send(SinkMessage::Record(record.clone()))
            .map_err(|_| anyhow::anyhow!("Result channel closed"))
    }

    fn write_report(&self, report: &UseCaseReport) -> Result<()> {
        self.sender
            .send(SinkMessage::Report(report.clone()))
            .map_err(|_| anyhow::anyhow!("Result channel closed"))
    }
}

/// Keeps everything in memory
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<CommandRecord>>,
    reports: Mutex<Vec<UseCaseReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CommandRecord> {
        lock(&self.records).clone()
    }

    pub fn reports(&self) -> Vec<UseCaseReport> {
        lock(&self.reports).clone()
    }
}

impl ResultSink for MemorySink {
    fn write_record(&self, record: &CommandRecord) -> Result<()> {
        lock(&self.records).push(record.clone());
        Ok(())
    }

    fn write_report(&self, report: &UseCaseReport) -> Result<()> {
        lock(&self.reports).push(report.clone());
        Ok(())
    }
}
