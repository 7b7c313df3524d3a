//! Storage behind the audit ledger.
//!
//! A sink only appends and reads. There is no way to rewrite or drop an
//! entry through this trait.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::entry::AuditEntry;
use crate::domain::error::{GovernanceError, Result};

pub trait LedgerSink: Send + Sync {
    /// Persist one entry. Must be durable before returning.
    fn append(&mut self, entry: &AuditEntry) -> Result<()>;

    /// Every entry in sequence order.
    fn entries(&self) -> Result<Vec<AuditEntry>>;

    /// The last `n` entries in sequence order.
    fn tail(&self, n: usize) -> Result<Vec<AuditEntry>> {
        let all = self.entries()?;
        let start = all.len().saturating_sub(n);
        Ok(all[start..].to_vec())
    }
}

/// Volatile sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Vec<AuditEntry>,
}

impl LedgerSink for MemorySink {
    fn append(&mut self, entry: &AuditEntry) -> Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.entries.clone())
    }

    fn tail(&self, n: usize) -> Result<Vec<AuditEntry>> {
        let start = self.entries.len().saturating_sub(n);
        Ok(self.entries[start..].to_vec())
    }
}

/// Sidecar record used for fast startup verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMeta {
    pub last_hash: String,
    pub entry_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// One JSON object per line, plus `<path>.meta.json`.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    meta_path: PathBuf,
    file: File,
    count: u64,
}

impl JsonlSink {
    /// Open (or create) the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let meta_path = meta_path_for(&path);
        let mut sink = Self {
            path,
            meta_path,
            file,
            count: 0,
        };
        sink.count = sink.entries()?.len() as u64;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar contents, if one has been written.
    pub fn read_meta(&self) -> Result<Option<LedgerMeta>> {
        match fs::read_to_string(&self.meta_path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_meta(&self, last_hash: &str) -> Result<()> {
        let meta = LedgerMeta {
            last_hash: last_hash.to_string(),
            entry_count: self.count,
            updated_at: Utc::now(),
        };
        let dir = self
            .meta_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Write to a temp file in the same directory, then rename over.
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &meta)?;
        tmp.as_file().sync_data()?;
        tmp.persist(&self.meta_path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl LedgerSink for JsonlSink {
    fn append(&mut self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.file.sync_data()?;
        self.count += 1;
        self.write_meta(&entry.entry_hash)
    }

    fn entries(&self) -> Result<Vec<AuditEntry>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut out = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| GovernanceError::Integrity {
                sequence: index as u64,
                reason: format!("unparseable ledger line: {e}"),
            })?;
            out.push(entry);
        }
        Ok(out)
    }
}

fn meta_path_for(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".meta.json");
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digest::GENESIS_HASH;
    use serde_json::json;

    fn entry(seq: u64, prior: &str) -> AuditEntry {
        AuditEntry::seal(seq, Utc::now(), "log", "tester", json!({}), "OK", prior).unwrap()
    }

    #[test]
    fn memory_tail_returns_last_entries() {
        let mut sink = MemorySink::default();
        let a = entry(0, GENESIS_HASH);
        let b = entry(1, &a.entry_hash);
        sink.append(&a).unwrap();
        sink.append(&b).unwrap();
        let tail = sink.tail(1).unwrap();
        assert_eq!(tail, vec![b]);
        assert_eq!(sink.tail(10).unwrap().len(), 2);
    }

    #[test]
    fn jsonl_writes_lines_and_meta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("ledger.jsonl");
        let mut sink = JsonlSink::open(&path).unwrap();
        assert!(sink.read_meta().unwrap().is_none());

        let a = entry(0, GENESIS_HASH);
        sink.append(&a).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);

        let meta = sink.read_meta().unwrap().unwrap();
        assert_eq!(meta.entry_count, 1);
        assert_eq!(meta.last_hash, a.entry_hash);
        assert!(dir.path().join("audit").join("ledger.jsonl.meta.json").exists());
    }

    #[test]
    fn reopen_counts_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        {
            let mut sink = JsonlSink::open(&path).unwrap();
            let a = entry(0, GENESIS_HASH);
            sink.append(&a).unwrap();
            sink.append(&entry(1, &a.entry_hash)).unwrap();
        }
        let sink = JsonlSink::open(&path).unwrap();
        assert_eq!(sink.entries().unwrap().len(), 2);
        assert_eq!(sink.read_meta().unwrap().unwrap().entry_count, 2);
    }

    #[test]
    fn garbage_line_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        fs::write(&path, "{not json}\n").unwrap();
        let err = JsonlSink::open(&path).unwrap_err();
        assert!(err.is_integrity());
    }
}
