//! Commit journal for pattern memory.
//!
//! Every `observe` produces one entry: the new thought plus the pattern
//! records it created or reinforced, in their post-update form. The entry is
//! committed before memory is touched, so a failed commit leaves no trace.

use luca_core::{Error, Pattern, Result, Thought};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub thought: Thought,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
}

/// Durable sink for committed observations.
pub trait Journal: Send + Sync {
    fn commit(&self, entry: &JournalEntry) -> Result<()>;
}

/// Keeps nothing. Memory is process-lifetime only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullJournal;

impl Journal for NullJournal {
    fn commit(&self, _entry: &JournalEntry) -> Result<()> {
        Ok(())
    }
}

/// Append-only JSON-lines file, one entry per line.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileJournal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!("Journal open at {}", path.display());
        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Journal for FileJournal {
    fn commit(&self, entry: &JournalEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| Error::storage_unavailable("journal lock poisoned"))?;
        let unavailable =
            |e: std::io::Error| Error::storage_unavailable(format!("{}: {}", self.path.display(), e));
        let before = file.metadata().map_err(unavailable)?.len();
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
            // drop whatever part of the line made it to disk
            if let Err(undo) = file.set_len(before) {
                tracing::warn!("Could not roll back partial journal write: {}", undo);
            }
            return Err(unavailable(e));
        }
        Ok(())
    }
}

/// Outcome of scanning a journal file.
#[derive(Debug, Default)]
struct Scan {
    entries: Vec<JournalEntry>,
    /// Byte length up to and including the last intact line.
    valid_len: u64,
    file_len: u64,
    /// The last intact line is not newline-terminated.
    unterminated: bool,
}

fn scan(path: &Path) -> Result<Scan> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Scan::default()),
        Err(e) => return Err(e.into()),
    };
    let mut scan = Scan { file_len: bytes.len() as u64, ..Default::default() };
    let mut offset = 0;
    let mut line_no = 0;
    while offset < bytes.len() {
        line_no += 1;
        let (line, next) = match bytes[offset..].iter().position(|b| *b == b'\n') {
            Some(i) => (&bytes[offset..offset + i], offset + i + 1),
            None => (&bytes[offset..], bytes.len()),
        };
        let parsed = std::str::from_utf8(line)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                if text.trim().is_empty() {
                    Ok(None)
                } else {
                    serde_json::from_str::<JournalEntry>(text).map(Some).map_err(|e| e.to_string())
                }
            });
        match parsed {
            Ok(entry) => {
                scan.entries.extend(entry);
                scan.valid_len = next as u64;
                scan.unterminated = bytes[next - 1] != b'\n';
            }
            Err(e) if next == bytes.len() => {
                tracing::warn!("Skipping torn journal tail in {}: {}", path.display(), e);
            }
            Err(e) => {
                return Err(Error::storage_unavailable(format!(
                    "{} line {}: {}",
                    path.display(),
                    line_no,
                    e
                )))
            }
        }
        offset = next;
    }
    Ok(scan)
}

/// Read every entry of a journal file. A missing file reads as empty.
/// A torn final line (crash mid-write) is skipped; corruption elsewhere is an error.
pub fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    Ok(scan(path)?.entries)
}

/// [`read_entries`], then cut a torn final line off the file and terminate the
/// last intact one, so the next append starts on a fresh line.
pub fn recover(path: &Path) -> Result<Vec<JournalEntry>> {
    let scan = scan(path)?;
    if scan.valid_len < scan.file_len || scan.unterminated {
        let mut file = OpenOptions::new().write(true).open(path)?;
        if scan.valid_len < scan.file_len {
            file.set_len(scan.valid_len)?;
            tracing::warn!(
                "Truncated {} torn bytes from {}",
                scan.file_len - scan.valid_len,
                path.display()
            );
        }
        if scan.unterminated {
            file.seek(SeekFrom::End(0))?;
            file.write_all(b"\n")?;
        }
        file.sync_all()?;
    }
    Ok(scan.entries)
}
