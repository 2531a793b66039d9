// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Storage backends for walker ledgers.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use indexmap::IndexSet;
use log::trace;

use super::LedgerError;

/// A durable mapping from ledger identifiers to the ordered set of stage names
/// completed under that identifier.
///
/// Implementors don't validate stage names; [super::Walker] does that before
/// calling in.
pub trait LedgerStore {
    /// Prepare storage for a ledger. An unknown ledger starts out empty.
    fn open(&mut self, ledger: &str) -> Result<(), LedgerError>;

    /// All completed stages, in the order they were recorded.
    fn stages(&self, ledger: &str) -> Result<IndexSet<String>, LedgerError>;

    fn contains(&self, ledger: &str, stage: &str) -> Result<bool, LedgerError> {
        Ok(self.stages(ledger)?.contains(stage))
    }

    /// Durably record a stage. Returns `false` if the stage was already
    /// recorded, in which case nothing changes.
    fn insert(&mut self, ledger: &str, stage: &str) -> Result<bool, LedgerError>;

    /// Forget every stage in the ledger.
    fn clear(&mut self, ledger: &str) -> Result<(), LedgerError>;
}

/// Ledgers kept as plain-text files in a directory, one stage name per line.
/// The ledger identifier is the file name, e.g. "pipeline-dd-serial.walker".
///
/// Every query re-reads the file, so stages removed from the file by hand are
/// seen as not done.
#[derive(Debug, Clone)]
pub struct FileLedger {
    dir: PathBuf,
}

impl FileLedger {
    pub fn new<P: Into<PathBuf>>(dir: P) -> FileLedger {
        FileLedger { dir: dir.into() }
    }

    /// The store and identifier of a ledger file, e.g. "work/PiLL.walker" is
    /// the ledger "PiLL.walker" in "work". Nothing is created.
    pub fn for_file(path: &Path) -> Result<(FileLedger, String), LedgerError> {
        let id = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| LedgerError::InvalidLedgerId(path.display().to_string()))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((FileLedger::new(dir), id.to_string()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file backing a ledger.
    pub fn path(&self, ledger: &str) -> Result<PathBuf, LedgerError> {
        let is_plain_file_name = !ledger.is_empty()
            && ledger != "."
            && ledger != ".."
            && !ledger.contains(['/', '\\'])
            && !ledger.chars().any(char::is_control);
        if !is_plain_file_name {
            return Err(LedgerError::InvalidLedgerId(ledger.to_string()));
        }
        Ok(self.dir.join(ledger))
    }
}

impl LedgerStore for FileLedger {
    fn open(&mut self, ledger: &str) -> Result<(), LedgerError> {
        let path = self.path(ledger)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| LedgerError::Write {
            path: self.dir.clone(),
            source,
        })?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LedgerError::Write { path, source })?;
        Ok(())
    }

    fn stages(&self, ledger: &str) -> Result<IndexSet<String>, LedgerError> {
        let path = self.path(ledger)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(IndexSet::new()),
            Err(source) => return Err(LedgerError::Read { path, source }),
        };

        let mut stages = IndexSet::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| LedgerError::Read {
                path: path.clone(),
                source,
            })?;
            // Tolerate hand-edited files.
            let stage = line.trim();
            if !stage.is_empty() {
                stages.insert(stage.to_string());
            }
        }
        Ok(stages)
    }

    fn insert(&mut self, ledger: &str, stage: &str) -> Result<bool, LedgerError> {
        if self.contains(ledger, stage)? {
            return Ok(false);
        }

        let path = self.path(ledger)?;
        trace!("Appending '{stage}' to {}", path.display());
        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(&path)?;
            // A hand edit or a torn write can leave the last line unfinished;
            // don't glue this stage onto it.
            if file.metadata()?.len() > 0 {
                let mut last = [0u8];
                file.seek(SeekFrom::End(-1))?;
                file.read_exact(&mut last)?;
                if last[0] != b'\n' {
                    writeln!(file)?;
                }
            }
            writeln!(file, "{stage}")?;
            file.sync_all()
        };
        write().map_err(|source| LedgerError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(true)
    }

    fn clear(&mut self, ledger: &str) -> Result<(), LedgerError> {
        let path = self.path(ledger)?;
        File::create(&path)
            .and_then(|f| f.sync_all())
            .map_err(|source| LedgerError::Write { path, source })
    }
}

/// Ledgers that only live as long as the process. Useful for tests and dry
/// runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    ledgers: HashMap<String, IndexSet<String>>,
}

impl MemoryLedger {
    pub fn new() -> MemoryLedger {
        MemoryLedger::default()
    }
}

impl LedgerStore for MemoryLedger {
    fn open(&mut self, ledger: &str) -> Result<(), LedgerError> {
        self.ledgers.entry(ledger.to_string()).or_default();
        Ok(())
    }

    fn stages(&self, ledger: &str) -> Result<IndexSet<String>, LedgerError> {
        Ok(self.ledgers.get(ledger).cloned().unwrap_or_default())
    }

    fn contains(&self, ledger: &str, stage: &str) -> Result<bool, LedgerError> {
        Ok(self
            .ledgers
            .get(ledger)
            .map(|stages| stages.contains(stage))
            .unwrap_or(false))
    }

    fn insert(&mut self, ledger: &str, stage: &str) -> Result<bool, LedgerError> {
        Ok(self
            .ledgers
            .entry(ledger.to_string())
            .or_default()
            .insert(stage.to_string()))
    }

    fn clear(&mut self, ledger: &str) -> Result<(), LedgerError> {
        if let Some(stages) = self.ledgers.get_mut(ledger) {
            stages.clear();
        }
        Ok(())
    }
}
