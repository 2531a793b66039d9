// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resumable stage bookkeeping.
//!
//! A [Walker] remembers which named stages of a pipeline have completed, so
//! that a pipeline that crashed (or was killed) can be run again and skip
//! straight to the first unfinished stage. The walker never runs stages
//! itself; callers should follow the pattern
//!
//! ```no_run
//! # use calpipe::walker::{Walker, FileLedger};
//! # fn main() -> Result<(), calpipe::walker::LedgerError> {
//! let mut walker = Walker::new("pipeline.walker", FileLedger::new("."))?;
//! if !walker.is_done("cleaning")? {
//!     // ... do the work ...
//!     walker.mark_done("cleaning")?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A stage that fails part-way through is not marked done, and will be run
//! again from the top on the next attempt, so stage bodies must be safe to
//! re-run.

mod error;
mod ledger;

pub use error::LedgerError;
pub use ledger::{FileLedger, LedgerStore, MemoryLedger};

use std::path::Path;

use log::{debug, info};

/// Stage names are stored one per line, so they can't contain line breaks (or
/// anything else odd), and surrounding whitespace would be lost.
pub fn validate_stage_name(stage: &str) -> Result<(), LedgerError> {
    if stage.is_empty() || stage.trim() != stage || stage.chars().any(char::is_control) {
        return Err(LedgerError::InvalidStageName(stage.to_string()));
    }
    Ok(())
}

/// Tracks the completed stages of one workflow. Only one process should be
/// advancing a given ledger at a time.
#[derive(Debug)]
pub struct Walker<S: LedgerStore> {
    id: String,
    store: S,
}

impl<S: LedgerStore> Walker<S> {
    /// Open (creating if necessary) the ledger `id` in `store`. Storage
    /// problems are reported here rather than after the first stage has run.
    pub fn new<T: Into<String>>(id: T, mut store: S) -> Result<Walker<S>, LedgerError> {
        let id = id.into();
        store.open(&id)?;
        debug!("Opened walker '{id}'");
        Ok(Walker { id, store })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Has this stage already completed?
    pub fn is_done(&self, stage: &str) -> Result<bool, LedgerError> {
        validate_stage_name(stage)?;
        self.store.contains(&self.id, stage)
    }

    /// Record that this stage completed successfully. Marking a stage twice is
    /// harmless.
    pub fn mark_done(&mut self, stage: &str) -> Result<(), LedgerError> {
        validate_stage_name(stage)?;
        if self.store.insert(&self.id, stage)? {
            debug!("Walker '{}': stage '{stage}' done", self.id);
        } else {
            debug!("Walker '{}': stage '{stage}' was already done", self.id);
        }
        Ok(())
    }

    /// The completed stages, in the order they completed.
    pub fn completed(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.store.stages(&self.id)?.into_iter().collect())
    }

    /// Forget all completed stages, so that everything runs again.
    pub fn reset(&mut self) -> Result<(), LedgerError> {
        info!("Resetting walker '{}'", self.id);
        self.store.clear(&self.id)
    }
}

impl Walker<FileLedger> {
    /// Open a file-backed walker from the path of its ledger file, e.g.
    /// "work/PiLL.walker".
    pub fn open_file(path: &Path) -> Result<Walker<FileLedger>, LedgerError> {
        let (store, id) = FileLedger::for_file(path)?;
        Walker::new(id, store)
    }
}
