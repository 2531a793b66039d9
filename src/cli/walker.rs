// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Inspect and edit walker ledgers by hand.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use super::common::InfoPrinter;
use crate::{
    walker::{validate_stage_name, FileLedger, LedgerStore, Walker},
    CalpipeError,
};

/// List the completed stages of a walker ledger.
#[derive(Parser, Debug)]
pub(super) struct WalkerStatusArgs {
    /// The ledger file, e.g. "PiLL.walker".
    #[clap(name = "LEDGER_FILE", parse(from_os_str))]
    ledger: PathBuf,
}

impl WalkerStatusArgs {
    pub(super) fn run(self) -> Result<(), CalpipeError> {
        let (store, id) = FileLedger::for_file(&self.ledger)?;
        // Reading doesn't create the ledger.
        let stages = store.stages(&id)?;

        let mut printer = InfoPrinter::new(
            format!("{}: {} stages done", self.ledger.display(), stages.len()).into(),
        );
        if !self.ledger.exists() {
            printer.push_line("The ledger doesn't exist yet".into());
        }
        for (i, stage) in stages.into_iter().enumerate() {
            printer.push_line(format!("{:>3}: {stage}", i + 1).into());
        }
        printer.display();
        Ok(())
    }
}

/// Mark stages as done without running them.
#[derive(Parser, Debug)]
pub(super) struct WalkerDoneArgs {
    /// The ledger file, e.g. "PiLL.walker". It is created if it doesn't exist.
    #[clap(name = "LEDGER_FILE", parse(from_os_str))]
    ledger: PathBuf,

    /// The names of the stages to mark as done.
    #[clap(name = "STAGES", required = true)]
    stages: Vec<String>,
}

impl WalkerDoneArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), CalpipeError> {
        for stage in &self.stages {
            validate_stage_name(stage)?;
        }
        if dry_run {
            for stage in &self.stages {
                info!("Would mark '{stage}' as done in {}", self.ledger.display());
            }
            return Ok(());
        }

        let mut walker = Walker::open_file(&self.ledger)?;
        for stage in &self.stages {
            walker.mark_done(stage)?;
            info!("Marked '{stage}' as done");
        }
        Ok(())
    }
}

/// Forget every completed stage of a walker ledger, so that the whole pipeline
/// runs again.
#[derive(Parser, Debug)]
pub(super) struct WalkerResetArgs {
    /// The ledger file, e.g. "PiLL.walker".
    #[clap(name = "LEDGER_FILE", parse(from_os_str))]
    ledger: PathBuf,
}

impl WalkerResetArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), CalpipeError> {
        let (store, id) = FileLedger::for_file(&self.ledger)?;
        let num_stages = store.stages(&id)?.len();
        if dry_run {
            info!(
                "Would forget {num_stages} completed stages in {}",
                self.ledger.display()
            );
            return Ok(());
        }

        let mut walker = Walker::new(id, store)?;
        walker.reset()?;
        info!("Forgot {num_stages} completed stages");
        Ok(())
    }
}
