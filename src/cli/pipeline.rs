// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run a pipeline file, resuming after the last completed stage.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};

use super::common::{InfoPrinter, PIPELINE_FILE_HELP};
use crate::{
    pipeline::{run_pipeline, CommandRunner, PipelinePlan, PipelineSummary},
    walker::{FileLedger, LedgerStore, MemoryLedger, Walker},
    CalpipeError,
};

#[derive(Parser, Debug)]
pub(super) struct PipelineRunArgs {
    #[clap(name = "PIPELINE_FILE", help = PIPELINE_FILE_HELP.as_str(), parse(from_os_str))]
    pipeline: PathBuf,

    /// The directory holding the walker ledger. Defaults to the pipeline's
    /// working directory.
    #[clap(long, parse(from_os_str))]
    ledger_dir: Option<PathBuf>,

    /// Write the output of each stage to "<LOG_DIR>/<stage>.log" instead of
    /// the terminal.
    #[clap(long, parse(from_os_str))]
    log_dir: Option<PathBuf>,
}

impl PipelineRunArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), CalpipeError> {
        let plan = PipelinePlan::from_file(&self.pipeline)?;
        let ledger = FileLedger::new(
            self.ledger_dir
                .unwrap_or_else(|| plan.working_dir.clone()),
        );

        let mut printer = InfoPrinter::new(format!("Pipeline {}", self.pipeline.display()).into());
        printer.push_block(vec![
            format!("Working directory: {}", plan.working_dir.display()).into(),
            format!("Walker ledger:     {}", ledger.dir().join(&plan.walker).display()).into(),
        ]);
        if let Some(log_dir) = self.log_dir.as_ref() {
            printer.push_line(format!("Stage logs:        {}", log_dir.display()).into());
        }
        printer.push_block(
            plan.stage_names()
                .enumerate()
                .map(|(i, name)| format!("{:>3}: {name}", i + 1).into())
                .collect(),
        );
        printer.display();

        let mut runner = CommandRunner::new(self.log_dir);
        let summary = if dry_run {
            // Don't create the ledger just to look at it.
            let mut memory = MemoryLedger::new();
            for stage in ledger.stages(&plan.walker)? {
                memory.insert(&plan.walker, &stage)?;
            }
            let mut walker = Walker::new(plan.walker.as_str(), memory)?;
            run_pipeline(&plan, &mut walker, &mut runner, true)?
        } else {
            let mut walker = Walker::new(plan.walker.as_str(), ledger)?;
            run_pipeline(&plan, &mut walker, &mut runner, false)?
        };
        report(&summary, dry_run);
        Ok(())
    }
}

fn report(summary: &PipelineSummary, dry_run: bool) {
    debug!("{summary:?}");
    if !summary.skipped.is_empty() {
        info!(
            "{} stages were already done: {}",
            summary.skipped.len(),
            summary.skipped.join(", ")
        );
    }
    if dry_run {
        if summary.pending.is_empty() {
            info!("Nothing to do");
        } else {
            info!(
                "{} stages would run: {}",
                summary.pending.len(),
                summary.pending.join(", ")
            );
        }
    } else {
        info!("Ran {} stages", summary.ran.len());
    }
}
