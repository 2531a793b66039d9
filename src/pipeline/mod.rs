// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Declarative pipelines of external commands, made resumable with a
//! [Walker].
//!
//! A pipeline file lists stages in the order they must run, e.g.
//!
//! ```toml
//! walker = "PiLL.walker"
//!
//! [[stage]]
//! name = "download"
//! command = ["LOFAR_download.py"]
//! workdir = "download"
//!
//! [[stage]]
//! name = "timesplit_{item}"
//! for_each_glob = "id*_*"
//! workdir = "{item}"
//! command = ["LOFAR_timesplit.py"]
//! ```
//!
//! Stages that the walker already knows about are skipped, so re-running a
//! pipeline after a failure resumes at the failed stage. A `for_each_glob`
//! stage is expanded when the run reaches it, so "download" above can create
//! the target directories that "timesplit_{item}" then works through.

mod error;
mod plan;
mod runner;

pub use error::PipelineError;
pub use plan::{
    PipelineFile, PipelineFileType, PipelinePlan, PlanStep, PlannedStage, StageSpec,
    ITEM_PLACEHOLDER, PIPELINE_FILE_TYPES_COMMA_SEPARATED,
};
pub use runner::{CommandRunner, StageBodyError, StageRunner};

use std::{collections::HashSet, fs};

use log::{debug, info};

use crate::walker::{LedgerStore, Walker};

/// What happened to each stage of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Stages that ran (and completed) during this run.
    pub ran: Vec<String>,

    /// Stages that had already completed in an earlier run.
    pub skipped: Vec<String>,

    /// Stages that would have run, if this wasn't a dry run.
    pub pending: Vec<String>,
}

/// Run every stage of `plan` that `walker` doesn't already know about, in
/// order. A stage is marked done only after its body succeeds; the first
/// failure stops the run. Nothing runs in a dry run, so glob steps only see
/// files that already exist.
pub fn run_pipeline<S, R>(
    plan: &PipelinePlan,
    walker: &mut Walker<S>,
    runner: &mut R,
    dry_run: bool,
) -> Result<PipelineSummary, PipelineError>
where
    S: LedgerStore,
    R: StageRunner + ?Sized,
{
    let mut summary = PipelineSummary::default();
    // Names of glob-expanded stages mustn't collide with any other stage.
    let mut names: HashSet<String> = plan
        .steps
        .iter()
        .filter_map(|step| match step {
            PlanStep::Stage(stage) => Some(stage.name.clone()),
            PlanStep::Glob { .. } => None,
        })
        .collect();

    let num_steps = plan.steps.len();
    for (i_step, step) in plan.steps.iter().enumerate() {
        let expanded;
        let stages: &[PlannedStage] = match step {
            PlanStep::Stage(stage) => std::slice::from_ref(stage),
            PlanStep::Glob { pattern, .. } => {
                expanded = step.expand(&plan.working_dir)?;
                debug!(
                    "'{pattern}' expanded '{}' into {} stages",
                    step.name(),
                    expanded.len()
                );
                for stage in &expanded {
                    if !names.insert(stage.name.clone()) {
                        return Err(PipelineError::DuplicateStage(stage.name.clone()));
                    }
                }
                &expanded
            }
        };

        for stage in stages {
            if walker.is_done(&stage.name)? {
                debug!("Skipping stage '{}'; already done", stage.name);
                summary.skipped.push(stage.name.clone());
                continue;
            }
            if dry_run {
                info!(
                    "Would run stage '{}': {}",
                    stage.name,
                    stage.command.join(" ")
                );
                summary.pending.push(stage.name.clone());
                continue;
            }

            info!("Step {}/{num_steps}: {}", i_step + 1, stage.name);
            prepare_dirs(stage)?;
            runner
                .run(stage)
                .map_err(|source| PipelineError::StageFailed {
                    stage: stage.name.clone(),
                    source,
                })?;
            walker.mark_done(&stage.name)?;
            summary.ran.push(stage.name.clone());
        }
    }

    Ok(summary)
}

/// Give a stage a fresh start: delete and recreate the directories it cleans,
/// and make sure its working directory exists.
fn prepare_dirs(stage: &PlannedStage) -> Result<(), PipelineError> {
    let prepare_error = |path: &std::path::Path, source| PipelineError::PrepareDir {
        stage: stage.name.clone(),
        path: path.to_path_buf(),
        source,
    };

    for dir in &stage.clean {
        if dir.exists() {
            debug!("Removing {}", dir.display());
            fs::remove_dir_all(dir).map_err(|e| prepare_error(dir, e))?;
        }
        fs::create_dir_all(dir).map_err(|e| prepare_error(dir, e))?;
    }
    fs::create_dir_all(&stage.workdir).map_err(|e| prepare_error(&stage.workdir, e))?;
    Ok(())
}
