// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use super::{StageBodyError, PIPELINE_FILE_TYPES_COMMA_SEPARATED};
use crate::walker::LedgerError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline file '{0}' doesn't have a recognised file extension! Valid extensions are: {}", *PIPELINE_FILE_TYPES_COMMA_SEPARATED)]
    UnknownFormat(PathBuf),

    #[error("Couldn't decode {format} pipeline file {path}: {message}")]
    Decode {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("The pipeline doesn't have any stages")]
    NoStages,

    #[error("Stage '{0}' has an empty command")]
    EmptyCommand(String),

    #[error("Stage name '{0}' is used more than once")]
    DuplicateStage(String),

    #[error("Stage '{0}' is repeated for several items, but its name doesn't contain {{item}}")]
    NonUniqueTemplate(String),

    #[error("Stage '{0}' has an empty for_each list")]
    EmptyForEach(String),

    #[error("Stage '{0}' specifies both for_each and for_each_glob")]
    ConflictingForEach(String),

    #[error("Bad glob pattern '{pattern}' in stage '{stage}': {message}")]
    BadGlob {
        stage: String,
        pattern: String,
        message: String,
    },

    #[error("Stage '{stage}' wants to clean '{path}', but only relative paths inside the working directory can be cleaned")]
    UnsafeCleanPath { stage: String, path: String },

    #[error("Couldn't prepare directory {path} for stage '{stage}': {source}")]
    PrepareDir {
        stage: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        source: StageBodyError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
