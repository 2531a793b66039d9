// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all calpipe command-line errors. This should be the *only*
//! error enum that the binary sees.

use thiserror::Error;

use super::group::GroupArgsError;
use crate::{
    catalog::CatalogError,
    grouping::{GroupingError, PlotError},
    pipeline::{PipelineError, PIPELINE_FILE_TYPES_COMMA_SEPARATED},
    walker::LedgerError,
};

/// Each category carries a hint pointing at the relevant subcommand, unless
/// it's "generic".
#[derive(Error, Debug)]
pub enum CalpipeError {
    /// An error related to grouping sources into patches.
    #[error("{0}\n\nSee `calpipe group --help` for the grouping parameters.")]
    Grouping(String),

    /// An error related to a walker ledger.
    #[error("{0}\n\nLedgers can be inspected with `calpipe walker-status` and cleared with `calpipe walker-reset`.")]
    Ledger(String),

    /// An error related to pipeline files, or a stage of one.
    #[error("{0}\n\nPipeline files may be {}. See `calpipe pipeline-run --help`.", *PIPELINE_FILE_TYPES_COMMA_SEPARATED)]
    Pipeline(String),

    /// An error related to source catalogs or patch files.
    #[error("{0}\n\nSource catalogs have one source per entry, with a name, x, y and flux.")]
    Catalog(String),

    /// An error related to plotting.
    #[error("{0}")]
    Plot(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files use the same names as the long command-line flags, with underscores instead of hyphens.")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<GroupArgsError> for CalpipeError {
    fn from(e: GroupArgsError) -> Self {
        let s = e.to_string();
        match e {
            GroupArgsError::NoSources => Self::Catalog(s),
            GroupArgsError::BadMinFlux(_) => Self::Grouping(s),
        }
    }
}

impl From<GroupingError> for CalpipeError {
    fn from(e: GroupingError) -> Self {
        Self::Grouping(e.to_string())
    }
}

impl From<PlotError> for CalpipeError {
    fn from(e: PlotError) -> Self {
        let s = e.to_string();
        match e {
            PlotError::Grouping(e) => Self::from(e),
            #[cfg(not(feature = "plotting"))]
            PlotError::NoPlottingFeature => Self::Plot(s),
            #[cfg(feature = "plotting")]
            PlotError::Draw(_) => Self::Plot(s),
        }
    }
}

impl From<LedgerError> for CalpipeError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e.to_string())
    }
}

impl From<CatalogError> for CalpipeError {
    fn from(e: CatalogError) -> Self {
        let s = e.to_string();
        match e {
            CatalogError::UnknownFormat(_)
            | CatalogError::Decode { .. }
            | CatalogError::BadLine { .. }
            | CatalogError::DuplicateName(_)
            | CatalogError::BadSourceIndex { .. }
            | CatalogError::Encode { .. } => Self::Catalog(s),
            CatalogError::IO(e) => Self::from(e),
        }
    }
}

impl From<PipelineError> for CalpipeError {
    fn from(e: PipelineError) -> Self {
        let s = e.to_string();
        match e {
            PipelineError::UnknownFormat(_)
            | PipelineError::Decode { .. }
            | PipelineError::NoStages
            | PipelineError::EmptyCommand(_)
            | PipelineError::DuplicateStage(_)
            | PipelineError::NonUniqueTemplate(_)
            | PipelineError::EmptyForEach(_)
            | PipelineError::ConflictingForEach(_)
            | PipelineError::BadGlob { .. }
            | PipelineError::UnsafeCleanPath { .. } => Self::Pipeline(s),
            PipelineError::PrepareDir { .. } | PipelineError::StageFailed { .. } => {
                Self::Generic(s)
            }
            PipelineError::Ledger(e) => Self::from(e),
            PipelineError::IO(e) => Self::from(e),
        }
    }
}

impl From<std::io::Error> for CalpipeError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
