// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors from constructing or querying a [super::Grouper].
#[derive(Error, Debug, PartialEq)]
pub enum GroupingError {
    #[error("Got {num_points} positions but {num_fluxes} fluxes; these must be the same length")]
    LengthMismatch {
        num_points: usize,
        num_fluxes: usize,
    },

    #[error("The grouping parameter '{name}' must be positive and finite, but is {value}")]
    BadDistance { name: &'static str, value: f64 },

    #[error("Position {index} ({x}, {y}) is not finite")]
    BadPosition { index: usize, x: f64, y: f64 },

    #[error("Flux {index} ({flux}) must be non-negative and finite")]
    BadFlux { index: usize, flux: f64 },

    #[error("The grouper has not been run yet")]
    NotRun,
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[cfg(not(feature = "plotting"))]
    #[error("calpipe was not compiled with the \"plotting\" feature.\nYou need to compile calpipe from source with this feature to plot groupings.")]
    NoPlottingFeature,

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[cfg(feature = "plotting")]
    #[error("Error from the plotters library: {0}")]
    Draw(String),
}
