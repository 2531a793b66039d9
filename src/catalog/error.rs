// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use super::CATALOG_TYPES_COMMA_SEPARATED;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Source catalog '{0}' doesn't have a recognised file extension! Valid extensions are: {}", *CATALOG_TYPES_COMMA_SEPARATED)]
    UnknownFormat(PathBuf),

    #[error("Couldn't decode {format} source catalog {path}: {message}")]
    Decode {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("Line {line} of the source catalog: {reason}")]
    BadLine { line: usize, reason: String },

    #[error("The source name '{0}' appears more than once in the catalog")]
    DuplicateName(String),

    #[error("A cluster refers to source {index}, but the catalog only has {num_sources} sources")]
    BadSourceIndex { index: usize, num_sources: usize },

    #[error("Couldn't write patches to {path}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
