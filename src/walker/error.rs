// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid stage name {0:?}: stage names must be non-empty, single-line and have no surrounding whitespace")]
    InvalidStageName(String),

    #[error("Invalid walker ledger identifier {0:?}: this must be a plain file name")]
    InvalidLedgerId(String),

    #[error("Couldn't read walker ledger {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't write walker ledger {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
