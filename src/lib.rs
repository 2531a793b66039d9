// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Building blocks for resumable, direction-dependent calibration pipelines.
//!
//! - [grouping] clusters nearby sky sources into calibration patches;
//! - [walker] records which stages of a pipeline have completed, so that a
//!   crashed run resumes where it stopped;
//! - [pipeline] runs declarative pipeline files through a walker.

pub mod catalog;
mod cli;
pub mod constants;
pub mod grouping;
pub mod pipeline;
pub mod walker;

pub use cli::{Calpipe, CalpipeError};
pub use grouping::{Cluster, Grouper, GroupingParams, Position};
pub use walker::{FileLedger, LedgerStore, MemoryLedger, Walker};
