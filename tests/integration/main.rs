// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod group;
mod pipeline;
mod walker;

use std::{
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};

fn calpipe() -> Command {
    Command::cargo_bin("calpipe").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Write a small sky model: a bright source with a faint neighbour, and a
/// loner far away.
fn make_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("sky.txt");
    std::fs::write(
        &path,
        "# name x y flux\n\
         bright 0.0  0.0 10.0\n\
         faint  0.01 0.0 1.0\n\
         loner  5.0  5.0 0.5\n",
    )
    .unwrap();
    path
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}
