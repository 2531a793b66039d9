// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests for the walker-* subcommands.

use std::fs;

use tempfile::TempDir;

use crate::{calpipe, get_cmd_output, path_str};

#[test]
fn test_walker_done_status_reset() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let ledger = tmp_dir.path().join("PiLL.walker");
    let ledger_str = path_str(&ledger);

    let cmd = calpipe()
        .args(["walker-done", &ledger_str, "download", "timesplit_id123_P1"])
        .ok();
    assert!(cmd.is_ok(), "walker-done failed: {}", cmd.err().unwrap());
    assert_eq!(
        fs::read_to_string(&ledger).unwrap(),
        "download\ntimesplit_id123_P1\n"
    );

    // Marking a stage again changes nothing.
    let cmd = calpipe().args(["walker-done", &ledger_str, "download"]).ok();
    assert!(cmd.is_ok(), "walker-done failed: {}", cmd.err().unwrap());
    assert_eq!(
        fs::read_to_string(&ledger).unwrap(),
        "download\ntimesplit_id123_P1\n"
    );

    let cmd = calpipe().args(["walker-status", &ledger_str]).ok();
    assert!(cmd.is_ok(), "walker-status failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("2 stages done"), "{stdout}");
    assert!(stdout.contains("1: download"), "{stdout}");
    assert!(stdout.contains("2: timesplit_id123_P1"), "{stdout}");

    // A dry run leaves the ledger alone.
    let cmd = calpipe()
        .args(["walker-reset", &ledger_str, "--dry-run"])
        .ok();
    assert!(cmd.is_ok(), "walker-reset failed: {}", cmd.err().unwrap());
    assert_eq!(
        fs::read_to_string(&ledger).unwrap(),
        "download\ntimesplit_id123_P1\n"
    );

    let cmd = calpipe().args(["walker-reset", &ledger_str]).ok();
    assert!(cmd.is_ok(), "walker-reset failed: {}", cmd.err().unwrap());
    assert_eq!(fs::read_to_string(&ledger).unwrap(), "");
}

#[test]
fn test_walker_status_of_missing_ledger() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let ledger = tmp_dir.path().join("nothing.walker");

    let cmd = calpipe()
        .args(["walker-status", &path_str(&ledger)])
        .ok();
    assert!(cmd.is_ok(), "walker-status failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("0 stages done"), "{stdout}");
    assert!(!ledger.exists());
}

#[test]
fn test_walker_done_rejects_bad_stage_names() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let ledger = tmp_dir.path().join("PiLL.walker");

    let cmd = calpipe()
        .args(["walker-done", &path_str(&ledger), "fine", " padded"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Invalid stage name"), "{stderr}");
    // Nothing is marked if any name is bad.
    assert!(!ledger.exists());
}
