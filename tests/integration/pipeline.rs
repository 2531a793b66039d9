// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests for the "pipeline-run" subcommand. The stages are shell
//! commands, so these only run on unix.

#![cfg(unix)]

use std::{fs, path::Path};

use tempfile::TempDir;

use crate::{calpipe, get_cmd_output, path_str};

/// Stage "b" fails while a file called "broken" exists. Every stage appends
/// its name to "runs.txt".
fn write_pipeline(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("PiLL.toml");
    fs::write(
        &path,
        r#"
[[stage]]
name = "a"
command = ["sh", "-c", "echo a >> runs.txt"]

[[stage]]
name = "b"
command = ["sh", "-c", "test ! -e broken && echo b >> runs.txt"]

[[stage]]
name = "c_{item}"
for_each = ["P1", "P2"]
command = ["sh", "-c", "echo c_{item} >> ../runs.txt"]
workdir = "{item}"
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_pipeline_resumes_after_failure() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let pipeline = write_pipeline(tmp_dir.path());
    let runs = tmp_dir.path().join("runs.txt");
    let ledger = tmp_dir.path().join("PiLL.walker");
    fs::write(tmp_dir.path().join("broken"), "").unwrap();

    let cmd = calpipe()
        .args(["pipeline-run", &path_str(&pipeline)])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Stage 'b' failed"), "{stderr}");
    assert_eq!(fs::read_to_string(&runs).unwrap(), "a\n");
    assert_eq!(fs::read_to_string(&ledger).unwrap(), "a\n");

    // Fix the problem and go again; "a" isn't redone.
    fs::remove_file(tmp_dir.path().join("broken")).unwrap();
    let cmd = calpipe()
        .args(["pipeline-run", &path_str(&pipeline)])
        .ok();
    assert!(cmd.is_ok(), "pipeline-run failed: {}", cmd.err().unwrap());
    assert_eq!(fs::read_to_string(&runs).unwrap(), "a\nb\nc_P1\nc_P2\n");
    assert_eq!(
        fs::read_to_string(&ledger).unwrap(),
        "a\nb\nc_P1\nc_P2\n"
    );
    assert!(tmp_dir.path().join("P1").is_dir());

    // Everything is done; nothing runs.
    let cmd = calpipe()
        .args(["pipeline-run", &path_str(&pipeline)])
        .ok();
    assert!(cmd.is_ok(), "pipeline-run failed: {}", cmd.err().unwrap());
    assert_eq!(fs::read_to_string(&runs).unwrap(), "a\nb\nc_P1\nc_P2\n");
}

#[test]
fn test_pipeline_dry_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let pipeline = write_pipeline(tmp_dir.path());

    let cmd = calpipe()
        .args(["pipeline-run", &path_str(&pipeline), "--dry-run"])
        .ok();
    assert!(cmd.is_ok(), "pipeline-run failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("4 stages would run: a, b, c_P1, c_P2"), "{stdout}");
    assert!(!tmp_dir.path().join("runs.txt").exists());
    assert!(!tmp_dir.path().join("PiLL.walker").exists());
}

#[test]
fn test_pipeline_ledger_and_log_dirs() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let pipeline = tmp_dir.path().join("cal.yaml");
    fs::write(
        &pipeline,
        "walker: cal.walker\nstage:\n  - name: hello\n    command: [sh, -c, 'echo hello there']\n",
    )
    .unwrap();
    let ledger_dir = tmp_dir.path().join("ledgers");
    let log_dir = tmp_dir.path().join("logs");

    #[rustfmt::skip]
    let cmd = calpipe()
        .args([
            "pipeline-run", &path_str(&pipeline),
            "--ledger-dir", &path_str(&ledger_dir),
            "--log-dir", &path_str(&log_dir),
        ])
        .ok();
    assert!(cmd.is_ok(), "pipeline-run failed: {}", cmd.err().unwrap());
    assert_eq!(
        fs::read_to_string(ledger_dir.join("cal.walker")).unwrap(),
        "hello\n"
    );
    assert_eq!(
        fs::read_to_string(log_dir.join("hello.log")).unwrap(),
        "hello there\n"
    );
}

#[test]
fn test_pipeline_bad_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let pipeline = tmp_dir.path().join("PiLL.toml");
    fs::write(
        &pipeline,
        "[[stage]]\nname = \"a\"\ncommand = [\"true\"]\n\n[[stage]]\nname = \"a\"\ncommand = [\"true\"]\n",
    )
    .unwrap();

    let cmd = calpipe()
        .args(["pipeline-run", &path_str(&pipeline)])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("used more than once"), "{stderr}");
}
