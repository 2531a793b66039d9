// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests for the "group" subcommand.

use std::fs;

use calpipe::catalog::Patch;
use tempfile::TempDir;

use crate::{calpipe, get_cmd_output, make_catalog, path_str};

fn read_patches(path: &std::path::Path) -> Vec<Patch> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_group_writes_patches() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let catalog = make_catalog(tmp_dir.path());
    let output = tmp_dir.path().join("patches.json");

    #[rustfmt::skip]
    let cmd = calpipe()
        .args([
            "group",
            "--sources", &path_str(&catalog),
            "--output", &path_str(&output),
        ])
        .ok();
    assert!(cmd.is_ok(), "group failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("3 sources grouped into 2 patches"), "{stdout}");

    let patches = read_patches(&output);
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].name, "bright");
    assert_eq!(patches[0].members, vec!["bright", "faint"]);
    assert_eq!(patches[1].members, vec!["loner"]);
}

#[test]
fn test_group_small_grouping_distance_separates_everything() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let catalog = make_catalog(tmp_dir.path());
    let output = tmp_dir.path().join("patches.json");

    #[rustfmt::skip]
    let cmd = calpipe()
        .args([
            "group",
            "--sources", &path_str(&catalog),
            "--look-distance", "0.001",
            "--kernel-size", "0.001",
            "--grouping-distance", "0.0001",
            "-o", &path_str(&output),
        ])
        .ok();
    assert!(cmd.is_ok(), "group failed: {}", cmd.err().unwrap());
    assert_eq!(read_patches(&output).len(), 3);
}

#[test]
fn test_group_args_file_and_save_toml() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let catalog = make_catalog(tmp_dir.path());
    let output = tmp_dir.path().join("patches.json");
    let args_file = tmp_dir.path().join("args.toml");
    fs::write(
        &args_file,
        format!(
            "sources = \"{}\"\noutput = \"{}\"\nmin_flux = 100.0\n",
            path_str(&catalog),
            path_str(&output)
        ),
    )
    .unwrap();
    let saved = tmp_dir.path().join("saved.toml");

    // The CLI's min flux beats the file's.
    #[rustfmt::skip]
    let cmd = calpipe()
        .args([
            "group", &path_str(&args_file),
            "--min-flux", "5",
            "--save-toml", &path_str(&saved),
        ])
        .ok();
    assert!(cmd.is_ok(), "group failed: {}", cmd.err().unwrap());

    let patches = read_patches(&output);
    assert!(patches[0].calibrator);
    assert!(!patches[1].calibrator);

    let saved = fs::read_to_string(saved).unwrap();
    assert!(saved.contains("min_flux = 5.0"), "{saved}");
    assert!(saved.contains(&path_str(&catalog)), "{saved}");
}

#[test]
fn test_group_dry_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let catalog = make_catalog(tmp_dir.path());
    let output = tmp_dir.path().join("patches.json");

    #[rustfmt::skip]
    let cmd = calpipe()
        .args([
            "group",
            "--sources", &path_str(&catalog),
            "--output", &path_str(&output),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "group failed: {}", cmd.err().unwrap());
    assert!(!output.exists());
}

#[test]
fn test_group_errors() {
    let cmd = calpipe().args(["group"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No source catalog was specified"), "{stderr}");

    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let catalog = tmp_dir.path().join("sky.fits");
    fs::write(&catalog, "").unwrap();
    let cmd = calpipe()
        .args(["group", "--sources", &path_str(&catalog)])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("recognised file extension"), "{stderr}");

    let catalog = make_catalog(tmp_dir.path());
    let cmd = calpipe()
        .args(["group", "--sources", &path_str(&catalog), "--kernel-size=-1"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("kernel_size"), "{stderr}");
}
