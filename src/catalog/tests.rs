// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fs, io::Cursor};

use approx::assert_abs_diff_eq;
use indoc::indoc;
use tempfile::TempDir;

use super::*;
use crate::grouping::{Grouper, GroupingParams};

fn source(name: &str, x: f64, y: f64, flux: f64) -> Source {
    Source {
        name: name.to_string(),
        x,
        y,
        flux,
    }
}

#[test]
fn test_catalog_type_from_path() {
    assert_eq!(CatalogType::from_path(Path::new("a.json")), Some(CatalogType::Json));
    assert_eq!(CatalogType::from_path(Path::new("a.YML")), Some(CatalogType::Yaml));
    assert_eq!(CatalogType::from_path(Path::new("a.yaml")), Some(CatalogType::Yaml));
    assert_eq!(CatalogType::from_path(Path::new("a.csv")), Some(CatalogType::Text));
    assert_eq!(
        CatalogType::from_path(Path::new("skymodel00_cluster.skymodel")),
        Some(CatalogType::Text)
    );
    assert_eq!(CatalogType::from_path(Path::new("a.fits")), None);
    assert_eq!(CatalogType::from_path(Path::new("no_extension")), None);
}

#[test]
fn test_parse_text() {
    let text = indoc! {"
        # name  ra  dec  flux
        Isl_0   10.0  50.0  2.5
        Isl_1,10.01,50.0,0.4   # trailing comment

        Isl_2 , 11.5 , 49.0 , 1e-2
    "};
    let sources = parse_text(Cursor::new(text)).unwrap();
    assert_eq!(
        sources,
        vec![
            source("Isl_0", 10.0, 50.0, 2.5),
            source("Isl_1", 10.01, 50.0, 0.4),
            source("Isl_2", 11.5, 49.0, 0.01),
        ]
    );
}

#[test]
fn test_parse_text_bad_lines() {
    let result = parse_text(Cursor::new("Isl_0 10.0 50.0 2.5\nIsl_1 10.0 50.0\n"));
    assert!(matches!(result, Err(CatalogError::BadLine { line: 2, .. })));

    let result = parse_text(Cursor::new("Isl_0 10.0 fifty 2.5\n"));
    match result {
        Err(CatalogError::BadLine { line, reason }) => {
            assert_eq!(line, 1);
            assert!(reason.contains("fifty"));
        }
        other => panic!("expected a BadLine error, got {other:?}"),
    }
}

#[test]
fn test_read_json_and_yaml() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("sources.json");
    fs::write(
        &json,
        r#"[{"name": "A", "x": 1.0, "y": 2.0, "flux": 3.0}, {"name": "B", "x": 4.0, "y": 5.0, "flux": 6.0}]"#,
    )
    .unwrap();
    let yaml = dir.path().join("sources.yaml");
    fs::write(
        &yaml,
        indoc! {"
            - name: A
              x: 1.0
              y: 2.0
              flux: 3.0
            - name: B
              x: 4.0
              y: 5.0
              flux: 6.0
        "},
    )
    .unwrap();

    let expected = vec![source("A", 1.0, 2.0, 3.0), source("B", 4.0, 5.0, 6.0)];
    assert_eq!(read_sources(&json).unwrap(), expected);
    assert_eq!(read_sources(&yaml).unwrap(), expected);
}

#[test]
fn test_read_bad_files() {
    let dir = TempDir::new().unwrap();

    let unknown = dir.path().join("sources.fits");
    fs::write(&unknown, "").unwrap();
    assert!(matches!(
        read_sources(&unknown),
        Err(CatalogError::UnknownFormat(_))
    ));

    let broken = dir.path().join("sources.json");
    fs::write(&broken, "[{\"name\": \"A\"}]").unwrap();
    assert!(matches!(
        read_sources(&broken),
        Err(CatalogError::Decode { format: "json", .. })
    ));

    let duplicated = dir.path().join("sources.txt");
    fs::write(&duplicated, "A 1 2 3\nB 1 2 3\nA 4 5 6\n").unwrap();
    match read_sources(&duplicated) {
        Err(CatalogError::DuplicateName(name)) => assert_eq!(name, "A"),
        other => panic!("expected a DuplicateName error, got {other:?}"),
    }

    let missing = dir.path().join("missing.txt");
    assert!(matches!(read_sources(&missing), Err(CatalogError::IO(_))));
}

#[test]
fn test_patches_from_grouping() {
    let sources = vec![
        source("faint_pair_a", 5.0, 5.0, 0.2),
        source("bright", 0.0, 0.0, 10.0),
        source("bright_companion", 0.02, 0.0, 1.0),
        source("faint_pair_b", 5.01, 5.0, 0.3),
        source("loner", -3.0, 2.0, 0.5),
    ];
    let (points, fluxes) = grouper_inputs(&sources);
    let mut grouper = Grouper::new(points, fluxes, GroupingParams::default()).unwrap();
    grouper.run();
    let clusters = grouper.clusters().unwrap();
    let patches = Patch::from_clusters(&sources, &clusters, 0.5).unwrap();

    let names: Vec<&str> = patches.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["bright", "faint_pair_b", "loner"]);

    assert_eq!(patches[0].members, vec!["bright", "bright_companion"]);
    assert_abs_diff_eq!(patches[0].flux, 11.0);
    assert_abs_diff_eq!(patches[0].centroid[0], 0.02 / 11.0, epsilon = 1e-12);
    // The companion is the furthest member from the centroid.
    assert_abs_diff_eq!(
        patches[0].size,
        (0.02 - 0.02 / 11.0) * PATCH_SIZE_PADDING,
        epsilon = 1e-12
    );
    assert!(patches[0].calibrator);

    assert_eq!(patches[1].members, vec!["faint_pair_a", "faint_pair_b"]);
    assert_abs_diff_eq!(patches[1].flux, 0.5);
    assert!(patches[1].calibrator);

    assert_eq!(patches[2].members, vec!["loner"]);
    assert_abs_diff_eq!(patches[2].size, 0.0);
    assert!(patches[2].calibrator);

    let patches = Patch::from_clusters(&sources, &clusters, 1.0).unwrap();
    let calibrators: Vec<&str> = patches
        .iter()
        .filter(|p| p.calibrator)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(calibrators, vec!["bright"]);
}

#[test]
fn test_patch_ordering_ties() {
    let sources = vec![source("b", 0.0, 0.0, 1.0), source("a", 10.0, 0.0, 1.0)];
    let (points, fluxes) = grouper_inputs(&sources);
    let mut grouper = Grouper::new(points, fluxes, GroupingParams::default()).unwrap();
    grouper.run();
    let patches = Patch::from_clusters(&sources, &grouper.clusters().unwrap(), 0.0).unwrap();
    let names: Vec<&str> = patches.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_clusters_from_another_catalog() {
    let sources = vec![source("only", 0.0, 0.0, 1.0)];
    let clusters = vec![Cluster {
        members: vec![0, 3],
        centroid: [0.0, 0.0],
        flux: 2.0,
    }];
    assert!(matches!(
        Patch::from_clusters(&sources, &clusters, 0.0),
        Err(CatalogError::BadSourceIndex {
            index: 3,
            num_sources: 1
        })
    ));
}

#[test]
fn test_write_patches() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patches.json");
    let patches = vec![Patch {
        name: "Isl_3".to_string(),
        members: vec!["Isl_3".to_string(), "Isl_7".to_string()],
        centroid: [120.5, 45.25],
        flux: 4.5,
        size: 0.06,
        calibrator: true,
    }];
    write_patches(&path, &patches).unwrap();
    let read: Vec<Patch> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(read, patches);
}
