// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Source catalogs going into the grouper, and the calibration patches coming
//! out of it.

mod error;
#[cfg(test)]
mod tests;

pub use error::CatalogError;

use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader, BufWriter},
    path::Path,
    str::FromStr,
};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::PATCH_SIZE_PADDING,
    grouping::{distance, Cluster, Position},
};

lazy_static::lazy_static! {
    pub static ref CATALOG_TYPES_COMMA_SEPARATED: String = CatalogType::iter().join(", ");
}

/// The supported catalog formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum CatalogType {
    #[strum(serialize = "json")]
    Json,

    #[strum(to_string = "yaml", serialize = "yml")]
    Yaml,

    /// One source per line: name, x, y, flux. Separated by commas or
    /// whitespace; '#' starts a comment.
    #[strum(to_string = "txt", serialize = "csv", serialize = "skymodel")]
    Text,
}

impl CatalogType {
    pub fn from_path(path: &Path) -> Option<CatalogType> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| CatalogType::from_str(&e).ok())
    }
}

/// A sky-model source (or a source-finder island) with a position and a flux
/// density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub flux: f64,
}

impl Source {
    pub fn position(&self) -> Position {
        [self.x, self.y]
    }
}

/// Split sources into the positions and fluxes that a
/// [crate::grouping::Grouper] takes.
pub fn grouper_inputs(sources: &[Source]) -> (Vec<Position>, Vec<f64>) {
    sources.iter().map(|s| (s.position(), s.flux)).unzip()
}

/// Read a source catalog. The format is determined by the file extension.
pub fn read_sources(path: &Path) -> Result<Vec<Source>, CatalogError> {
    let catalog_type =
        CatalogType::from_path(path).ok_or_else(|| CatalogError::UnknownFormat(path.to_path_buf()))?;
    debug!("Reading {catalog_type} source catalog {}", path.display());

    let reader = BufReader::new(File::open(path)?);
    let sources: Vec<Source> = match catalog_type {
        CatalogType::Json => serde_json::from_reader(reader).map_err(|e| CatalogError::Decode {
            path: path.to_path_buf(),
            format: "json",
            message: e.to_string(),
        })?,
        CatalogType::Yaml => serde_yaml::from_reader(reader).map_err(|e| CatalogError::Decode {
            path: path.to_path_buf(),
            format: "yaml",
            message: e.to_string(),
        })?,
        CatalogType::Text => parse_text(reader)?,
    };

    let mut names = HashSet::with_capacity(sources.len());
    for source in &sources {
        if !names.insert(source.name.as_str()) {
            return Err(CatalogError::DuplicateName(source.name.clone()));
        }
    }
    debug!("Read {} sources", sources.len());
    Ok(sources)
}

/// Parse the plain-text catalog format.
pub fn parse_text<R: BufRead>(reader: R) -> Result<Vec<Source>, CatalogError> {
    let mut sources = vec![];
    for (i_line, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = i_line + 1;
        let content = match line.split_once('#') {
            Some((before, _)) => before,
            None => &line,
        };
        let fields: Vec<&str> = content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            continue;
        }
        let [name, x, y, flux] = fields[..] else {
            return Err(CatalogError::BadLine {
                line: line_num,
                reason: format!("expected 4 fields (name, x, y, flux), got {}", fields.len()),
            });
        };

        let parse = |what: &str, s: &str| -> Result<f64, CatalogError> {
            s.parse().map_err(|_| CatalogError::BadLine {
                line: line_num,
                reason: format!("couldn't parse {what} '{s}' as a number"),
            })
        };
        sources.push(Source {
            name: name.to_string(),
            x: parse("x", x)?,
            y: parse("y", y)?,
            flux: parse("flux", flux)?,
        });
    }
    Ok(sources)
}

/// A calibration direction made of one or more catalog sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Named after the brightest member.
    pub name: String,
    pub members: Vec<String>,
    pub centroid: Position,
    pub flux: f64,

    /// The largest distance of a member from the centroid, padded by 20%.
    pub size: f64,

    /// Is this patch bright enough to be a calibrator?
    pub calibrator: bool,
}

impl Patch {
    /// Turn grouper clusters into patches, brightest first. Patches with at
    /// least `min_flux` total flux are flagged as calibrators. The clusters'
    /// members must index into `sources`.
    pub fn from_clusters(
        sources: &[Source],
        clusters: &[Cluster],
        min_flux: f64,
    ) -> Result<Vec<Patch>, CatalogError> {
        let mut patches = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            let members = cluster
                .members
                .iter()
                .map(|&i| {
                    sources.get(i).ok_or(CatalogError::BadSourceIndex {
                        index: i,
                        num_sources: sources.len(),
                    })
                })
                .collect::<Result<Vec<&Source>, _>>()?;

            // Ties go to the earliest member.
            let Some(brightest) = members
                .iter()
                .copied()
                .reduce(|best, s| if s.flux > best.flux { s } else { best })
            else {
                continue;
            };
            let size = members
                .iter()
                .map(|s| distance(s.position(), cluster.centroid))
                .fold(0.0, f64::max)
                * PATCH_SIZE_PADDING;
            patches.push(Patch {
                name: brightest.name.clone(),
                members: members.iter().map(|s| s.name.clone()).collect(),
                centroid: cluster.centroid,
                flux: cluster.flux,
                size,
                calibrator: cluster.flux >= min_flux,
            });
        }
        patches.sort_by(|a, b| b.flux.total_cmp(&a.flux).then_with(|| a.name.cmp(&b.name)));
        Ok(patches)
    }
}

/// Write patches as pretty-printed JSON.
pub fn write_patches(path: &Path, patches: &[Patch]) -> Result<(), CatalogError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, patches).map_err(|e| CatalogError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
