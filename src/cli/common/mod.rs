// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things shared by the `calpipe` subcommands.

mod printers;

pub(super) use printers::{display_warnings, InfoPrinter, Warn};

use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    catalog::CATALOG_TYPES_COMMA_SEPARATED,
    constants::{
        DEFAULT_GROUPING_DISTANCE, DEFAULT_KERNEL_SIZE, DEFAULT_LOOK_DISTANCE,
        DEFAULT_MIN_CALIBRATOR_FLUX,
    },
    pipeline::PIPELINE_FILE_TYPES_COMMA_SEPARATED,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    pub(super) static ref SOURCES_HELP: String =
        format!("The source catalog to group. Supported formats: {}", *CATALOG_TYPES_COMMA_SEPARATED);

    pub(super) static ref LOOK_DISTANCE_HELP: String =
        format!("Sources further apart than this don't pull on each other. Default: {DEFAULT_LOOK_DISTANCE}");

    pub(super) static ref KERNEL_SIZE_HELP: String =
        format!("The bandwidth of the Gaussian kernel that weights neighbouring sources. Default: {DEFAULT_KERNEL_SIZE}");

    pub(super) static ref GROUPING_DISTANCE_HELP: String =
        format!("Shifted sources this close (or closer) end up in the same patch. Default: {DEFAULT_GROUPING_DISTANCE}");

    pub(super) static ref MIN_FLUX_HELP: String =
        format!("Patches with a total flux below this are not marked as calibrators. Default: {DEFAULT_MIN_CALIBRATOR_FLUX}");

    pub(super) static ref PIPELINE_FILE_HELP: String =
        format!("The pipeline to run. Supported formats: {}", *PIPELINE_FILE_TYPES_COMMA_SEPARATED);
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

/// Read an arguments file into whatever type the surrounding function needs,
/// returning a [crate::CalpipeError] from the surrounding function if that
/// can't be done.
macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::{common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED}, CalpipeError};

        log::debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(CalpipeError::ArgFile(format!(
                            "Couldn't decode toml structure from {}:\n{err}",
                            $arg_file.display()
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(CalpipeError::ArgFile(format!(
                            "Couldn't decode json structure from {}:\n{err}",
                            $arg_file.display()
                        )))
                    }
                }
            }

            None => {
                return Err(CalpipeError::ArgFile(format!(
                    "Argument file '{}' doesn't have a recognised file extension! Valid extensions are: {}",
                    $arg_file.display(),
                    *ARG_FILE_TYPES_COMMA_SEPARATED
                )))
            }
        }
    });
}
