// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Group the sources of a catalog into calibration patches.


use std::{borrow::Cow, path::PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, InfoPrinter, Warn, ARG_FILE_HELP, GROUPING_DISTANCE_HELP,
    KERNEL_SIZE_HELP, LOOK_DISTANCE_HELP, MIN_FLUX_HELP, SOURCES_HELP,
};
use crate::{
    catalog::{grouper_inputs, read_sources, write_patches, Patch, Source},
    constants::DEFAULT_MIN_CALIBRATOR_FLUX,
    grouping::{plot_grouping, Grouper, GroupingParams},
    CalpipeError,
};

/// The number of patches listed individually in the summary.
const NUM_PATCHES_TO_LIST: usize = 10;

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct GroupArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(short, long, help = SOURCES_HELP.as_str(), help_heading = "INPUT FILES", parse(from_os_str))]
    pub(super) sources: Option<PathBuf>,

    #[clap(long, help = LOOK_DISTANCE_HELP.as_str(), help_heading = "GROUPING")]
    pub(super) look_distance: Option<f64>,

    #[clap(long, help = KERNEL_SIZE_HELP.as_str(), help_heading = "GROUPING")]
    pub(super) kernel_size: Option<f64>,

    #[clap(long, help = GROUPING_DISTANCE_HELP.as_str(), help_heading = "GROUPING")]
    pub(super) grouping_distance: Option<f64>,

    #[clap(long, help = MIN_FLUX_HELP.as_str(), help_heading = "GROUPING")]
    pub(super) min_flux: Option<f64>,

    /// Write the patches to this JSON file.
    #[clap(short, long, help_heading = "OUTPUT FILES", parse(from_os_str))]
    pub(super) output: Option<PathBuf>,

    /// Draw the grouping into this PNG file. Only available if compiled with
    /// the "plotting" feature.
    #[clap(long, help_heading = "OUTPUT FILES", parse(from_os_str))]
    pub(super) plot: Option<PathBuf>,
}

/// Everything needed to group a catalog, checked.
#[derive(Debug)]
pub(super) struct GroupParams {
    pub(super) sources: Vec<Source>,
    pub(super) grouping_params: GroupingParams,
    pub(super) min_flux: f64,
    pub(super) output: Option<PathBuf>,
    pub(super) plot: Option<PathBuf>,
}

impl GroupArgs {
    /// Consolidate the command-line arguments with those in the arguments
    /// file (if any), preferring the command-line ones. Nothing is checked
    /// here.
    pub(super) fn merge(self) -> Result<GroupArgs, CalpipeError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Pattern match so that new arguments can't be forgotten here.
            let GroupArgs {
                args_file: _,
                sources,
                look_distance,
                kernel_size,
                grouping_distance,
                min_flux,
                output,
                plot,
            } = unpack_arg_file!(arg_file);

            Ok(GroupArgs {
                args_file: None,
                sources: cli_args.sources.or(sources),
                look_distance: cli_args.look_distance.or(look_distance),
                kernel_size: cli_args.kernel_size.or(kernel_size),
                grouping_distance: cli_args.grouping_distance.or(grouping_distance),
                min_flux: cli_args.min_flux.or(min_flux),
                output: cli_args.output.or(output),
                plot: cli_args.plot.or(plot),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<GroupParams, CalpipeError> {
        debug!("{:#?}", self);

        let GroupArgs {
            args_file: _,
            sources,
            look_distance,
            kernel_size,
            grouping_distance,
            min_flux,
            output,
            plot,
        } = self;

        let catalog = sources.ok_or(GroupArgsError::NoSources)?;
        let defaults = GroupingParams::default();
        let grouping_params = GroupingParams {
            look_distance: look_distance.unwrap_or(defaults.look_distance),
            kernel_size: kernel_size.unwrap_or(defaults.kernel_size),
            grouping_distance: grouping_distance.unwrap_or(defaults.grouping_distance),
        };
        grouping_params.validate()?;
        let min_flux = min_flux.unwrap_or(DEFAULT_MIN_CALIBRATOR_FLUX);
        if !min_flux.is_finite() {
            return Err(GroupArgsError::BadMinFlux(min_flux).into());
        }

        let sources = read_sources(&catalog)?;
        let total_flux: f64 = sources.iter().map(|s| s.flux).sum();

        let mut printer = InfoPrinter::new("Grouping sources".into());
        printer.push_block(vec![
            format!("Catalog: {}", catalog.display()).into(),
            format!("{} sources, total flux {total_flux:.3}", sources.len()).into(),
        ]);
        printer.push_block(vec![
            format!("Look distance:     {}", grouping_params.look_distance).into(),
            format!("Kernel size:       {}", grouping_params.kernel_size).into(),
            format!("Grouping distance: {}", grouping_params.grouping_distance).into(),
            format!("Calibrator flux:   >= {min_flux}").into(),
        ]);
        let mut outputs: Vec<Cow<'static, str>> = vec![];
        if let Some(output) = output.as_ref() {
            outputs.push(format!("Patches: {}", output.display()).into());
        }
        if let Some(plot) = plot.as_ref() {
            outputs.push(format!("Plot:    {}", plot.display()).into());
        }
        if !outputs.is_empty() {
            printer.push_block(outputs);
        }
        printer.display();

        if sources.is_empty() {
            format!("The catalog {} has no sources", catalog.display()).warn();
        }
        if output.is_none() {
            "No output file was given; the patches will only be logged".warn();
        }
        if cfg!(not(feature = "plotting")) && plot.is_some() {
            "calpipe was compiled without the \"plotting\" feature; --plot will fail".warn();
        }
        display_warnings();

        Ok(GroupParams {
            sources,
            grouping_params,
            min_flux,
            output,
            plot,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), CalpipeError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

impl GroupParams {
    /// Group the sources and write out the results. Returns the patches.
    pub(super) fn run(self) -> Result<Vec<Patch>, CalpipeError> {
        let GroupParams {
            sources,
            grouping_params,
            min_flux,
            output,
            plot,
        } = self;

        let (points, fluxes) = grouper_inputs(&sources);
        let mut grouper = Grouper::new(points, fluxes, grouping_params)?;
        grouper.run();
        let clusters = grouper.clusters()?;
        let patches = Patch::from_clusters(&sources, &clusters, min_flux)?;

        let num_calibrators = patches.iter().filter(|p| p.calibrator).count();
        let mut printer = InfoPrinter::new(
            format!(
                "{} sources grouped into {} patches ({num_calibrators} calibrators)",
                sources.len(),
                patches.len()
            )
            .into(),
        );
        for patch in patches.iter().take(NUM_PATCHES_TO_LIST) {
            printer.push_line(
                format!(
                    "{}: {} members, flux {:.3}, size {:.4}{}",
                    patch.name,
                    patch.members.len(),
                    patch.flux,
                    patch.size,
                    if patch.calibrator { "" } else { " (too faint)" }
                )
                .into(),
            );
        }
        if patches.len() > NUM_PATCHES_TO_LIST {
            printer.push_line(format!("... and {} more", patches.len() - NUM_PATCHES_TO_LIST).into());
        }
        printer.display();

        if let Some(output) = output {
            write_patches(&output, &patches)?;
            info!("Wrote {}", output.display());
        }
        if let Some(plot) = plot {
            plot_grouping(&grouper, &plot)?;
            info!("Wrote {}", plot.display());
        }

        Ok(patches)
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum GroupArgsError {
    #[error("No source catalog was specified")]
    NoSources,

    #[error("The minimum calibrator flux must be finite, but is {0}")]
    BadMinFlux(f64),
}
