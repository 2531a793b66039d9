// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `calpipe`
//! subcommands are contained in modules.
//!
//! All booleans must have `#[serde(default)]` annotated, and anything that
//! isn't a boolean must be optional. This allows all arguments to be optional
//! *and* usable in an arguments file.
//!
//! Only 3 things should be public in this module: `Calpipe`, `Calpipe::run`,
//! and `CalpipeError`.

#[macro_use]
mod common;
mod error;
mod group;
mod pipeline;
mod walker;

pub use error::CalpipeError;

use std::path::PathBuf;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = "Resumable stage control and direction grouping for LOFAR calibration pipelines"
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Calpipe {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information. Nothing is written.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run. Only used by "group".
    #[clap(long, parse(from_os_str))]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(alias = "group-sources")]
    #[clap(about = "Group the sources of a sky-model catalog into calibration patches.")]
    Group(group::GroupArgs),

    #[clap(about = "List the completed stages of a walker ledger.")]
    WalkerStatus(walker::WalkerStatusArgs),

    #[clap(about = "Mark stages of a walker ledger as done without running them.")]
    WalkerDone(walker::WalkerDoneArgs),

    #[clap(about = "Forget every completed stage of a walker ledger.")]
    WalkerReset(walker::WalkerResetArgs),

    #[clap(alias = "run")]
    #[clap(about = "Run a pipeline file, skipping the stages that have already completed.")]
    PipelineRun(pipeline::PipelineRunArgs),
}

impl Calpipe {
    pub fn run(self) -> Result<(), CalpipeError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity);

        // Print the version of calpipe and its build-time information.
        let sub_command = match &self.command {
            Command::Group(_) => "group",
            Command::WalkerStatus(_) => "walker-status",
            Command::WalkerDone(_) => "walker-done",
            Command::WalkerReset(_) => "walker-reset",
            Command::PipelineRun(_) => "pipeline-run",
        };
        info!("calpipe {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::{
                        fs::File,
                        io::{BufWriter, Write},
                    };

                    let toml_str = toml::to_string(&args).map_err(|e| {
                        CalpipeError::ArgFile(format!("Couldn't serialise arguments to toml: {e}"))
                    })?;
                    let mut f = BufWriter::new(File::create(&toml)?);
                    f.write_all(toml_str.as_bytes())?;
                    info!("Saved arguments to {}", toml.display());
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::Group(args) => merge_save_run!(args),

            // Ledger utilities.
            Command::WalkerStatus(args) => args.run()?,
            Command::WalkerDone(args) => args.run(dry_run)?,
            Command::WalkerReset(args) => args.run(dry_run)?,

            Command::PipelineRun(args) => args.run(dry_run)?,
        }

        info!("calpipe {} complete.", sub_command);
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    // Only fails if a logger is already set, which is fine.
    let _ = builder.try_init();
}

/// Write info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => info!("Compiled on git commit hash: {hash}{dirty}"),
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {hr}");
    }
    info!("            {BUILT_TIME_UTC}");
    info!("         with compiler {RUSTC_VERSION}");
    info!("");
}
