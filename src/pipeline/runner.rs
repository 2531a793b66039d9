// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Running the body of a stage.

use std::{
    fs::{File, OpenOptions},
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
};

use log::{debug, info};
use thiserror::Error;

use super::PlannedStage;

/// Something went wrong inside a stage. The walker never sees these; the stage
/// simply isn't marked done.
#[derive(Error, Debug)]
pub enum StageBodyError {
    #[error("Couldn't start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("'{command}' finished unsuccessfully ({status})")]
    Failed { command: String, status: ExitStatus },

    #[error("Couldn't open log file {path}: {source}")]
    Log {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Executes stage bodies.
pub trait StageRunner {
    fn run(&mut self, stage: &PlannedStage) -> Result<(), StageBodyError>;
}

/// Runs a stage's command as a child process in the stage's working
/// directory. If a log directory is given, the command's stdout and stderr go
/// to `<log_dir>/<stage>.log`, otherwise they are inherited.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    pub log_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(log_dir: Option<PathBuf>) -> CommandRunner {
        CommandRunner { log_dir }
    }

    fn log_file(&self, stage: &PlannedStage) -> Result<Option<(PathBuf, File)>, StageBodyError> {
        let Some(log_dir) = self.log_dir.as_ref() else {
            return Ok(None);
        };
        let file_name: String = stage
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let path = log_dir.join(format!("{file_name}.log"));
        let file = std::fs::create_dir_all(log_dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
            .map_err(|source| StageBodyError::Log {
                path: path.clone(),
                source,
            })?;
        Ok(Some((path, file)))
    }
}

impl StageRunner for CommandRunner {
    fn run(&mut self, stage: &PlannedStage) -> Result<(), StageBodyError> {
        let program = stage.command.first();
        let command_str = stage.command.join(" ");
        info!("Exec: {command_str}");

        let mut command = Command::new(program);
        command.args(&stage.command.as_slice()[1..]).current_dir(&stage.workdir);
        if let Some((path, file)) = self.log_file(stage)? {
            debug!("Logging '{}' to {}", stage.name, path.display());
            let stderr = file.try_clone().map_err(|source| StageBodyError::Log {
                path: path.clone(),
                source,
            })?;
            command.stdout(Stdio::from(file)).stderr(Stdio::from(stderr));
        }

        let status = command.status().map_err(|source| StageBodyError::Spawn {
            program: program.clone(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(StageBodyError::Failed {
                command: command_str,
                status,
            })
        }
    }
}
