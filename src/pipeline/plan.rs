// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pipeline files, and the plans they expand into.

use std::{
    collections::HashSet,
    fs::File,
    io::Read,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use vec1::Vec1;

use super::PipelineError;
use crate::{constants::DEFAULT_WALKER_EXTENSION, walker::validate_stage_name};

/// The placeholder substituted by each item of a repeated stage.
pub const ITEM_PLACEHOLDER: &str = "{item}";

lazy_static::lazy_static! {
    pub static ref PIPELINE_FILE_TYPES_COMMA_SEPARATED: String = PipelineFileType::iter().join(", ");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum PipelineFileType {
    #[strum(serialize = "toml")]
    Toml,

    #[strum(serialize = "json")]
    Json,

    #[strum(to_string = "yaml", serialize = "yml")]
    Yaml,
}

/// The contents of a pipeline file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineFile {
    /// The walker ledger identifier. Defaults to the pipeline file's stem with
    /// a ".walker" extension.
    pub walker: Option<String>,

    /// The directory stages run in, relative to the pipeline file. Defaults to
    /// the pipeline file's directory.
    pub working_dir: Option<PathBuf>,

    #[serde(rename = "stage", default)]
    pub stages: Vec<StageSpec>,
}

/// One `[[stage]]` entry of a pipeline file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
    pub name: String,

    /// The program and its arguments.
    pub command: Vec<String>,

    /// Where the command runs, relative to the working directory.
    pub workdir: Option<String>,

    /// Directories (relative to the working directory) that are deleted and
    /// recreated before the command runs.
    #[serde(default)]
    pub clean: Vec<String>,

    /// Repeat this stage once per item.
    pub for_each: Option<Vec<String>>,

    /// Repeat this stage once per file name in the working directory matching
    /// this glob pattern.
    pub for_each_glob: Option<String>,
}

/// A stage that is ready to be run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStage {
    pub name: String,
    pub command: Vec1<String>,
    pub workdir: PathBuf,
    pub clean: Vec<PathBuf>,
}

/// One entry of a pipeline plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanStep {
    /// A stage whose name and command are known up front.
    Stage(PlannedStage),

    /// A stage repeated once per file name in the working directory matching
    /// `pattern`. The glob is evaluated when the run reaches this step, so
    /// earlier stages may create the files it matches.
    Glob { pattern: String, template: StageSpec },
}

/// The validated list of steps in a pipeline.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub walker: String,
    pub working_dir: PathBuf,
    pub steps: Vec1<PlanStep>,
}

impl PipelineFile {
    pub fn read(path: &Path) -> Result<PipelineFile, PipelineError> {
        let file_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| PipelineFileType::from_str(&e).ok())
            .ok_or_else(|| PipelineError::UnknownFormat(path.to_path_buf()))?;
        debug!("Parsing {file_type} pipeline file {}", path.display());

        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let decode_error = |format: &'static str, message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            format,
            message,
        };
        match file_type {
            PipelineFileType::Toml => {
                toml::from_str(&contents).map_err(|e| decode_error("toml", e.to_string()))
            }
            PipelineFileType::Json => {
                serde_json::from_str(&contents).map_err(|e| decode_error("json", e.to_string()))
            }
            PipelineFileType::Yaml => {
                serde_yaml::from_str(&contents).map_err(|e| decode_error("yaml", e.to_string()))
            }
        }
    }

    /// Expand and validate the stages. `base_dir` is what the working
    /// directory is relative to.
    pub fn plan(self, default_walker: &str, base_dir: &Path) -> Result<PipelinePlan, PipelineError> {
        let PipelineFile {
            walker,
            working_dir,
            stages: specs,
        } = self;
        let working_dir = match working_dir {
            Some(d) => base_dir.join(d),
            None => base_dir.to_path_buf(),
        };

        let mut steps = vec![];
        let mut names = HashSet::new();
        for spec in specs {
            for step in expand(spec, &working_dir)? {
                if !names.insert(step.name().to_string()) {
                    return Err(PipelineError::DuplicateStage(step.name().to_string()));
                }
                steps.push(step);
            }
        }
        let steps = Vec1::try_from_vec(steps).map_err(|_| PipelineError::NoStages)?;

        Ok(PipelinePlan {
            walker: walker.unwrap_or_else(|| default_walker.to_string()),
            working_dir,
            steps,
        })
    }
}

impl PipelinePlan {
    /// Read a pipeline file and expand it. Unless the file says otherwise, the
    /// stages run in the file's directory and the walker is named after the
    /// file, e.g. "PiLL.toml" uses "PiLL.walker".
    pub fn from_file(path: &Path) -> Result<PipelinePlan, PipelineError> {
        let file = PipelineFile::read(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("pipeline");
        let base_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        file.plan(&format!("{stem}.{DEFAULT_WALKER_EXTENSION}"), &base_dir)
    }

    /// The name of each step. Glob steps give their "{item}" template.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name())
    }
}

impl PlanStep {
    pub fn name(&self) -> &str {
        match self {
            PlanStep::Stage(stage) => &stage.name,
            PlanStep::Glob { template, .. } => &template.name,
        }
    }

    /// The stages this step runs, given what is in `working_dir` right now.
    pub fn expand(&self, working_dir: &Path) -> Result<Vec<PlannedStage>, PipelineError> {
        match self {
            PlanStep::Stage(stage) => Ok(vec![stage.clone()]),
            PlanStep::Glob { pattern, template } => {
                let items = glob_items(&template.name, pattern, working_dir)?;
                if items.is_empty() {
                    warn!(
                        "Stage '{}': nothing in {} matches '{pattern}'",
                        template.name,
                        working_dir.display()
                    );
                }
                items
                    .iter()
                    .map(|item| instantiate(template, Some(item), working_dir))
                    .collect()
            }
        }
    }
}

/// Turn one stage spec into one or more plan steps. Glob templates are
/// checked here but expanded later.
fn expand(spec: StageSpec, working_dir: &Path) -> Result<Vec<PlanStep>, PipelineError> {
    let StageSpec {
        name,
        command,
        workdir,
        clean,
        for_each,
        for_each_glob,
    } = spec;
    let template = StageSpec {
        name,
        command,
        workdir,
        clean,
        for_each: None,
        for_each_glob: None,
    };

    match (for_each, for_each_glob) {
        (Some(_), Some(_)) => Err(PipelineError::ConflictingForEach(template.name)),

        (None, None) => Ok(vec![PlanStep::Stage(instantiate(&template, None, working_dir)?)]),

        (Some(items), None) => {
            if items.is_empty() {
                return Err(PipelineError::EmptyForEach(template.name));
            }
            if !template.name.contains(ITEM_PLACEHOLDER) {
                return Err(PipelineError::NonUniqueTemplate(template.name));
            }
            items
                .iter()
                .map(|item| instantiate(&template, Some(item), working_dir).map(PlanStep::Stage))
                .collect()
        }

        (None, Some(pattern)) => {
            if !template.name.contains(ITEM_PLACEHOLDER) {
                return Err(PipelineError::NonUniqueTemplate(template.name));
            }
            glob::Pattern::new(&pattern).map_err(|e| PipelineError::BadGlob {
                stage: template.name.clone(),
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            // Catch bad names, commands and clean paths before anything runs.
            instantiate(&template, Some("item"), working_dir)?;
            Ok(vec![PlanStep::Glob { pattern, template }])
        }
    }
}

/// File names in `working_dir` matching `pattern`, sorted.
fn glob_items(stage: &str, pattern: &str, working_dir: &Path) -> Result<Vec<String>, PipelineError> {
    let bad_glob = |message: String| PipelineError::BadGlob {
        stage: stage.to_string(),
        pattern: pattern.to_string(),
        message,
    };
    let full_pattern = working_dir.join(pattern);
    let full_pattern = full_pattern
        .to_str()
        .ok_or_else(|| bad_glob("the path isn't valid UTF-8".to_string()))?;

    let mut items = vec![];
    for entry in glob::glob(full_pattern).map_err(|e| bad_glob(e.to_string()))? {
        let path = entry.map_err(|e| bad_glob(e.to_string()))?;
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            items.push(name.to_string());
        }
    }
    items.sort();
    items.dedup();
    Ok(items)
}

fn instantiate(
    template: &StageSpec,
    item: Option<&str>,
    working_dir: &Path,
) -> Result<PlannedStage, PipelineError> {
    let fill = |s: &str| match item {
        Some(item) => s.replace(ITEM_PLACEHOLDER, item),
        None => s.to_string(),
    };

    let name = fill(&template.name);
    validate_stage_name(&name)?;
    let command = Vec1::try_from_vec(template.command.iter().map(|a| fill(a)).collect())
        .map_err(|_| PipelineError::EmptyCommand(name.clone()))?;
    let workdir = match template.workdir.as_deref() {
        Some(w) => working_dir.join(fill(w)),
        None => working_dir.to_path_buf(),
    };
    let clean = template
        .clean
        .iter()
        .map(|c| {
            let c = fill(c);
            let relative = Path::new(&c);
            let is_safe = !c.is_empty()
                && relative
                    .components()
                    .all(|comp| matches!(comp, Component::Normal(_) | Component::CurDir))
                && relative.components().any(|comp| matches!(comp, Component::Normal(_)));
            if is_safe {
                Ok(working_dir.join(relative))
            } else {
                Err(PipelineError::UnsafeCleanPath {
                    stage: name.clone(),
                    path: c,
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PlannedStage {
        name,
        command,
        workdir,
        clean,
    })
}
