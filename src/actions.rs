//! CI runner protocol
//!
//! Step outputs and exported variables are appended to the files the runner
//! names in `GITHUB_OUTPUT` and `GITHUB_ENV`, using the heredoc form
//! `name<<delimiter`. Workflow commands (`::error::`, `::group::`) go to stdout.

use crate::error::{PublishError, Result};
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Values a successful run hands to later pipeline steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutputs {
    /// Version image tag (e.g. `develop-7`)
    pub tag: String,
    /// Floating alias (e.g. `latest` or `develop-latest`)
    pub latest_tag: String,
    /// Version-control tag (e.g. `VERSION-DEVELOP-7`)
    pub git_tag: String,
    pub version: u64,
}

impl StepOutputs {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tag", self.tag.clone()),
            ("latest_tag", self.latest_tag.clone()),
            ("git_tag", self.git_tag.clone()),
            ("version", self.version.to_string()),
        ]
    }
}

/// Destination for step outputs and exported environment variables
pub trait OutputSink {
    /// Write every step output and exported variable of a run.
    ///
    /// All entries are rendered and all destinations opened before the first
    /// byte is written, so a failure leaves no partial outputs behind.
    fn write(&self, outputs: &StepOutputs, variables: &[(&str, String)]) -> Result<()>;
}

/// Writes to the runner's file commands, or to stdout outside a runner
#[derive(Debug, Clone, Default)]
pub struct RunnerSink {
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl RunnerSink {
    pub fn new(output_file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        RunnerSink {
            output_file,
            env_file,
        }
    }

    fn open(path: &Path) -> Result<File> {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    fn flush(file: Option<File>, entries: &str, pairs: &[(&str, String)]) -> Result<()> {
        match file {
            Some(mut file) => file.write_all(entries.as_bytes())?,
            None => {
                for (name, value) in pairs {
                    println!("{}={}", name, value);
                }
            }
        }
        Ok(())
    }
}

fn render(pairs: &[(&str, String)]) -> Result<String> {
    pairs
        .iter()
        .map(|(name, value)| file_command(name, value))
        .collect()
}

impl OutputSink for RunnerSink {
    fn write(&self, outputs: &StepOutputs, variables: &[(&str, String)]) -> Result<()> {
        let output_pairs = outputs.pairs();
        let output_entries = render(&output_pairs)?;
        let variable_entries = render(variables)?;

        let output_file = self.output_file.as_deref().map(Self::open).transpose()?;
        let env_file = self.env_file.as_deref().map(Self::open).transpose()?;

        Self::flush(env_file, &variable_entries, variables)?;
        Self::flush(output_file, &output_entries, &output_pairs)
    }
}

/// Collects outputs in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: RefCell<Vec<(String, String)>>,
    variables: RefCell<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> Vec<(String, String)> {
        self.outputs.borrow().clone()
    }

    pub fn output(&self, name: &str) -> Option<String> {
        self.outputs
            .borrow()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub fn variables(&self) -> Vec<(String, String)> {
        self.variables.borrow().clone()
    }
}

impl OutputSink for MemorySink {
    fn write(&self, outputs: &StepOutputs, variables: &[(&str, String)]) -> Result<()> {
        self.outputs.borrow_mut().extend(owned(&outputs.pairs()));
        self.variables.borrow_mut().extend(owned(variables));
        Ok(())
    }
}

fn owned(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Format one `name<<delimiter` file command entry
pub fn file_command(name: &str, value: &str) -> Result<String> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(PublishError::config(format!(
            "Output '{}' collides with its delimiter",
            name
        )));
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// Escape a message for a workflow command
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// The `::error::` command that marks the step failed with `message`
pub fn error_annotation(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// The `::warning::` command for a non-fatal problem
pub fn warning_annotation(message: &str) -> String {
    format!("::warning::{}", escape_data(message))
}

/// Start a collapsible log group
pub fn start_group(title: &str) {
    println!("::group::{}", escape_data(title));
}

pub fn end_group() {
    println!("::endgroup::");
}
