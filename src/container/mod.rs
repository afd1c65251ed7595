//! Container engine abstraction
//!
//! Decisions about what to build and push are expressed as
//! [ContainerCommand] values. A [ContainerEngine] turns them into real
//! invocations; [DockerCli] shells out to the `docker` client and
//! [RecordingEngine] records them for tests.

pub mod engine;
pub mod recording;

pub use engine::DockerCli;
pub use recording::RecordingEngine;

use crate::domain::ImageRef;
use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Everything needed to build one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    pub image: ImageRef,
    pub context: PathBuf,
    pub dockerfile: Option<PathBuf>,
    /// Registry image used as layer cache; enables inline cache export
    pub cache_from: Option<ImageRef>,
}

impl BuildSpec {
    pub fn new(image: ImageRef, context: impl Into<PathBuf>) -> Self {
        BuildSpec {
            image,
            context: context.into(),
            dockerfile: None,
            cache_from: None,
        }
    }

    pub fn with_dockerfile(mut self, dockerfile: Option<PathBuf>) -> Self {
        self.dockerfile = dockerfile;
        self
    }

    pub fn with_cache_from(mut self, cache_from: Option<ImageRef>) -> Self {
        self.cache_from = cache_from;
        self
    }
}

/// A single container engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerCommand {
    Build(BuildSpec),
    Push(ImageRef),
    Tag { source: ImageRef, target: ImageRef },
}

impl ContainerCommand {
    /// Arguments passed to the engine executable
    pub fn args(&self) -> Vec<String> {
        match self {
            ContainerCommand::Build(spec) => {
                let mut args = Vec::new();
                match &spec.cache_from {
                    Some(cache) => {
                        args.extend(["buildx".to_string(), "build".to_string()]);
                        args.push("--cache-from".to_string());
                        args.push(format!("type=registry,ref={}", cache));
                        args.push("--cache-to".to_string());
                        args.push("type=inline".to_string());
                    }
                    None => args.push("build".to_string()),
                }
                args.push("-t".to_string());
                args.push(spec.image.to_string());
                if let Some(dockerfile) = &spec.dockerfile {
                    args.push("-f".to_string());
                    args.push(dockerfile.display().to_string());
                }
                args.push(spec.context.display().to_string());
                args
            }
            ContainerCommand::Push(image) => vec!["push".to_string(), image.to_string()],
            ContainerCommand::Tag { source, target } => {
                vec!["tag".to_string(), source.to_string(), target.to_string()]
            }
        }
    }
}

impl fmt::Display for ContainerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// Executes container commands
pub trait ContainerEngine {
    /// Run `command` to completion.
    ///
    /// `docker_config` points the engine at a registry-auth directory.
    /// A non-zero exit is an error.
    fn execute(&self, command: &ContainerCommand, docker_config: Option<&Path>) -> Result<()>;
}
