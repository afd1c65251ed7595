use crate::container::{ContainerCommand, ContainerEngine};
use crate::error::{PublishError, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Runs container commands through a docker-compatible client
///
/// Output is streamed to the parent's stdout/stderr so it lands in the CI log.
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        DockerCli {
            program: program.into(),
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ContainerEngine for DockerCli {
    fn execute(&self, command: &ContainerCommand, docker_config: Option<&Path>) -> Result<()> {
        let args = command.args();
        debug!(program = %self.program, ?args, "running container command");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args);
        if let Some(dir) = docker_config {
            cmd.env("DOCKER_CONFIG", dir);
        }

        let status = cmd.status().map_err(|e| {
            PublishError::container(format!("Failed to execute {}: {}", self.program, e))
        })?;

        if !status.success() {
            return Err(PublishError::container(format!(
                "`{} {}` failed with exit code {}",
                self.program,
                command,
                status.code().unwrap_or(-1)
            )));
        }

        Ok(())
    }
}
