use crate::container::{ContainerCommand, ContainerEngine};
use crate::error::{PublishError, Result};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

/// Engine that records commands instead of running them
#[derive(Default)]
pub struct RecordingEngine {
    calls: RefCell<Vec<(ContainerCommand, Option<PathBuf>)>>,
    fail_at: Cell<Option<usize>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the command with the given zero-based index (and record it)
    pub fn fail_at(&self, index: usize) {
        self.fail_at.set(Some(index));
    }

    pub fn commands(&self) -> Vec<ContainerCommand> {
        self.calls.borrow().iter().map(|(cmd, _)| cmd.clone()).collect()
    }

    /// Auth directory passed with each command
    pub fn config_dirs(&self) -> Vec<Option<PathBuf>> {
        self.calls.borrow().iter().map(|(_, dir)| dir.clone()).collect()
    }
}

impl ContainerEngine for RecordingEngine {
    fn execute(&self, command: &ContainerCommand, docker_config: Option<&Path>) -> Result<()> {
        let mut calls = self.calls.borrow_mut();
        let index = calls.len();
        calls.push((command.clone(), docker_config.map(Path::to_path_buf)));

        if self.fail_at.get() == Some(index) {
            return Err(PublishError::container(format!(
                "`docker {}` failed with exit code 1",
                command
            )));
        }
        Ok(())
    }
}
