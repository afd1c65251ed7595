//! Image build and publish sequence
//!
//! Side effects run strictly in order and stop at the first failure:
//! build, push the version tag, re-tag under the floating alias, push the
//! alias. A partially pushed image is not rolled back.

use crate::actions::{self, StepOutputs};
use crate::container::{BuildSpec, ContainerCommand, ContainerEngine};
use crate::domain::{BranchContext, ImageRef};
use crate::error::Result;
use crate::registry::{self, RegistryCredential};
use crate::resolver::VersionResolution;
use crate::ui;
use std::path::{Path, PathBuf};
use tracing::info;

/// Inputs for one publish run
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub image_name: &'a str,
    pub branch: &'a BranchContext,
    pub resolution: &'a VersionResolution,
    pub context: &'a Path,
    pub dockerfile: Option<&'a Path>,
    pub credentials: &'a [RegistryCredential],
    pub enable_cache: bool,
    pub only_output_tags: bool,
    /// Parent directory for the per-run registry auth directory
    pub scratch_dir: &'a Path,
}

impl PublishRequest<'_> {
    pub fn version_image(&self) -> ImageRef {
        ImageRef::new(
            self.image_name,
            self.branch.image_tag(self.resolution.next_version),
        )
    }

    pub fn alias_image(&self) -> ImageRef {
        ImageRef::new(self.image_name, self.branch.floating_alias())
    }

    /// Image of the previous resolved version, used as layer cache
    pub fn cache_image(&self) -> Option<ImageRef> {
        self.enable_cache.then(|| {
            ImageRef::new(
                self.image_name,
                self.branch.image_tag(self.resolution.current_version),
            )
        })
    }

    pub fn outputs(&self) -> StepOutputs {
        StepOutputs {
            tag: self.branch.image_tag(self.resolution.next_version),
            latest_tag: self.branch.floating_alias(),
            git_tag: self.resolution.git_tag.clone(),
            version: self.resolution.next_version,
        }
    }
}

/// What a publish run pushed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedImage {
    pub version_image: ImageRef,
    pub alias_image: ImageRef,
    /// Auth directory the engine was pointed at
    pub docker_config: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub outputs: StepOutputs,
    /// `None` in tags-only mode
    pub image: Option<PublishedImage>,
}

/// Drives the container engine through the publish sequence
pub struct PublishOrchestrator<'a, E: ContainerEngine> {
    engine: &'a E,
}

impl<'a, E: ContainerEngine> PublishOrchestrator<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        PublishOrchestrator { engine }
    }

    /// The ordered container commands for `request`
    pub fn plan(request: &PublishRequest<'_>) -> Vec<ContainerCommand> {
        let version_image = request.version_image();
        let alias_image = request.alias_image();

        let build = BuildSpec::new(version_image.clone(), request.context)
            .with_dockerfile(request.dockerfile.map(Path::to_path_buf))
            .with_cache_from(request.cache_image());

        vec![
            ContainerCommand::Build(build),
            ContainerCommand::Push(version_image.clone()),
            ContainerCommand::Tag {
                source: version_image,
                target: alias_image.clone(),
            },
            ContainerCommand::Push(alias_image),
        ]
    }

    pub fn publish(&self, request: &PublishRequest<'_>) -> Result<PublishOutcome> {
        let outputs = request.outputs();
        if request.only_output_tags {
            info!("tags-only mode, skipping image build");
            return Ok(PublishOutcome {
                outputs,
                image: None,
            });
        }

        let docker_config = registry::write_auth_config(request.scratch_dir, request.credentials)?;

        let version_image = request.version_image();
        ui::display_status(&format!(
            "Will now build Dockerfile at {} as {}",
            request.context.display(),
            version_image
        ));

        for command in Self::plan(request) {
            actions::start_group(&command.to_string());
            let result = self.engine.execute(&command, Some(&docker_config));
            actions::end_group();
            result?;

            if let ContainerCommand::Push(image) = &command {
                ui::display_success(&format!("Pushed {}", image));
            }
        }

        Ok(PublishOutcome {
            outputs,
            image: Some(PublishedImage {
                version_image,
                alias_image: request.alias_image(),
                docker_config,
            }),
        })
    }
}
