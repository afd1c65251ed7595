//! Main workflow orchestration logic
//!
//! This module contains the end-to-end run, separated from CLI argument
//! parsing so it can be driven with any repository, engine and output sink.

use crate::actions::{OutputSink, StepOutputs};
use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::container::ContainerEngine;
use crate::error::{PublishError, Result};
use crate::git::Repository;
use crate::publish::{PublishOrchestrator, PublishRequest, PublishedImage};
use crate::resolver::{VersionResolution, VersionResolver};
use crate::ui;

/// Result of a successful workflow run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub resolution: VersionResolution,
    pub outputs: StepOutputs,
    /// `None` in tags-only mode
    pub image: Option<PublishedImage>,
}

impl WorkflowResult {
    /// One-line summary of what the run produced
    pub fn summary(&self) -> String {
        match &self.image {
            Some(image) => format!(
                "Published version {} as {}",
                self.resolution.next_version, image.version_image
            ),
            None => format!(
                "Resolved version {} as {} without publishing an image",
                self.resolution.next_version, self.outputs.git_tag
            ),
        }
    }
}

/// Main publish workflow
///
/// Orchestrates the entire run:
/// 1. Fetch remote tags
/// 2. Resolve current and next version
/// 3. Enforce the tags-only precondition (strict mode)
/// 4. Create and push the version tag if needed
/// 5. Build and publish the image unless in tags-only mode
/// 6. Emit step outputs
///
/// Outputs are only written once every previous step has succeeded.
pub fn run_workflow<R, E, S>(
    config: &Config,
    repo: &R,
    engine: &E,
    sink: &S,
) -> Result<WorkflowResult>
where
    R: Repository,
    E: ContainerEngine,
    S: OutputSink,
{
    let remote = config.settings.git.remote.as_str();

    if config.settings.git.fetch_tags {
        ui::display_status(&format!("Fetching tags from {}", remote));
        repo.fetch_tags(remote)?;
    }

    let resolver = VersionResolver::new(repo, config.prefix.clone(), config.always_increment);
    let state = resolver.resolve(&config.commit)?;

    if config.only_output_tags && state.needs_new_tag() && config.settings.behavior.strict_tags_only
    {
        return Err(PublishError::config(
            "only-output-tags mode can only be used if an image has already been released for this commit",
        ));
    }

    let resolution = resolver.ensure_tag(&state, &config.commit, remote)?;
    ui::display_resolution(&resolution, &config.branch.name);

    if state.needs_new_tag() && !resolution.tag_created {
        ui::display_boundary_warning(&BoundaryWarning::TagAlreadyPresent {
            tag: resolution.git_tag.clone(),
            commit: config.commit.clone(),
        });
    }

    if config.only_output_tags && resolution.tag_created {
        ui::display_boundary_warning(&BoundaryWarning::TagsOnlyWithoutImage {
            tag: resolution.git_tag.clone(),
        });
    }

    if !config.only_output_tags {
        for warning in &config.warnings {
            ui::display_boundary_warning(warning);
        }
    }

    let request = PublishRequest {
        image_name: &config.image_name,
        branch: &config.branch,
        resolution: &resolution,
        context: &config.context,
        dockerfile: config.dockerfile.as_deref(),
        credentials: &config.credentials,
        enable_cache: config.enable_cache,
        only_output_tags: config.only_output_tags,
        scratch_dir: &config.scratch_dir,
    };
    let outcome = PublishOrchestrator::new(engine).publish(&request)?;

    let variables: Vec<(&str, String)> = outcome
        .image
        .iter()
        .map(|image| ("DOCKER_CONFIG", image.docker_config.display().to_string()))
        .collect();
    sink.write(&outcome.outputs, &variables)?;
    ui::display_outputs(&outcome.outputs);

    Ok(WorkflowResult {
        resolution,
        outputs: outcome.outputs,
        image: outcome.image,
    })
}
