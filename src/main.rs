use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use version_publish::actions::{self, RunnerSink};
use version_publish::cli::orchestration::{run_workflow, WorkflowResult};
use version_publish::config::{self, Config, Environment, Inputs};
use version_publish::container::DockerCli;
use version_publish::git::Git2Repository;
use version_publish::ui;

#[derive(clap::Parser)]
#[command(
    name = "version-publish",
    version,
    about = "Tag the branch tip with the next branch version and publish a container image for it"
)]
struct Args {
    #[arg(long, help = "Custom settings file path")]
    config: Option<String>,

    #[arg(long, env = "GITHUB_WORKSPACE", default_value = ".", help = "Git repository to tag")]
    repository: String,

    #[arg(long, env = "INPUT_NAME", default_value = "", help = "Image name (defaults to the repository)")]
    name: String,

    #[arg(long, env = "INPUT_PATH", default_value = ".", help = "Build context path")]
    path: String,

    #[arg(long, env = "INPUT_DOCKERFILE", default_value = "", help = "Dockerfile path override")]
    dockerfile: String,

    #[arg(
        long,
        env = "INPUT_ONLY-OUTPUT-TAGS",
        default_value = "false",
        help = "Only resolve tags, do not build or push an image"
    )]
    only_output_tags: String,

    #[arg(
        long,
        env = "INPUT_ALWAYS-INCREMENT-VERSION",
        default_value = "false",
        help = "Increment the version even if the commit is already tagged"
    )]
    always_increment_version: String,

    #[arg(
        long,
        env = "INPUT_ENABLE-CACHE",
        default_value = "false",
        help = "Use the previous version's image as build cache"
    )]
    enable_cache: String,

    #[arg(long, env = "INPUT_REGISTRY", default_value = "", help = "Registry: acr or acr-public")]
    registry: String,
}

impl Args {
    fn inputs(&self) -> Inputs {
        Inputs {
            name: self.name.clone(),
            path: self.path.clone(),
            dockerfile: self.dockerfile.clone(),
            only_output_tags: self.only_output_tags.clone(),
            always_increment_version: self.always_increment_version.clone(),
            enable_cache: self.enable_cache.clone(),
            registry: self.registry.clone(),
        }
    }
}

fn init_logging() {
    let default_level = if std::env::var("RUNNER_DEBUG").as_deref() == Ok("1") {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("VERSION_PUBLISH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<WorkflowResult> {
    let settings =
        config::load_settings(args.config.as_deref()).context("Error loading settings")?;

    // Validating the branch ref here keeps non-branch triggers away from the repository
    let config = Config::assemble(&args.inputs(), &Environment::from_env(), settings)?;

    let repo = Git2Repository::open(&args.repository)
        .with_context(|| format!("Git repository error in '{}'", args.repository))?
        .with_token(config.token.as_ref().map(|t| t.expose().to_string()));
    let engine = DockerCli::new(config.settings.container.engine.clone());
    let sink = RunnerSink::new(config.output_file.clone(), config.env_file.clone());

    Ok(run_workflow(&config, &repo, &engine, &sink)?)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(&args) {
        Ok(result) => {
            ui::display_success(&result.summary());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let message = format!("{:#}", err);
            if let Some(publish_err) = err.downcast_ref::<version_publish::PublishError>() {
                tracing::debug!(kind = ?publish_err.kind(), "run failed");
            }
            ui::display_error(&message);
            println!("{}", actions::error_annotation(&message));
            ExitCode::FAILURE
        }
    }
}
