use crate::boundary::BoundaryWarning;
use crate::domain::{BranchContext, RegistrySelector, VersionTagPrefix};
use crate::error::{PublishError, Result};
use crate::registry::{RegistryCredential, DOCKER_HUB_HOST};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SETTINGS_FILE: &str = "version-publish.toml";

/// Represents the optional settings file for version-publish.
///
/// Everything here has a default; the file only tunes behavior that the
/// CI inputs do not cover.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Settings {
    #[serde(default)]
    pub git: GitSettings,

    #[serde(default)]
    pub container: ContainerSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_engine() -> String {
    "docker".to_string()
}

/// Returns the branches that publish under the bare `latest` alias.
fn default_branches() -> Vec<String> {
    vec!["master".to_string(), "main".to_string()]
}

/// Version-control settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitSettings {
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Fetch remote tags before resolving
    #[serde(default = "default_true")]
    pub fetch_tags: bool,
}

impl Default for GitSettings {
    fn default() -> Self {
        GitSettings {
            remote: default_remote(),
            fetch_tags: default_true(),
        }
    }
}

/// Container engine settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ContainerSettings {
    /// Executable of the docker-compatible client
    #[serde(default = "default_engine")]
    pub engine: String,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        ContainerSettings {
            engine: default_engine(),
        }
    }
}

/// Configuration for behavior customization.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BehaviorSettings {
    #[serde(default = "default_branches")]
    pub default_branches: Vec<String>,

    /// Refuse tags-only runs on commits that have no version tag yet
    #[serde(default)]
    pub strict_tags_only: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        BehaviorSettings {
            default_branches: default_branches(),
            strict_tags_only: false,
        }
    }
}

/// Loads settings from file or returns defaults.
///
/// Attempts to load settings in the following order:
/// 1. Custom path provided as parameter
/// 2. `version-publish.toml` in current directory
/// 3. `.version-publish.toml` in the user config directory
/// 4. Default settings if no file found
///
/// # Returns
/// * `Ok(Settings)` - Loaded or default settings
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_settings(config_path: Option<&str>) -> Result<Settings> {
    let settings_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(SETTINGS_FILE).exists() {
        fs::read_to_string(SETTINGS_FILE)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let settings_path = config_dir.join(format!(".{}", SETTINGS_FILE));
        if settings_path.exists() {
            fs::read_to_string(settings_path)?
        } else {
            return Ok(Settings::default());
        }
    } else {
        return Ok(Settings::default());
    };

    toml::from_str(&settings_str)
        .map_err(|e| PublishError::config(format!("Invalid settings file: {}", e)))
}

/// Raw action inputs, as strings the way the CI runner passes them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    pub name: String,
    pub path: String,
    pub dockerfile: String,
    pub only_output_tags: String,
    pub always_increment_version: String,
    pub enable_cache: String,
    pub registry: String,
}

/// Boolean inputs are true only for the exact string `true`
pub fn input_flag(value: &str) -> bool {
    value == "true"
}

/// Login host and credentials for one registry, as found in the environment
#[derive(Clone, Default, PartialEq)]
pub struct RegistryEnv {
    pub login: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for RegistryEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEnv")
            .field("login", &self.login)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl RegistryEnv {
    fn is_empty(&self) -> bool {
        self.login.is_none() && self.username.is_none() && self.password.is_none()
    }

    fn credential(&self) -> Option<RegistryCredential> {
        match (&self.login, &self.username, &self.password) {
            (Some(host), Some(username), Some(password)) => {
                Some(RegistryCredential::new(host, username, password))
            }
            _ => None,
        }
    }
}

/// A value that must not end up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Snapshot of the process environment taken once at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub git_ref: Option<String>,
    pub commit: Option<String>,
    pub repository: Option<String>,
    pub runner_temp: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub token: Option<Secret>,
    pub docker_hub: RegistryEnv,
    pub acr: RegistryEnv,
    pub acr_public: RegistryEnv,
}

impl Environment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the snapshot from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let registry = |prefix: &str, login: Option<String>| RegistryEnv {
            login,
            username: get(&format!("{}_USERNAME", prefix)),
            password: get(&format!("{}_PASSWORD", prefix)),
        };

        Environment {
            git_ref: get("GITHUB_REF"),
            commit: get("GITHUB_SHA"),
            repository: get("GITHUB_REPOSITORY"),
            runner_temp: get("RUNNER_TEMP").map(PathBuf::from),
            output_file: get("GITHUB_OUTPUT").map(PathBuf::from),
            env_file: get("GITHUB_ENV").map(PathBuf::from),
            token: get("GITHUB_TOKEN").map(Secret::new),
            docker_hub: registry("DOCKER_HUB", Some(DOCKER_HUB_HOST.to_string())),
            acr: registry("ACR", get("ACR_LOGIN")),
            acr_public: registry("ACR_PUBLIC", get("ACR_PUBLIC_LOGIN")),
        }
    }

    /// Scratch directory for per-run files
    pub fn scratch_dir(&self) -> PathBuf {
        self.runner_temp.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Immutable run configuration, assembled once and passed by reference
#[derive(Debug, Clone)]
pub struct Config {
    pub branch: BranchContext,
    pub prefix: VersionTagPrefix,
    pub commit: String,
    pub image_name: String,
    pub context: PathBuf,
    pub dockerfile: Option<PathBuf>,
    pub only_output_tags: bool,
    pub always_increment: bool,
    pub enable_cache: bool,
    pub credentials: Vec<RegistryCredential>,
    pub scratch_dir: PathBuf,
    pub settings: Settings,
    pub output_file: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub token: Option<Secret>,
    /// Non-fatal problems found while assembling
    pub warnings: Vec<BoundaryWarning>,
}

impl Config {
    /// Validate inputs against the environment.
    ///
    /// The branch ref is checked first so that non-branch triggers fail
    /// before anything else is looked at.
    pub fn assemble(inputs: &Inputs, env: &Environment, settings: Settings) -> Result<Self> {
        let git_ref = env.git_ref.as_deref().ok_or_else(|| {
            PublishError::config("No branch given via GITHUB_REF")
        })?;
        let branch = BranchContext::from_ref(git_ref, &settings.behavior.default_branches)?;
        let prefix = VersionTagPrefix::for_branch(&branch);

        let commit = env
            .commit
            .clone()
            .ok_or_else(|| PublishError::config("No commit given via GITHUB_SHA"))?;

        let registry: RegistrySelector = inputs.registry.parse()?;

        let name = if inputs.name.trim().is_empty() {
            env.repository.clone().ok_or_else(|| {
                PublishError::config("No image name given and GITHUB_REPOSITORY is not set")
            })?
        } else {
            inputs.name.trim().to_string()
        };
        let login = match registry {
            RegistrySelector::Default => None,
            RegistrySelector::Acr => env.acr.login.as_deref(),
            RegistrySelector::AcrPublic => env.acr_public.login.as_deref(),
        };
        let image_name = registry.rewrite_name(&name, login)?;
        debug!(registry = registry.name(), image = %image_name, "resolved image name");

        let context = if inputs.path.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(inputs.path.trim())
        };
        let dockerfile = Some(inputs.dockerfile.trim())
            .filter(|d| !d.is_empty())
            .map(PathBuf::from);

        let (credentials, warnings) = collect_credentials(env, registry);

        Ok(Config {
            branch,
            prefix,
            commit,
            image_name,
            context,
            dockerfile,
            only_output_tags: input_flag(&inputs.only_output_tags),
            always_increment: input_flag(&inputs.always_increment_version),
            enable_cache: input_flag(&inputs.enable_cache),
            credentials,
            scratch_dir: env.scratch_dir(),
            settings,
            output_file: env.output_file.clone(),
            env_file: env.env_file.clone(),
            token: env.token.clone(),
            warnings,
        })
    }
}

/// Build the credentials bundle from every registry that is fully configured.
///
/// A registry that is partially configured, or the selected registry when it
/// has no credentials at all, yields a warning instead of an entry.
fn collect_credentials(
    env: &Environment,
    selected: RegistrySelector,
) -> (Vec<RegistryCredential>, Vec<BoundaryWarning>) {
    let registries = [
        (RegistrySelector::Default, "docker-hub", &env.docker_hub),
        (RegistrySelector::Acr, RegistrySelector::Acr.name(), &env.acr),
        (
            RegistrySelector::AcrPublic,
            RegistrySelector::AcrPublic.name(),
            &env.acr_public,
        ),
    ];

    let mut credentials = Vec::new();
    let mut warnings = Vec::new();

    for (selector, label, registry_env) in registries {
        match registry_env.credential() {
            Some(credential) => credentials.push(credential),
            None => {
                let unconfigured = match selector {
                    RegistrySelector::Default => {
                        registry_env.username.is_none() && registry_env.password.is_none()
                    }
                    _ => registry_env.is_empty(),
                };
                if !unconfigured || selector == selected {
                    warnings.push(BoundaryWarning::MissingCredentials {
                        registry: label.to_string(),
                    });
                }
            }
        }
    }

    (credentials, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn environment(pairs: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_input_flag() {
        assert!(input_flag("true"));
        assert!(!input_flag("True"));
        assert!(!input_flag("yes"));
        assert!(!input_flag(""));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let env = environment(&[("GITHUB_REF", ""), ("RUNNER_TEMP", "/runner/tmp")]);
        assert_eq!(env.git_ref, None);
        assert_eq!(env.scratch_dir(), PathBuf::from("/runner/tmp"));
    }

    #[test]
    fn test_docker_hub_credentials_only() {
        let env = environment(&[
            ("DOCKER_HUB_USERNAME", "user"),
            ("DOCKER_HUB_PASSWORD", "pass"),
        ]);
        let (creds, warnings) = collect_credentials(&env, RegistrySelector::Default);
        assert_eq!(creds.len(), 1);
        assert_eq!(creds[0].host, DOCKER_HUB_HOST);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_partial_registry_warns() {
        let env = environment(&[("ACR_LOGIN", "acme.azurecr.io"), ("ACR_USERNAME", "acr")]);
        let (creds, warnings) = collect_credentials(&env, RegistrySelector::Acr);
        assert!(creds.is_empty());
        assert!(warnings.contains(&BoundaryWarning::MissingCredentials {
            registry: "acr".to_string()
        }));
        // Docker Hub was never configured and is not selected
        assert!(!warnings.contains(&BoundaryWarning::MissingCredentials {
            registry: "docker-hub".to_string()
        }));
    }

    #[test]
    fn test_debug_hides_passwords() {
        let env = environment(&[("ACR_PASSWORD", "hunter2"), ("GITHUB_TOKEN", "ghs_x1")]);
        assert_eq!(env.token.as_ref().map(Secret::expose), Some("ghs_x1"));
        assert!(!format!("{:?}", env).contains("ghs_x1"));
        assert!(!format!("{:?}", env).contains("hunter2"));
    }
}
