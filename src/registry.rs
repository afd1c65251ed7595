//! Registry authentication for the container engine
//!
//! Credentials are written to a `config.json` in the format the docker
//! client reads from `$DOCKER_CONFIG`. Each run gets its own directory under
//! the scratch path, named with a millisecond timestamp. The directory is
//! left in place for later pipeline steps.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Auth key the docker client uses for Docker Hub
pub const DOCKER_HUB_HOST: &str = "https://index.docker.io/v1/";

const AUTH_CONFIG_FILE: &str = "config.json";

/// Login for one registry host
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredential {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl RegistryCredential {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        RegistryCredential {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Base64 of `username:password`
    pub fn encoded(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredential")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct AuthEntry {
    auth: String,
}

#[derive(Debug, Serialize)]
struct AuthConfig {
    auths: BTreeMap<String, AuthEntry>,
}

impl AuthConfig {
    fn from_credentials(credentials: &[RegistryCredential]) -> Self {
        let auths = credentials
            .iter()
            .map(|cred| (cred.host.clone(), AuthEntry { auth: cred.encoded() }))
            .collect();
        AuthConfig { auths }
    }
}

/// Render the auth configuration as JSON
pub fn render_auth_config(credentials: &[RegistryCredential]) -> Result<String> {
    Ok(serde_json::to_string(&AuthConfig::from_credentials(
        credentials,
    ))?)
}

/// Write the auth configuration into a fresh directory under `scratch_dir`.
///
/// Returns the directory to use as `DOCKER_CONFIG`. Fails if the directory
/// already exists rather than overwriting another run's credentials.
pub fn write_auth_config(scratch_dir: &Path, credentials: &[RegistryCredential]) -> Result<PathBuf> {
    let dir = scratch_dir.join(format!(
        "docker_config_{}",
        chrono::Utc::now().timestamp_millis()
    ));

    fs::create_dir_all(scratch_dir)?;
    fs::create_dir(&dir)?;
    fs::write(dir.join(AUTH_CONFIG_FILE), render_auth_config(credentials)?)?;

    debug!(dir = %dir.display(), registries = credentials.len(), "wrote registry auth config");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_credential() {
        let cred = RegistryCredential::new(DOCKER_HUB_HOST, "user", "pass");
        assert_eq!(cred.encoded(), "dXNlcjpwYXNz");
    }

    #[test]
    fn test_render_one_entry_per_host() {
        let creds = vec![
            RegistryCredential::new(DOCKER_HUB_HOST, "user", "pass"),
            RegistryCredential::new("acme.azurecr.io", "acr", "secret"),
        ];
        let json: serde_json::Value =
            serde_json::from_str(&render_auth_config(&creds).unwrap()).unwrap();

        assert_eq!(json["auths"][DOCKER_HUB_HOST]["auth"], "dXNlcjpwYXNz");
        assert_eq!(
            json["auths"]["acme.azurecr.io"]["auth"],
            STANDARD.encode("acr:secret")
        );
        assert_eq!(json["auths"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_debug_hides_password() {
        let cred = RegistryCredential::new(DOCKER_HUB_HOST, "user", "hunter2");
        assert!(!format!("{:?}", cred).contains("hunter2"));
    }

    #[test]
    fn test_render_empty_bundle() {
        assert_eq!(render_auth_config(&[]).unwrap(), r#"{"auths":{}}"#);
    }

    #[test]
    fn test_write_auth_config() {
        let scratch = tempfile::tempdir().unwrap();
        let creds = vec![RegistryCredential::new(DOCKER_HUB_HOST, "user", "pass")];

        let dir = write_auth_config(scratch.path(), &creds).unwrap();
        assert!(dir.starts_with(scratch.path()));
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("docker_config_"));

        let written = fs::read_to_string(dir.join("config.json")).unwrap();
        assert!(written.contains("dXNlcjpwYXNz"));
    }

    #[test]
    fn test_write_creates_missing_scratch_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let nested = scratch.path().join("runner").join("temp");

        let dir = write_auth_config(&nested, &[]).unwrap();
        assert!(dir.join("config.json").exists());
    }
}
