use crate::error::{PublishError, Result};
use std::fmt;
use std::str::FromStr;

/// A container image reference `<name>:<tag>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        ImageRef {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Which registry the image name is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrySelector {
    #[default]
    Default,
    Acr,
    AcrPublic,
}

impl RegistrySelector {
    pub fn name(&self) -> &'static str {
        match self {
            RegistrySelector::Default => "default",
            RegistrySelector::Acr => "acr",
            RegistrySelector::AcrPublic => "acr-public",
        }
    }

    /// Address `name` to a registry login host.
    ///
    /// The owner segment of `owner/repo` is dropped and replaced by the login
    /// host, so `acme/api` on `acme.azurecr.io` becomes `acme.azurecr.io/api`.
    pub fn rewrite_name(&self, name: &str, login_host: Option<&str>) -> Result<String> {
        if *self == RegistrySelector::Default {
            return Ok(name.to_string());
        }

        let login = login_host
            .filter(|host| !host.is_empty())
            .ok_or_else(|| {
                PublishError::config(format!(
                    "Registry '{}' selected but no login host is configured",
                    self.name()
                ))
            })?;

        let repository = match name.split_once('/') {
            Some((_owner, rest)) if !rest.is_empty() => rest,
            _ => name,
        };

        Ok(format!("{}/{}", login.trim_end_matches('/'), repository))
    }
}

impl FromStr for RegistrySelector {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "default" => Ok(RegistrySelector::Default),
            "acr" => Ok(RegistrySelector::Acr),
            "acr-public" => Ok(RegistrySelector::AcrPublic),
            other => Err(PublishError::config(format!(
                "Unknown registry '{}': expected 'acr' or 'acr-public'",
                other
            ))),
        }
    }
}
