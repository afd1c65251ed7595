use crate::error::{PublishError, Result};
use regex::Regex;
use std::sync::OnceLock;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Branch names that publish under the bare `latest` alias
pub const DEFAULT_BRANCHES: [&str; 2] = ["master", "main"];

fn non_word_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid branch pattern"))
}

/// Replace every run of non-word characters with a single `-`.
///
/// Only ASCII letters, digits and `_` count as word characters, so the
/// result is safe to embed in both tag names and image tags.
pub fn normalize_branch(name: &str) -> String {
    non_word_runs().replace_all(name, "-").into_owned()
}

/// Represents the branch being published with its derived names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    /// Branch name with `refs/heads/` stripped (e.g. `feature/foo`)
    pub name: String,
    /// Normalized branch name (e.g. `feature-foo`)
    pub normalized: String,
    pub is_default: bool,
}

impl BranchContext {
    /// Create a branch context from a plain branch name
    pub fn new<S: AsRef<str>>(name: impl Into<String>, default_branches: &[S]) -> Self {
        let name = name.into();
        let normalized = normalize_branch(&name);
        let is_default = default_branches
            .iter()
            .any(|branch| branch.as_ref() == normalized);

        BranchContext {
            name,
            normalized,
            is_default,
        }
    }

    /// Create a branch context from a fully qualified ref such as
    /// `refs/heads/main`.
    ///
    /// Fails when the ref is not a branch ref, which is the case for tag
    /// pushes and pull request merges.
    pub fn from_ref<S: AsRef<str>>(git_ref: &str, default_branches: &[S]) -> Result<Self> {
        let name = git_ref.strip_prefix(BRANCH_REF_PREFIX).ok_or_else(|| {
            PublishError::config(format!(
                "No branch given: '{}' is not a branch ref",
                git_ref
            ))
        })?;

        if name.is_empty() {
            return Err(PublishError::config(format!(
                "No branch given: '{}' has an empty branch name",
                git_ref
            )));
        }

        Ok(Self::new(name, default_branches))
    }

    /// The mutable image tag repointed on every publish
    pub fn floating_alias(&self) -> String {
        if self.is_default {
            "latest".to_string()
        } else {
            format!("{}-latest", self.normalized)
        }
    }

    /// The image tag carrying a version (e.g. `develop-7`)
    pub fn image_tag(&self, version: u64) -> String {
        format!("{}-{}", self.normalized, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_branch() {
        let branch = BranchContext::new("main", &DEFAULT_BRANCHES);
        assert!(branch.is_default);
        assert_eq!(branch.floating_alias(), "latest");
    }

    #[test]
    fn test_master_branch() {
        let branch = BranchContext::new("master", &DEFAULT_BRANCHES);
        assert!(branch.is_default);
    }

    #[test]
    fn test_develop_branch() {
        let branch = BranchContext::new("develop", &DEFAULT_BRANCHES);
        assert!(!branch.is_default);
        assert_eq!(branch.floating_alias(), "develop-latest");
    }

    #[test]
    fn test_normalize_replaces_every_run() {
        assert_eq!(normalize_branch("feature/foo"), "feature-foo");
        assert_eq!(normalize_branch("feature/foo bar"), "feature-foo-bar");
        assert_eq!(normalize_branch("fix//a..b"), "fix-a-b");
        assert_eq!(normalize_branch("snake_case"), "snake_case");
    }

    #[test]
    fn test_normalize_non_ascii() {
        assert_eq!(normalize_branch("café/ß"), "caf-");
    }

    #[test]
    fn test_from_ref() {
        let branch = BranchContext::from_ref("refs/heads/feature/login", &DEFAULT_BRANCHES).unwrap();
        assert_eq!(branch.name, "feature/login");
        assert_eq!(branch.normalized, "feature-login");
        assert_eq!(branch.image_tag(3), "feature-login-3");
    }

    #[test]
    fn test_from_ref_rejects_non_branch_refs() {
        assert!(BranchContext::from_ref("refs/tags/v1", &DEFAULT_BRANCHES).is_err());
        assert!(BranchContext::from_ref("refs/pull/1/merge", &DEFAULT_BRANCHES).is_err());
        assert!(BranchContext::from_ref("", &DEFAULT_BRANCHES).is_err());
        assert!(BranchContext::from_ref("refs/heads/", &DEFAULT_BRANCHES).is_err());
    }

    #[test]
    fn test_default_detection_uses_normalized_name() {
        let custom = ["trunk".to_string()];
        assert!(BranchContext::new("trunk", &custom).is_default);
        assert!(!BranchContext::new("main", &custom).is_default);
    }
}
