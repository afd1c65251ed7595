//! Version resolution from branch-scoped tag history
//!
//! The tag list in the repository is the only durable record of versions.
//! Every run recomputes its state from it:
//!
//! 1. Tags under the branch prefix that point at the current commit win.
//! 2. Otherwise the highest tag under the prefix (anywhere) is the current
//!    version, and its commit is looked up.
//! 3. With no tag at all the current version is `0`.
//!
//! The current commit reuses its version unless `always_increment` is set;
//! every other case moves to `current + 1` and writes a new tag.
//!
//! # Write guard
//!
//! [VersionResolver::ensure_tag] re-reads the tag namespace right before
//! writing: if `<prefix><next>` already points at the current commit, no tag
//! is created and nothing is pushed. This is the only idempotency mechanism
//! across retried runs. Two concurrent runs that both compute the same next
//! version are reconciled by the remote refusing the second push, which
//! surfaces as a fatal error.

use crate::domain::tag::sort_descending;
use crate::domain::VersionTagPrefix;
use crate::error::{PublishError, Result};
use crate::git::Repository;
use tracing::{debug, info};

/// Versions derived from tag history for one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedState {
    /// Highest version found (0 when the branch has no tags yet)
    pub current_version: u64,
    /// Commit carrying `current_version`, if any tag was found
    pub tagged_commit: Option<String>,
    pub next_version: u64,
}

impl ResolvedState {
    /// Whether `next_version` still needs a tag
    pub fn needs_new_tag(&self) -> bool {
        self.next_version != self.current_version
    }
}

/// Final result of version resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionResolution {
    pub current_version: u64,
    pub next_version: u64,
    /// Fully qualified version tag (e.g. `VERSION-MAIN-4`)
    pub git_tag: String,
    /// Whether this run created and pushed `git_tag`
    pub tag_created: bool,
}

/// Decides the version of the current commit and writes its tag
pub struct VersionResolver<'a, R: Repository> {
    repo: &'a R,
    prefix: VersionTagPrefix,
    always_increment: bool,
}

impl<'a, R: Repository> VersionResolver<'a, R> {
    pub fn new(repo: &'a R, prefix: VersionTagPrefix, always_increment: bool) -> Self {
        VersionResolver {
            repo,
            prefix,
            always_increment,
        }
    }

    /// Highest-versioned tag under the prefix, optionally restricted to one commit
    fn highest_tag(&self, points_at: Option<&str>) -> Result<Option<String>> {
        let mut tags = self.repo.list_tags(&self.prefix.glob(), points_at)?;
        sort_descending(&mut tags);
        Ok(tags.into_iter().next())
    }

    /// Compute current and next version for `current_commit` without writing anything
    pub fn resolve(&self, current_commit: &str) -> Result<ResolvedState> {
        let (current_version, tagged_commit) =
            if let Some(tag) = self.highest_tag(Some(current_commit))? {
                debug!(tag = %tag, "current commit already carries a version tag");
                (self.prefix.parse(&tag)?, Some(current_commit.to_string()))
            } else if let Some(tag) = self.highest_tag(None)? {
                let version = self.prefix.parse(&tag)?;
                let commit = self.repo.tag_commit(&tag)?;
                debug!(tag = %tag, commit = %commit, "latest version tag on branch");
                (version, Some(commit))
            } else {
                debug!(prefix = %self.prefix, "no version tag on branch yet");
                (0, None)
            };

        let equal_commits = tagged_commit
            .as_deref()
            .is_some_and(|commit| commit.eq_ignore_ascii_case(current_commit));

        let next_version = if equal_commits && !self.always_increment {
            current_version
        } else {
            current_version.checked_add(1).ok_or_else(|| {
                PublishError::version(format!(
                    "Version {} under '{}' cannot be incremented",
                    current_version, self.prefix
                ))
            })?
        };

        info!(
            current_version,
            next_version,
            always_increment = self.always_increment,
            equal_commits,
            "resolved version"
        );

        Ok(ResolvedState {
            current_version,
            tagged_commit,
            next_version,
        })
    }

    /// Create and push the tag for `state.next_version` when it is missing.
    ///
    /// Pushes every local tag to `remote`, so tags left behind by a run that
    /// failed after creating but before pushing are published too.
    pub fn ensure_tag(
        &self,
        state: &ResolvedState,
        current_commit: &str,
        remote: &str,
    ) -> Result<VersionResolution> {
        let git_tag = self.prefix.format(state.next_version);

        let tag_created = if !state.needs_new_tag() {
            false
        } else if !self
            .repo
            .list_tags(&git_tag, Some(current_commit))?
            .is_empty()
        {
            info!(tag = %git_tag, "tag already points at current commit, skipping creation");
            false
        } else {
            self.repo.create_tag(&git_tag, current_commit)?;
            let all_tags = self.repo.list_tags("*", None)?;
            let names: Vec<&str> = all_tags.iter().map(String::as_str).collect();
            self.repo.push_tags(remote, &names)?;
            info!(tag = %git_tag, remote, "created and pushed version tag");
            true
        };

        Ok(VersionResolution {
            current_version: state.current_version,
            next_version: state.next_version,
            git_tag,
            tag_created,
        })
    }

    /// Resolve and tag in one step
    pub fn run(&self, current_commit: &str, remote: &str) -> Result<VersionResolution> {
        let state = self.resolve(current_commit)?;
        self.ensure_tag(&state, current_commit, remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchContext, DEFAULT_BRANCHES};
    use crate::git::MockRepository;

    fn prefix(branch: &str) -> VersionTagPrefix {
        VersionTagPrefix::for_branch(&BranchContext::new(branch, &DEFAULT_BRANCHES))
    }

    #[test]
    fn test_first_version() {
        let repo = MockRepository::new();
        let resolver = VersionResolver::new(&repo, prefix("main"), false);

        let state = resolver.resolve("c1").unwrap();
        assert_eq!(state.current_version, 0);
        assert_eq!(state.tagged_commit, None);
        assert_eq!(state.next_version, 1);
        assert!(state.needs_new_tag());
    }

    #[test]
    fn test_tag_at_commit_takes_precedence() {
        let mut repo = MockRepository::new();
        repo.add_tag("VERSION-MAIN-2", "c1");
        repo.add_tag("VERSION-MAIN-7", "c9");
        let resolver = VersionResolver::new(&repo, prefix("main"), false);

        let state = resolver.resolve("c1").unwrap();
        assert_eq!(state.current_version, 2);
        assert_eq!(state.next_version, 2);
        assert_eq!(state.tagged_commit.as_deref(), Some("c1"));
    }

    #[test]
    fn test_commit_comparison_ignores_case() {
        let mut repo = MockRepository::new();
        repo.add_tag("VERSION-MAIN-3", "abcdef");
        let resolver = VersionResolver::new(&repo, prefix("main"), false);

        // The tag matches via tag_commit rather than points_at here
        let state = resolver.resolve("ABCDEF").unwrap();
        assert_eq!(state.next_version, 3);
    }

    #[test]
    fn test_malformed_top_tag_is_fatal() {
        let mut repo = MockRepository::new();
        repo.add_tag("VERSION-MAIN-3", "c1");
        repo.add_tag("VERSION-MAIN-x", "c2");
        let resolver = VersionResolver::new(&repo, prefix("main"), false);

        let err = resolver.resolve("c3").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_reuse_writes_nothing() {
        let mut repo = MockRepository::new();
        repo.add_tag("VERSION-MAIN-5", "c1");
        let resolver = VersionResolver::new(&repo, prefix("main"), false);

        let resolution = resolver.run("c1", "origin").unwrap();
        assert_eq!(resolution.next_version, 5);
        assert_eq!(resolution.git_tag, "VERSION-MAIN-5");
        assert!(!resolution.tag_created);
        assert!(repo.created_tags().is_empty());
        assert!(repo.pushed_tags().is_empty());
    }

    #[test]
    fn test_guard_skips_existing_tag_at_commit() {
        let mut repo = MockRepository::new();
        repo.add_tag("VERSION-MAIN-2", "c1");
        let resolver = VersionResolver::new(&repo, prefix("main"), false);

        // State computed before another attempt tagged this commit
        let stale = ResolvedState {
            current_version: 1,
            tagged_commit: Some("c0".to_string()),
            next_version: 2,
        };
        let resolution = resolver.ensure_tag(&stale, "c1", "origin").unwrap();
        assert!(!resolution.tag_created);
        assert!(repo.created_tags().is_empty());
    }

    #[test]
    fn test_tag_name_taken_by_other_commit_fails() {
        let mut repo = MockRepository::new();
        repo.add_tag("VERSION-MAIN-2", "c0");
        let resolver = VersionResolver::new(&repo, prefix("main"), false);

        let stale = ResolvedState {
            current_version: 1,
            tagged_commit: Some("c0".to_string()),
            next_version: 2,
        };
        assert!(resolver.ensure_tag(&stale, "c1", "origin").is_err());
    }
}
