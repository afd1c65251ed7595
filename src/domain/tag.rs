use crate::domain::BranchContext;
use crate::error::{PublishError, Result};
use std::cmp::Ordering;

/// Branch-scoped namespace for version tags (e.g. `VERSION-DEVELOP-`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTagPrefix {
    prefix: String,
}

impl VersionTagPrefix {
    /// Build the prefix from the upper-cased normalized branch name
    pub fn for_branch(branch: &BranchContext) -> Self {
        VersionTagPrefix {
            prefix: format!("VERSION-{}-", branch.normalized.to_ascii_uppercase()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Glob matching every tag under this prefix
    pub fn glob(&self) -> String {
        format!("{}*", self.prefix)
    }

    /// Format a version tag
    /// Example: prefix="VERSION-MAIN-", version=4 -> "VERSION-MAIN-4"
    pub fn format(&self, version: u64) -> String {
        format!("{}{}", self.prefix, version)
    }

    /// Extract the embedded version number from a tag under this prefix.
    ///
    /// The remainder after the prefix must consist of ASCII digits only.
    pub fn parse(&self, tag: &str) -> Result<u64> {
        let remainder = tag.strip_prefix(&self.prefix).ok_or_else(|| {
            PublishError::version(format!(
                "Tag '{}' does not start with '{}'",
                tag, self.prefix
            ))
        })?;

        if remainder.is_empty() || !remainder.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PublishError::version(format!(
                "Tag '{}' has a malformed version suffix '{}'",
                tag, remainder
            )));
        }

        remainder.parse::<u64>().map_err(|e| {
            PublishError::version(format!("Tag '{}' has an invalid version: {}", tag, e))
        })
    }
}

impl std::fmt::Display for VersionTagPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prefix)
    }
}

fn split_runs(s: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let bytes = s.as_bytes();

    for i in 1..bytes.len() {
        if bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit() {
            runs.push(&s[start..i]);
            start = i;
        }
    }
    if start < s.len() {
        runs.push(&s[start..]);
    }
    runs
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Version-aware ordering of tag names.
///
/// Digit runs compare numerically and everything else compares bytewise, so
/// `VERSION-MAIN-10` sorts after `VERSION-MAIN-9`.
pub fn compare_version_names(a: &str, b: &str) -> Ordering {
    let runs_a = split_runs(a);
    let runs_b = split_runs(b);

    for (ra, rb) in runs_a.iter().zip(runs_b.iter()) {
        let both_numeric = ra.as_bytes()[0].is_ascii_digit() && rb.as_bytes()[0].is_ascii_digit();
        let ordering = if both_numeric {
            compare_digits(ra, rb)
        } else {
            ra.cmp(rb)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    runs_a.len().cmp(&runs_b.len()).then_with(|| a.cmp(b))
}

/// Sort tag names highest version first
pub fn sort_descending(tags: &mut [String]) {
    tags.sort_by(|a, b| compare_version_names(b, a));
}
