//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the handful of
//! version-control primitives the resolver needs, allowing for a real
//! implementation backed by `git2` and a mock implementation for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation with a simulated remote
//!
//! # Usage
//!
//! Most code should depend on the [Repository] trait rather than concrete
//! implementations to enable easy testing.
//!
//! ```rust
//! # use version_publish::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
//! repo.fetch_tags("origin")?;
//! let tags = repo.list_tags("VERSION-MAIN-*", None)?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Common git operation trait for abstraction
///
/// Commits are identified by their full hexadecimal object id, the same
/// form the CI runner exposes for the triggering commit.
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations should map
/// underlying errors (like `git2::Error`) to the appropriate
/// [crate::error::PublishError] variants. Every failure is fatal to the run.
///
/// ## Implementations
///
/// - [Git2Repository](repository::Git2Repository): Real Git implementation using the `git2` crate
/// - [MockRepository](mock::MockRepository): Test implementation for mocking Git operations
pub trait Repository {
    /// Fetch all tags from a remote
    ///
    /// Local tags are overwritten by their remote counterparts so that tag
    /// history reflects what other pipeline runs already published.
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g., "origin")
    ///
    /// # Returns
    /// * `Ok(())` - Success
    /// * `Err` - If the remote doesn't exist or the fetch fails
    fn fetch_tags(&self, remote: &str) -> Result<()>;

    /// List tag names matching a glob
    ///
    /// The result order is unspecified; callers sort it themselves.
    ///
    /// # Arguments
    /// * `pattern` - Glob such as `VERSION-MAIN-*` or an exact tag name
    /// * `points_at` - When given, keep only tags whose commit is this one
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Matching tag names (possibly empty)
    /// * `Err` - If there's a Git error
    ///
    /// # Example
    /// ```rust
    /// # use version_publish::git::Repository;
    /// # fn example<R: Repository>(repo: &R, head: &str) -> Result<(), Box<dyn std::error::Error>> {
    /// let at_head = repo.list_tags("VERSION-MAIN-*", Some(head))?;
    /// for tag in at_head {
    ///     println!("HEAD is tagged {}", tag);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_tags(&self, pattern: &str, points_at: Option<&str>) -> Result<Vec<String>>;

    /// Resolve a tag to the commit it points at
    ///
    /// Annotated tags are peeled to their target commit.
    ///
    /// # Returns
    /// * `Ok(String)` - Full commit id
    /// * `Err` - If the tag doesn't exist or does not point at a commit
    fn tag_commit(&self, tag_name: &str) -> Result<String>;

    /// Create a lightweight tag at the given commit
    ///
    /// # Arguments
    /// * `name` - Name for the new tag
    /// * `commit` - Full commit id to tag
    ///
    /// # Returns
    /// * `Ok(())` - Success
    /// * `Err` - If the tag already exists, the commit doesn't exist, or Git error occurs
    fn create_tag(&self, name: &str, commit: &str) -> Result<()>;

    /// Push tags to remote
    ///
    /// A tag the remote refuses (for example because another run already
    /// created the same name at a different commit) is an error.
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g., "origin")
    /// * `tag_names` - Slice of tag names to push
    ///
    /// # Example
    /// ```rust
    /// # use version_publish::git::Repository;
    /// # fn example<R: Repository>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
    /// repo.push_tags("origin", &["VERSION-MAIN-4"])?;
    /// # Ok(())
    /// # }
    /// ```
    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()>;
}

/// Match a tag name against a glob supporting `*` wildcards
pub fn glob_matches(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };

    let remaining: Vec<&str> = parts.collect();
    let Some((last, middle)) = remaining.split_last() else {
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
