use crate::error::{PublishError, Result};
use crate::git::{glob_matches, Repository};
use std::cell::{Cell, RefCell};

/// Mock repository for testing without actual git operations
///
/// Holds a local tag namespace plus a simulated remote. Pushing a tag that
/// the remote already has at a different commit is rejected, the same way
/// a real remote refuses a non-fast-forward tag update.
pub struct MockRepository {
    tags: RefCell<Vec<(String, String)>>,
    remote_tags: RefCell<Vec<(String, String)>>,
    created: RefCell<Vec<String>>,
    pushes: RefCell<Vec<Vec<String>>>,
    fetches: Cell<usize>,
    fail_fetch: Cell<bool>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            tags: RefCell::new(Vec::new()),
            remote_tags: RefCell::new(Vec::new()),
            created: RefCell::new(Vec::new()),
            pushes: RefCell::new(Vec::new()),
            fetches: Cell::new(0),
            fail_fetch: Cell::new(false),
        }
    }

    /// Add a local tag pointing to a commit
    pub fn add_tag(&mut self, name: impl Into<String>, commit: impl Into<String>) {
        self.tags.get_mut().push((name.into(), commit.into()));
    }

    /// Add a tag that only exists on the remote until the next fetch
    pub fn add_remote_tag(&mut self, name: impl Into<String>, commit: impl Into<String>) {
        self.remote_tags.get_mut().push((name.into(), commit.into()));
    }

    /// Make every subsequent fetch fail
    pub fn fail_fetch(&mut self) {
        self.fail_fetch.set(true);
    }

    /// Tags created through [Repository::create_tag], in order
    pub fn created_tags(&self) -> Vec<String> {
        self.created.borrow().clone()
    }

    /// Tag names sent by each [Repository::push_tags] call
    pub fn pushed_tags(&self) -> Vec<Vec<String>> {
        self.pushes.borrow().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    /// Commit a remote tag points at, if the remote has it
    pub fn remote_tag_commit(&self, name: &str) -> Option<String> {
        self.remote_tags
            .borrow()
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, commit)| commit.clone())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn fetch_tags(&self, _remote: &str) -> Result<()> {
        if self.fail_fetch.get() {
            return Err(PublishError::remote("Fetch failed: connection refused"));
        }
        self.fetches.set(self.fetches.get() + 1);

        let remote = self.remote_tags.borrow();
        let mut local = self.tags.borrow_mut();
        for (name, commit) in remote.iter() {
            match local.iter_mut().find(|(tag, _)| tag == name) {
                Some(entry) => entry.1 = commit.clone(),
                None => local.push((name.clone(), commit.clone())),
            }
        }
        Ok(())
    }

    fn list_tags(&self, pattern: &str, points_at: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .tags
            .borrow()
            .iter()
            .filter(|(name, _)| glob_matches(pattern, name))
            .filter(|(_, commit)| points_at.map_or(true, |target| commit == target))
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn tag_commit(&self, tag_name: &str) -> Result<String> {
        self.tags
            .borrow()
            .iter()
            .find(|(name, _)| name == tag_name)
            .map(|(_, commit)| commit.clone())
            .ok_or_else(|| PublishError::tag(format!("Tag '{}' does not exist", tag_name)))
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<()> {
        let mut tags = self.tags.borrow_mut();
        if tags.iter().any(|(tag, _)| tag == name) {
            return Err(PublishError::tag(format!(
                "Cannot create tag '{}': reference already exists",
                name
            )));
        }
        tags.push((name.to_string(), commit.to_string()));
        self.created.borrow_mut().push(name.to_string());
        Ok(())
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()> {
        let local = self.tags.borrow();
        let mut remote_tags = self.remote_tags.borrow_mut();

        let mut rejected = Vec::new();
        for name in tag_names {
            let commit = local
                .iter()
                .find(|(tag, _)| tag == name)
                .map(|(_, commit)| commit.clone())
                .ok_or_else(|| PublishError::tag(format!("Tag '{}' does not exist", name)))?;

            match remote_tags.iter().find(|(tag, _)| tag == name) {
                Some((_, existing)) if *existing != commit => rejected.push(name.to_string()),
                Some(_) => {}
                None => remote_tags.push((name.to_string(), commit)),
            }
        }

        self.pushes
            .borrow_mut()
            .push(tag_names.iter().map(|s| s.to_string()).collect());

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(PublishError::remote(format!(
                "Remote '{}' rejected {}",
                remote,
                rejected.join(", ")
            )))
        }
    }
}
