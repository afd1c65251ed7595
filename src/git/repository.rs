use crate::error::{PublishError, Result};
use git2::{Oid, Repository as Git2Repo};
use std::cell::RefCell;
use std::path::Path;
use tracing::debug;

const TAG_REFSPEC: &str = "+refs/tags/*:refs/tags/*";
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    token: Option<String>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo, token: None })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo, token: None }
    }

    /// Authenticate HTTPS remotes with an access token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn peel_to_commit(&self, tag_name: &str) -> Result<Oid> {
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{}", tag_name))
            .map_err(|e| tag_lookup_error(tag_name, e))?;

        let commit = reference
            .peel_to_commit()
            .map_err(|e| PublishError::tag(format!("Cannot peel tag '{}': {}", tag_name, e)))?;

        Ok(commit.id())
    }

    /// Credentials callback shared by fetch and push.
    ///
    /// Tries the access token first, then the git credential helper, then an
    /// SSH agent. libgit2 re-invokes the callback after each rejection, so the
    /// number of attempts is capped.
    fn remote_callbacks(&self) -> git2::RemoteCallbacks<'_> {
        let mut callbacks = git2::RemoteCallbacks::new();
        let token = self.token.clone();
        let config = self.repo.config().ok();
        let mut attempts = 0;

        callbacks.credentials(move |url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }

            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                if let (1, Some(token)) = (attempts, token.as_deref()) {
                    return git2::Cred::userpass_plaintext("x-access-token", token);
                }
                if let Some(config) = config.as_ref() {
                    if let Ok(cred) = git2::Cred::credential_helper(config, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }

            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });

        callbacks
    }
}

fn tag_lookup_error(tag_name: &str, e: git2::Error) -> PublishError {
    if e.code() == git2::ErrorCode::NotFound {
        PublishError::tag(format!("Tag '{}' does not exist", tag_name))
    } else {
        PublishError::tag(format!("Cannot find tag '{}': {}", tag_name, e))
    }
}

impl super::Repository for Git2Repository {
    fn fetch_tags(&self, remote: &str) -> Result<()> {
        debug!(remote, "fetching tags");
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| PublishError::remote(format!("Cannot find remote '{}': {}", remote, e)))?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(self.remote_callbacks());

        remote_handle
            .fetch(&[TAG_REFSPEC], Some(&mut fetch_options), None)
            .map_err(|e| PublishError::remote(format!("Fetch from '{}' failed: {}", remote, e)))?;

        Ok(())
    }

    fn list_tags(&self, pattern: &str, points_at: Option<&str>) -> Result<Vec<String>> {
        debug!(pattern, points_at, "listing tags");
        let target = points_at
            .map(|commit| {
                Oid::from_str(commit).map_err(|e| {
                    PublishError::config(format!("Invalid commit id '{}': {}", commit, e))
                })
            })
            .transpose()?;

        let names = self.repo.tag_names(Some(pattern))?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            if let Some(target) = target {
                // Tags that do not resolve to a commit can never point at one
                match self.peel_to_commit(name) {
                    Ok(oid) if oid == target => {}
                    _ => continue,
                }
            }
            tags.push(name.to_string());
        }

        Ok(tags)
    }

    fn tag_commit(&self, tag_name: &str) -> Result<String> {
        debug!(tag_name, "resolving tag commit");
        Ok(self.peel_to_commit(tag_name)?.to_string())
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<()> {
        debug!(name, commit, "creating tag");
        let oid = Oid::from_str(commit)
            .map_err(|e| PublishError::config(format!("Invalid commit id '{}': {}", commit, e)))?;

        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| PublishError::tag(format!("Cannot find commit {}: {}", commit, e)))?;

        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| PublishError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()> {
        debug!(remote, count = tag_names.len(), "pushing tags");
        if tag_names.is_empty() {
            return Ok(());
        }

        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| PublishError::remote(format!("Cannot find remote '{}': {}", remote, e)))?;

        let refspecs: Vec<String> = tag_names
            .iter()
            .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
            .collect();
        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();

        let rejected = RefCell::new(Vec::new());
        {
            let mut callbacks = self.remote_callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejected
                        .borrow_mut()
                        .push(format!("{} ({})", refname, status));
                }
                Ok(())
            });

            let mut push_options = git2::PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote_handle
                .push(&refspec_strs, Some(&mut push_options))
                .map_err(|e| {
                    if e.class() == git2::ErrorClass::Net {
                        PublishError::remote(format!("Network error during push: {}", e))
                    } else {
                        PublishError::remote(format!("Push to '{}' failed: {}", remote, e))
                    }
                })?;
        }

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(PublishError::remote(format!(
                "Remote '{}' rejected {}",
                remote,
                rejected.join(", ")
            )));
        }

        Ok(())
    }
}
