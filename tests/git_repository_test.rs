// tests/git_repository_test.rs
use git2::{Oid, Repository as Git2Repo, Signature};
use std::path::Path;
use tempfile::TempDir;
use version_publish::domain::{BranchContext, VersionTagPrefix};
use version_publish::git::{Git2Repository, Repository};
use version_publish::resolver::VersionResolver;

fn commit(repo: &Git2Repo, message: &str) -> Oid {
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// A working repository with an `origin` remote pointing at a bare repository
fn repo_with_remote() -> (TempDir, TempDir, Git2Repo) {
    let work_dir = TempDir::new().unwrap();
    let remote_dir = TempDir::new().unwrap();
    Git2Repo::init_bare(remote_dir.path()).unwrap();

    let repo = Git2Repo::init(work_dir.path()).unwrap();
    repo.remote("origin", remote_dir.path().to_str().unwrap())
        .unwrap();
    (work_dir, remote_dir, repo)
}

fn open(path: &Path) -> Git2Repository {
    Git2Repository::open(path).unwrap()
}

#[test]
fn test_list_tags_by_pattern_and_commit() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    let first = commit(&raw, "first");
    let second = commit(&raw, "second");

    let repo = open(work_dir.path());
    repo.create_tag("VERSION-MAIN-1", &first.to_string()).unwrap();
    repo.create_tag("VERSION-MAIN-2", &second.to_string()).unwrap();
    repo.create_tag("VERSION-DEVELOP-1", &second.to_string())
        .unwrap();

    let mut all = repo.list_tags("VERSION-MAIN-*", None).unwrap();
    all.sort();
    assert_eq!(all, vec!["VERSION-MAIN-1", "VERSION-MAIN-2"]);

    let at_second = repo
        .list_tags("VERSION-MAIN-*", Some(&second.to_string()))
        .unwrap();
    assert_eq!(at_second, vec!["VERSION-MAIN-2"]);

    assert_eq!(
        repo.tag_commit("VERSION-MAIN-1").unwrap(),
        first.to_string()
    );
}

#[test]
fn test_annotated_tags_peel_to_commit() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    let head = commit(&raw, "first");
    let object = raw.find_object(head, None).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    raw.tag("VERSION-MAIN-5", &object, &sig, "release 5", false)
        .unwrap();

    let repo = open(work_dir.path());
    assert_eq!(repo.tag_commit("VERSION-MAIN-5").unwrap(), head.to_string());
    assert_eq!(
        repo.list_tags("VERSION-MAIN-*", Some(&head.to_string()))
            .unwrap(),
        vec!["VERSION-MAIN-5"]
    );
}

#[test]
fn test_missing_tag_is_an_error() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    commit(&raw, "first");

    let repo = open(work_dir.path());
    let err = repo.tag_commit("VERSION-MAIN-1").unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_create_tag_refuses_existing_name() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    let first = commit(&raw, "first");
    let second = commit(&raw, "second");

    let repo = open(work_dir.path());
    repo.create_tag("VERSION-MAIN-1", &first.to_string()).unwrap();
    assert!(repo
        .create_tag("VERSION-MAIN-1", &second.to_string())
        .is_err());
    assert_eq!(
        repo.tag_commit("VERSION-MAIN-1").unwrap(),
        first.to_string()
    );
}

#[test]
fn test_invalid_commit_id_is_rejected() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    commit(&raw, "first");

    let repo = open(work_dir.path());
    assert!(repo.list_tags("*", Some("not-a-commit")).is_err());
    assert!(repo.create_tag("VERSION-MAIN-1", "not-a-commit").is_err());
}

#[test]
fn test_push_then_fetch_in_another_clone() {
    let (work_dir, remote_dir, raw) = repo_with_remote();
    let head = commit(&raw, "first");

    let repo = open(work_dir.path());
    repo.create_tag("VERSION-MAIN-1", &head.to_string()).unwrap();
    repo.push_tags("origin", &["VERSION-MAIN-1"]).unwrap();

    let bare = Git2Repo::open_bare(remote_dir.path()).unwrap();
    assert!(bare.find_reference("refs/tags/VERSION-MAIN-1").is_ok());

    let other_dir = TempDir::new().unwrap();
    let other_raw = Git2Repo::init(other_dir.path()).unwrap();
    other_raw
        .remote("origin", remote_dir.path().to_str().unwrap())
        .unwrap();

    let other = Git2Repository::from_git2(other_raw);
    assert!(other.list_tags("*", None).unwrap().is_empty());
    other.fetch_tags("origin").unwrap();
    assert_eq!(other.list_tags("*", None).unwrap(), vec!["VERSION-MAIN-1"]);
    assert_eq!(
        other.tag_commit("VERSION-MAIN-1").unwrap(),
        head.to_string()
    );
}

#[test]
fn test_unknown_remote_fails() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    commit(&raw, "first");

    let repo = open(work_dir.path());
    assert!(repo.fetch_tags("upstream").is_err());
}

#[test]
fn test_push_nothing_is_ok() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    commit(&raw, "first");

    let repo = open(work_dir.path());
    repo.push_tags("origin", &[]).unwrap();
}

#[test]
fn test_resolver_against_real_repository() {
    let (work_dir, remote_dir, raw) = repo_with_remote();
    let first = commit(&raw, "first");
    let second = commit(&raw, "second");

    let repo = open(work_dir.path());
    repo.create_tag("VERSION-FEATURE-X-9", &first.to_string())
        .unwrap();
    repo.create_tag("VERSION-FEATURE-X-10", &first.to_string())
        .unwrap();

    let branch = BranchContext::from_ref("refs/heads/feature/x", &["main"]).unwrap();
    let resolver = VersionResolver::new(&repo, VersionTagPrefix::for_branch(&branch), false);

    let resolution = resolver.run(&second.to_string(), "origin").unwrap();
    assert_eq!(resolution.current_version, 10);
    assert_eq!(resolution.next_version, 11);
    assert_eq!(resolution.git_tag, "VERSION-FEATURE-X-11");
    assert!(resolution.tag_created);

    let bare = Git2Repo::open_bare(remote_dir.path()).unwrap();
    let pushed = bare
        .find_reference("refs/tags/VERSION-FEATURE-X-11")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(pushed.id(), second);

    // Same commit again: nothing new
    let again = resolver.run(&second.to_string(), "origin").unwrap();
    assert_eq!(again.next_version, 11);
    assert!(!again.tag_created);
}

#[test]
fn test_commit_ids_compare_case_insensitively() {
    let (work_dir, _remote_dir, raw) = repo_with_remote();
    let head = commit(&raw, "first");

    let repo = open(work_dir.path());
    repo.create_tag("VERSION-MAIN-1", &head.to_string()).unwrap();

    let branch = BranchContext::from_ref("refs/heads/main", &["main"]).unwrap();
    let resolver = VersionResolver::new(&repo, VersionTagPrefix::for_branch(&branch), false);
    let state = resolver
        .resolve(&head.to_string().to_uppercase())
        .unwrap();
    assert_eq!(state.current_version, 1);
    assert!(!state.needs_new_tag());
}
