use version_publish::boundary::BoundaryWarning;
use version_publish::ui;

// ============================================================================
// BoundaryWarning Display Tests
// ============================================================================

#[test]
fn test_boundary_warning_tag_already_present_display() {
    let warning = BoundaryWarning::TagAlreadyPresent {
        tag: "VERSION-MAIN-4".to_string(),
        commit: "abc1234def5678".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("VERSION-MAIN-4"),
        "Message should contain the tag, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("abc1234") && !display_msg.contains("abc1234d"),
        "Message should contain shortened commit hash 'abc1234', got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_short_commit_is_kept() {
    let warning = BoundaryWarning::TagAlreadyPresent {
        tag: "VERSION-MAIN-4".to_string(),
        commit: "abc".to_string(),
    };
    assert!(warning.to_string().contains("Commit abc "));
}

#[test]
fn test_boundary_warning_tags_only_display() {
    let warning = BoundaryWarning::TagsOnlyWithoutImage {
        tag: "VERSION-DEVELOP-9".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("tags-only"),
        "Message should mention tags-only mode, got: {}",
        display_msg
    );
    assert!(display_msg.contains("VERSION-DEVELOP-9"));
}

#[test]
fn test_boundary_warning_missing_credentials_display() {
    let warning = BoundaryWarning::MissingCredentials {
        registry: "acr-public".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("acr-public"),
        "Message should name the registry, got: {}",
        display_msg
    );
}

#[test]
fn test_display_boundary_warning_does_not_panic() {
    // Visual verification test - output is printed to stdout
    ui::display_boundary_warning(&BoundaryWarning::MissingCredentials {
        registry: "docker-hub".to_string(),
    });
}
