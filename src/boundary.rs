use std::fmt;

/// Warnings that occur at the edges of a publish run.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The tag appeared at the commit between resolving and writing it
    TagAlreadyPresent { tag: String, commit: String },
    /// Tags-only mode produced a tag with no image behind it
    TagsOnlyWithoutImage { tag: String },
    /// A registry in the credentials bundle is missing its host or login
    MissingCredentials { registry: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::TagAlreadyPresent { tag, commit } => {
                let short_hash = if commit.len() > 7 {
                    &commit[..7]
                } else {
                    commit.as_str()
                };
                write!(
                    f,
                    "Commit {} was already tagged '{}' by an earlier attempt, not tagging again",
                    short_hash, tag
                )
            }
            BoundaryWarning::TagsOnlyWithoutImage { tag } => {
                write!(
                    f,
                    "Created tag '{}' in tags-only mode; no image has been published for it",
                    tag
                )
            }
            BoundaryWarning::MissingCredentials { registry } => {
                write!(
                    f,
                    "No credentials configured for registry '{}', skipping its login",
                    registry
                )
            }
        }
    }
}
