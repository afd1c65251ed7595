//! Domain logic - pure naming rules independent of git and the container engine

pub mod branch;
pub mod image;
pub mod tag;

pub use branch::{normalize_branch, BranchContext, DEFAULT_BRANCHES};
pub use image::{ImageRef, RegistrySelector};
pub use tag::VersionTagPrefix;
