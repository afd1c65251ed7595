pub mod actions;
pub mod boundary;
pub mod cli;
pub mod config;
pub mod container;
pub mod domain;
pub mod error;
pub mod git;
pub mod publish;
pub mod registry;
pub mod resolver;
pub mod ui;

pub use error::{ErrorKind, PublishError, Result};
