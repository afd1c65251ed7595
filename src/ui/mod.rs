//! User interface module - human-facing progress output.
//!
//! Everything here is observability only; no function affects control flow.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_error, display_outputs, display_resolution, display_status,
    display_success,
};
