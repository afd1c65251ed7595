//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic for progress messages.
//! Colors come from `console`, which drops them when stdout is not a terminal.

use crate::actions::{StepOutputs, warning_annotation};
use crate::boundary::BoundaryWarning;
use crate::resolver::VersionResolution;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
///
/// Printed as a runner warning annotation so it shows up on the job summary.
///
/// # Arguments
/// * `warning` - The boundary warning to display
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    println!("{}", warning_annotation(&warning.to_string()));
}

/// Display the outcome of version resolution for a branch.
///
/// Shows either:
/// - If reused: the version the commit already carries
/// - If new: the version that was tagged and pushed
pub fn display_resolution(resolution: &VersionResolution, branch: &str) {
    if resolution.next_version == resolution.current_version {
        display_status(&format!(
            "Current commit is already tagged with version {}",
            resolution.current_version
        ));
    } else {
        display_status(&format!(
            "Next version on branch {} is {}",
            branch, resolution.next_version
        ));
    }

    if resolution.tag_created {
        display_success(&format!("Created and pushed tag {}", resolution.git_tag));
    }
}

/// Display the step outputs that were set.
pub fn display_outputs(outputs: &StepOutputs) {
    println!("\n{}", style("Outputs:").bold());
    for (name, value) in outputs.pairs() {
        println!("  {}: {}", name, style(value).cyan());
    }
}
