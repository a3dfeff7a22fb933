//! Output utilities for CLI commands
//!
//! This module provides terminal output helpers including spinners
//! with elapsed time display for remote operations and troubleshooting
//! hints for failed node operations.

pub mod errors;
pub mod spinner;

pub use errors::show_node_error;
pub use spinner::CommandSpinner;
