//! Command implementations.

/// Batch check command handler.
pub mod check;
