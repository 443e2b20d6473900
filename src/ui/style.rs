//! Consistent styling utilities for CLI output.
//!
//! Provides color and formatting helpers using owo-colors. Every helper
//! returns plain text when colors are disabled (see [`crate::output`]).

use owo_colors::OwoColorize;
use std::fmt::Display;

use crate::output;

/// Styles for different semantic elements.
pub struct Style;

impl Style {
    /// Style for section headers (e.g., "=== Results ===")
    pub fn header<T: Display>(text: T) -> String {
        paint(text, |t| format!("{}", t.bold()))
    }

    /// Style for labels/keys (e.g., "Correct:", "Output:")
    pub fn label<T: Display>(text: T) -> String {
        paint(text, |t| format!("{}", t.dimmed()))
    }

    /// Style for primary values (e.g., paths, model names)
    pub fn value<T: Display>(text: T) -> String {
        paint(text, |t| format!("{}", t.cyan()))
    }

    /// Style for success messages
    pub fn success<T: Display>(text: T) -> String {
        paint(text, |t| format!("{}", t.green()))
    }

    /// Style for error messages
    pub fn error<T: Display>(text: T) -> String {
        paint(text, |t| format!("{}", t.red().bold()))
    }

    /// Style for warning messages
    pub fn warning<T: Display>(text: T) -> String {
        paint(text, |t| format!("{}", t.yellow()))
    }

    /// Style for hints/help text
    pub fn hint<T: Display>(text: T) -> String {
        paint(text, |t| format!("{}", t.dimmed().italic()))
    }
}

fn paint<T: Display>(text: T, styled: impl FnOnce(&str) -> String) -> String {
    let plain = text.to_string();
    if output::is_no_color() {
        plain
    } else {
        styled(&plain)
    }
}
