//! Centralized UI formatting and color utilities
//!
//! This module provides a unified interface for status colors, icons, and
//! formatting patterns used throughout the lintrun CLI.

use colored::{ColoredString, Colorize};

/// Check if quiet mode is enabled via environment variable
pub fn is_quiet() -> bool {
    std::env::var("LINTRUN_QUIET")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Returns a colored pass/fail icon: ✓ (green) or ✗ (red)
pub fn result_icon(success: bool) -> ColoredString {
    if success {
        "✓".green()
    } else {
        "✗".red()
    }
}

/// Warning marker: ⚠ (yellow)
pub fn warning_icon() -> ColoredString {
    "⚠".yellow()
}

/// Step header marker: → (cyan)
pub fn step_icon() -> ColoredString {
    "→".cyan()
}

/// Color scheme for status-related text output
pub mod colors {
    use colored::{ColoredString, Colorize};

    /// Green for success
    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    /// Yellow for warnings
    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    /// Red for errors/failures
    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    /// Cyan for identifiers (step names, paths)
    pub fn identifier(text: &str) -> ColoredString {
        text.cyan()
    }

    /// Dimmed for secondary text
    pub fn secondary(text: &str) -> ColoredString {
        text.dimmed()
    }

    /// Bold for headings
    pub fn heading(text: &str) -> ColoredString {
        text.bold()
    }
}

/// Common text formatting patterns
pub mod format {
    /// Format a duration in milliseconds: `850ms`, `4.2s`, `2m 5s`
    pub fn duration_ms(ms: u64) -> String {
        if ms < 1000 {
            format!("{}ms", ms)
        } else if ms < 60_000 {
            format!("{:.1}s", ms as f64 / 1000.0)
        } else {
            let secs = ms / 1000;
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }

    /// `1 violation`, `3 violations`
    pub fn plural(count: usize, singular: &str, plural: &str) -> String {
        if count == 1 {
            format!("{} {}", count, singular)
        } else {
            format!("{} {}", count, plural)
        }
    }

    /// Coverage percentage without a trailing `.0`
    pub fn percent(value: f64) -> String {
        if value.fract() == 0.0 {
            format!("{:.0}%", value)
        } else {
            format!("{:.2}%", value)
        }
    }

    /// Format a separator line for sections
    pub fn separator(width: usize) -> String {
        "─".repeat(width)
    }
}
