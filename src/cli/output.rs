// Output formatting utilities for CLI

use crate::models::{Pagination, Severity};

/// Output formatter for consistent CLI output
pub struct OutputFormatter;

impl OutputFormatter {
    /// Format a success message
    pub fn success(message: &str) -> String {
        format!("✅ {}", message)
    }

    /// Format an error message
    pub fn error(message: &str) -> String {
        format!("❌ Error: {}", message)
    }

    /// Format a warning message
    pub fn warning(message: &str) -> String {
        format!("⚠️  Warning: {}", message)
    }

    /// Format an info message
    pub fn info(message: &str) -> String {
        format!("ℹ️  {}", message)
    }

    /// Format a key-value pair for status display
    pub fn key_value(key: &str, value: &str, width: usize) -> String {
        format!("{:width$} : {}", key, value, width = width)
    }

    /// A status label prefixed with its severity marker
    pub fn badge(label: &str, severity: Severity) -> String {
        let marker = match severity {
            Severity::Success => "🟢",
            Severity::Info => "🔵",
            Severity::Warn => "🟡",
            Severity::Danger => "🔴",
            Severity::Secondary => "⚪",
        };
        format!("{} {}", marker, label)
    }

    /// `Página 2 de 3 (25 itens)`
    pub fn pagination(pagination: &Pagination) -> String {
        format!(
            "Página {} de {} ({} itens)",
            pagination.page,
            pagination.total_pages.max(1),
            pagination.total
        )
    }
}
