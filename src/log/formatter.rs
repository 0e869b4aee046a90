// Log message formatting

use crate::log::LogLevel;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// Formatted (000.000.000-00) or bare (00000000000) CPF
static CPF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{3})\.?(\d{3})\.?(\d{3})-?(\d{2})\b").expect("valid CPF pattern")
});

pub struct LogFormatter;

impl LogFormatter {
    /// Format a log message with timestamp, level, module, and message
    pub fn format_with_timestamp(level: LogLevel, module: &str, message: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        format!(
            "[{}] {}",
            timestamp,
            Self::format(level, module, message)
        )
    }

    /// Format a log message without timestamp
    pub fn format(level: LogLevel, module: &str, message: &str) -> String {
        let sanitized_message = Self::mask_cpfs(message);
        format!("[{}] [{}] {}", level.as_str(), module, sanitized_message)
    }

    /// Masks taxpayer ids, keeping the first three and the last two digits
    fn mask_cpfs(message: &str) -> String {
        CPF_PATTERN
            .replace_all(message, |caps: &Captures| {
                format!("{}.***.***-{}", &caps[1], &caps[4])
            })
            .into_owned()
    }
}
