// Utility modules for shared functionality
pub mod fs;
pub mod time;
pub use fs::{atomic_write, ensure_dir};
pub use time::{current_timestamp_millis, parse_iso};

/// Keeps only ASCII digits, dropping punctuation such as `.` and `-`
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}
