// Input validators for dates, references, uploads and scheduling
//
// Validators return booleans or a `ValidationResult` carrying the message
// shown to the user; callers turn a failed result into `DashboardError::Validation`.

use crate::error::{DashboardError, Result};
use crate::reference::Reference;
use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::{Display, EnumIter, EnumString};

pub use crate::cpf::{is_valid_cpf, is_valid_cpf_input};

/// Upload size limit in megabytes when the config does not set one
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 10;

/// Extensions accepted for death-record uploads
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["csv", "txt", "xls", "xlsx"];

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("valid date regex"));
static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})/(\d{4})$").expect("valid reference regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Outcome of a validation that needs to explain itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }

    /// Converts a failed result into a validation error
    pub fn into_result(self) -> Result<()> {
        match self.valid {
            true => Ok(()),
            false => Err(DashboardError::Validation(self.message.unwrap_or_default())),
        }
    }
}

/// Recurrence of a scheduled crossing
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Unico,
    Diario,
    Mensal,
}

/// `DD/MM/YYYY`, years 1900..=2100, leap years honoured
pub fn is_valid_date(date: &str) -> bool {
    let Some(caps) = DATE_RE.captures(date) else {
        return false;
    };
    let (Ok(day), Ok(month), Ok(year)) = (
        caps[1].parse::<u32>(),
        caps[2].parse::<u32>(),
        caps[3].parse::<i32>(),
    ) else {
        return false;
    };

    (1900..=2100).contains(&year) && NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// `MM/YYYY`, years 2000..=2100
pub fn is_valid_reference(reference: &str) -> bool {
    let Some(caps) = REFERENCE_RE.captures(reference) else {
        return false;
    };
    let (Ok(month), Ok(year)) = (caps[1].parse::<u32>(), caps[2].parse::<i32>()) else {
        return false;
    };

    (1..=12).contains(&month) && (2000..=2100).contains(&year)
}

/// Checks a `MM/YYYY` period; either bound may be absent. Bounds are compared
/// chronologically and an equal start and end is allowed.
pub fn validate_reference_period(start: Option<&str>, end: Option<&str>) -> ValidationResult {
    let start = start.filter(|s| !s.is_empty());
    let end = end.filter(|s| !s.is_empty());

    if start.is_some_and(|s| !is_valid_reference(s)) {
        return ValidationResult::fail("Período inicial inválido. Use o formato MM/YYYY");
    }
    if end.is_some_and(|e| !is_valid_reference(e)) {
        return ValidationResult::fail("Período final inválido. Use o formato MM/YYYY");
    }

    if let (Some(s), Some(e)) = (start, end) {
        if let (Ok(s), Ok(e)) = (s.parse::<Reference>(), e.parse::<Reference>()) {
            if s > e {
                return ValidationResult::fail("A data inicial deve ser anterior à data final");
            }
        }
    }

    ValidationResult::ok()
}

pub fn is_valid_file_size(size_bytes: u64, max_mb: u64) -> bool {
    size_bytes <= max_mb.saturating_mul(1024 * 1024)
}

/// Case-insensitive extension check against `allowed`
pub fn is_valid_file_extension<S: AsRef<str>>(file_name: &str, allowed: &[S]) -> bool {
    let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(&ext))
}

fn extension_list<S: AsRef<str>>(allowed: &[S]) -> String {
    let upper: Vec<String> = allowed.iter().map(|e| e.as_ref().to_uppercase()).collect();
    match upper.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} ou {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

/// Upload check with the default limits
pub fn validate_file_upload(file_name: &str, size_bytes: u64) -> ValidationResult {
    validate_file_upload_with(
        file_name,
        size_bytes,
        DEFAULT_MAX_UPLOAD_MB,
        DEFAULT_ALLOWED_EXTENSIONS,
    )
}

pub fn validate_file_upload_with<S: AsRef<str>>(
    file_name: &str,
    size_bytes: u64,
    max_mb: u64,
    allowed: &[S],
) -> ValidationResult {
    if !is_valid_file_size(size_bytes, max_mb) {
        return ValidationResult::fail(format!(
            "Arquivo muito grande. Tamanho máximo: {}MB",
            max_mb
        ));
    }
    if !is_valid_file_extension(file_name, allowed) {
        return ValidationResult::fail(format!(
            "Formato não suportado. Use: {}",
            extension_list(allowed)
        ));
    }
    ValidationResult::ok()
}

pub fn is_not_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_percentage(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

pub fn is_future_date(date: &DateTime<Utc>) -> bool {
    *date > Utc::now()
}

/// Inclusive on both ends
pub fn is_date_in_range(date: &DateTime<Utc>, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
    date >= start && date <= end
}

pub fn validate_scheduling(date: &DateTime<Utc>, frequency: &str) -> ValidationResult {
    if !is_future_date(date) {
        return ValidationResult::fail("A data do agendamento deve ser futura");
    }
    if frequency.parse::<Frequency>().is_err() {
        return ValidationResult::fail("Frequência inválida");
    }
    ValidationResult::ok()
}
