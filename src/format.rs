// Presentation helpers: dates, numbers, labels and badge tones

use crate::models::{DataFile, Severity};
use crate::reference::Reference;
use crate::utils::parse_iso;
use chrono::{DateTime, Local, TimeZone, Utc};
use humansize::{WINDOWS, format_size};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub use crate::cpf::{format_cpf, format_cpf_input};

const INVALID_DATE: &str = "Data inválida";
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// `DD/MM/YYYY[ HH:MM]` in the given time zone
pub fn format_datetime_in<Tz: TimeZone>(dt: &DateTime<Utc>, include_time: bool, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = dt.with_timezone(tz);
    match include_time {
        true => local.format("%d/%m/%Y %H:%M").to_string(),
        false => local.format("%d/%m/%Y").to_string(),
    }
}

/// `DD/MM/YYYY[ HH:MM]` in local time
pub fn format_datetime(dt: &DateTime<Utc>, include_time: bool) -> String {
    format_datetime_in(dt, include_time, &Local)
}

/// Formats an ISO timestamp, or "Data inválida" when it does not parse
pub fn format_date(iso: &str, include_time: bool) -> String {
    match parse_iso(iso) {
        Some(dt) => format_datetime(&dt, include_time),
        None => INVALID_DATE.to_string(),
    }
}

/// "Hoje", "Ontem", "Há N dias" and so on, relative to `now`
pub fn format_relative_date_at(dt: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let days = (*now - *dt).num_days();
    let plural = |n: i64, one: &str, many: &str| {
        if n > 1 { many.to_string() } else { one.to_string() }
    };

    match days {
        i64::MIN..=0 => "Hoje".to_string(),
        1 => "Ontem".to_string(),
        2..=6 => format!("Há {} dias", days),
        7..=29 => {
            let weeks = days / 7;
            format!("Há {} {}", weeks, plural(weeks, "semana", "semanas"))
        }
        30..=364 => {
            let months = days / 30;
            format!("Há {} {}", months, plural(months, "mês", "meses"))
        }
        _ => {
            let years = days / 365;
            format!("Há {} {}", years, plural(years, "ano", "anos"))
        }
    }
}

pub fn format_relative_date(iso: &str) -> String {
    match parse_iso(iso) {
        Some(dt) => format_relative_date_at(&dt, &Utc::now()),
        None => INVALID_DATE.to_string(),
    }
}

/// `85.678` with one decimal → `85.7%`
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// pt-BR thousands grouping: `1234567` → `1.234.567`
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// `45s`, `4m 5s`, `1h 1m 5s`
pub fn format_execution_time(seconds: u64) -> String {
    humantime::format_duration(Duration::from_secs(seconds)).to_string()
}

/// 1024-based sizes with at most two decimals: `0 Bytes`, `1 KB`, `1.5 MB`
pub fn format_file_size(bytes: u64) -> String {
    let formatted = format_size(bytes, WINDOWS);
    let Some((value, unit)) = formatted.split_once(' ') else {
        return formatted;
    };

    let value = if value.contains('.') {
        value.trim_end_matches('0').trim_end_matches('.')
    } else {
        value
    };
    let unit = match unit {
        "B" => "Bytes",
        "kB" => "KB",
        other => other,
    };
    format!("{} {}", value, unit)
}

/// Percentage of an upload completed, 0 when the total is unknown
pub fn format_upload_progress(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((loaded as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn score_label(score: u8) -> &'static str {
    match score {
        90..=u8::MAX => "Excelente",
        75..=89 => "Bom",
        50..=74 => "Médio",
        _ => "Baixo",
    }
}

/// Tone of the match-score bar
pub fn score_color(score: u8) -> Severity {
    match score {
        90..=u8::MAX => Severity::Success,
        75..=89 => Severity::Info,
        50..=74 => Severity::Warn,
        _ => Severity::Danger,
    }
}

/// Tone of a crossing's hit percentage
pub fn percentage_color(percentage: f64) -> Severity {
    if percentage >= 90.0 {
        Severity::Success
    } else if percentage >= 70.0 {
        Severity::Info
    } else if percentage >= 50.0 {
        Severity::Warn
    } else {
        Severity::Danger
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

pub fn file_icon(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("xlsx" | "xls") => "📊",
        Some("txt") => "📝",
        Some("pdf") => "📕",
        Some("doc" | "docx") => "📘",
        Some("zip" | "rar") => "🗜️",
        _ => "📄",
    }
}

pub fn file_type_description(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("csv") => "Arquivo CSV",
        Some("xlsx") => "Planilha Excel",
        Some("xls") => "Planilha Excel (legado)",
        Some("txt") => "Arquivo de texto",
        Some("pdf") => "Documento PDF",
        Some("doc") => "Documento Word (legado)",
        Some("docx") => "Documento Word",
        Some("zip") => "Arquivo ZIP",
        Some("rar") => "Arquivo RAR",
        _ => "Arquivo",
    }
}

/// `01/2025` → `Jan/2025`; anything else is returned as is
pub fn format_period_reference(reference: &str) -> String {
    match reference.parse::<Reference>() {
        Ok(r) if !r.is_daily() => {
            format!("{}/{}", MONTH_ABBREVIATIONS[r.month() as usize - 1], r.year())
        }
        _ => reference.to_string(),
    }
}

/// Cuts `text` to `max_len` characters, ending in `...` when shortened
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Display-ready view of an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub file_type: String,
    pub reference: String,
    pub upload_date: String,
    pub upload_time: String,
    pub status: String,
    pub status_severity: Severity,
    pub last_crossing: String,
}

impl FileSummary {
    pub fn from_file_in<Tz: TimeZone>(file: &DataFile, tz: &Tz, now: &DateTime<Utc>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let uploaded = file.upload_date.with_timezone(tz);
        Self {
            name: file.name.clone(),
            file_type: file.file_type.label().to_string(),
            reference: format_period_reference(&file.reference),
            upload_date: uploaded.format("%d/%m/%Y").to_string(),
            upload_time: uploaded.format("%H:%M").to_string(),
            status: file.status.label().to_string(),
            status_severity: file.status.severity(),
            last_crossing: file
                .last_crossing
                .map(|at| format_relative_date_at(&at, now))
                .unwrap_or_else(|| "Nunca".to_string()),
        }
    }

    pub fn from_file(file: &DataFile) -> Self {
        Self::from_file_in(file, &Local, &Utc::now())
    }
}
