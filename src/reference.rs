// File references: `MM/YYYY` for monthly uploads, `DD/MM/YYYY` for daily ones

use crate::error::{DashboardError, Result};
use crate::validators::validate_reference_period;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// A parsed file reference, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference {
    year: i32,
    month: u32,
    day: Option<u32>,
}

fn parse_part(part: &str, width: usize) -> Option<u32> {
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl Reference {
    pub fn monthly(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self {
            year,
            month,
            day: None,
        })
    }

    pub fn daily(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?;
        Some(Self {
            year,
            month,
            day: Some(day),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn is_daily(&self) -> bool {
        self.day.is_some()
    }

    /// The month this reference belongs to, a daily reference included
    pub fn month_key(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

impl FromStr for Reference {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DashboardError::Validation(format!("Referência inválida: {}", s));
        let parts: Vec<&str> = s.trim().split('/').collect();

        match parts.as_slice() {
            [month, year] => {
                let month = parse_part(month, 2).ok_or_else(invalid)?;
                let year = parse_part(year, 4).ok_or_else(invalid)?;
                Reference::monthly(year as i32, month).ok_or_else(invalid)
            }
            [day, month, year] => {
                let day = parse_part(day, 2).ok_or_else(invalid)?;
                let month = parse_part(month, 2).ok_or_else(invalid)?;
                let year = parse_part(year, 4).ok_or_else(invalid)?;
                Reference::daily(year as i32, month, day).ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day {
            Some(day) => write!(f, "{:02}/{:02}/{:04}", day, self.month, self.year),
            None => write!(f, "{:02}/{:04}", self.month, self.year),
        }
    }
}

/// Inclusive month range used by the file, crossing and result filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceRange {
    pub start: Option<Reference>,
    pub end: Option<Reference>,
}

impl ReferenceRange {
    /// Builds a range from optional `MM/YYYY` bounds, rejecting malformed or
    /// reversed periods with the same messages the validators produce
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let check = validate_reference_period(start, end);
        if !check.valid {
            return Err(DashboardError::Validation(check.message.unwrap_or_default()));
        }

        Ok(Self {
            start: start.map(str::parse).transpose()?,
            end: end.map(str::parse).transpose()?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        let key = reference.month_key();
        self.start.is_none_or(|s| key >= s.month_key())
            && self.end.is_none_or(|e| key <= e.month_key())
    }

    /// Matches a stored reference string; unparseable references only pass an
    /// unbounded range
    pub fn matches(&self, stored: &str) -> bool {
        if self.is_unbounded() {
            return true;
        }
        stored
            .parse::<Reference>()
            .is_ok_and(|r| self.contains(&r))
    }
}
