// Crossings: matching runs of one file against the death registry

use super::{Filter, Paging, non_empty, paginate, round_to};
use crate::error::{DashboardError, Result};
use crate::log_info;
use crate::models::{Crossing, DataFile, FileStatus, Page};
use crate::reference::ReferenceRange;
use crate::utils::parse_iso;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Criteria for the crossing list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossingFilter {
    pub file_id: Option<String>,
    pub reference_start: Option<String>,
    pub reference_end: Option<String>,
    pub hit_percentage_min: Option<f64>,
    pub hit_percentage_max: Option<f64>,
    /// ISO date, inclusive
    pub date_start: Option<String>,
    /// ISO date, inclusive
    pub date_end: Option<String>,
    pub paging: Paging,
}

impl Filter for CrossingFilter {
    fn paging(&self) -> &Paging {
        &self.paging
    }

    fn paging_mut(&mut self) -> &mut Paging {
        &mut self.paging
    }

    fn active_filters_count(&self) -> usize {
        [
            non_empty(&self.file_id).is_some(),
            non_empty(&self.reference_start).is_some(),
            non_empty(&self.reference_end).is_some(),
            self.hit_percentage_min.is_some(),
            self.hit_percentage_max.is_some(),
            non_empty(&self.date_start).is_some(),
            non_empty(&self.date_end).is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Totals over every crossing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingSummary {
    pub total_crossings: usize,
    pub total_hits: u64,
    pub total_deaths: u64,
    /// Rounded to two decimals
    pub average_hit_percentage: f64,
    pub last_crossing: Option<DateTime<Utc>>,
}

/// Totals over the crossings matching a filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSummary {
    pub total_deaths: u64,
    pub total_hits: u64,
    pub average_hit_percentage: f64,
}

/// Outcome of a finished run, recorded with `CrossingRepository::record`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingRun {
    pub total_deaths: u64,
    pub total_hits: u64,
    /// Seconds
    pub execution_time: u64,
    pub crossing_date: DateTime<Utc>,
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    parse_iso(value)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DashboardError::Validation(format!("Data inválida: {}", value)))
}

fn average_percentage<'a>(crossings: impl ExactSizeIterator<Item = &'a Crossing>) -> f64 {
    let count = crossings.len();
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = crossings.map(|c| c.hit_percentage).sum();
    round_to(sum / count as f64, 2)
}

#[derive(Debug, Clone, Default)]
pub struct CrossingRepository {
    crossings: Vec<Crossing>,
}

impl CrossingRepository {
    pub fn new(crossings: Vec<Crossing>) -> Self {
        Self { crossings }
    }

    pub fn all(&self) -> &[Crossing] {
        &self.crossings
    }

    pub fn len(&self) -> usize {
        self.crossings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Crossing> {
        self.crossings.iter().find(|c| c.id == id)
    }

    /// Crossings matching `filter`, most recent first
    pub fn filtered(&self, filter: &CrossingFilter) -> Result<Vec<Crossing>> {
        let range = ReferenceRange::parse(
            non_empty(&filter.reference_start),
            non_empty(&filter.reference_end),
        )?;
        let since = non_empty(&filter.date_start).map(parse_day).transpose()?;
        let until = non_empty(&filter.date_end).map(parse_day).transpose()?;
        let file_id = non_empty(&filter.file_id);

        let mut result: Vec<Crossing> = self
            .crossings
            .iter()
            .filter(|c| file_id.is_none_or(|id| c.file_id == id))
            .filter(|c| range.matches(&c.reference))
            .filter(|c| filter.hit_percentage_min.is_none_or(|min| c.hit_percentage >= min))
            .filter(|c| filter.hit_percentage_max.is_none_or(|max| c.hit_percentage <= max))
            .filter(|c| {
                let day = c.crossing_date.date_naive();
                since.is_none_or(|s| day >= s) && until.is_none_or(|u| day <= u)
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| b.crossing_date.cmp(&a.crossing_date));
        Ok(result)
    }

    pub fn query(&self, filter: &CrossingFilter) -> Result<Page<Crossing>> {
        let crossings = self.filtered(filter)?;
        Ok(paginate(crossings, filter.paging.page, filter.paging.limit))
    }

    pub fn summary(&self) -> CrossingSummary {
        CrossingSummary {
            total_crossings: self.crossings.len(),
            total_hits: self.crossings.iter().map(|c| c.total_hits).sum(),
            total_deaths: self.crossings.iter().map(|c| c.total_deaths).sum(),
            average_hit_percentage: average_percentage(self.crossings.iter()),
            last_crossing: self.crossings.iter().map(|c| c.crossing_date).max(),
        }
    }

    pub fn filtered_summary(&self, filter: &CrossingFilter) -> Result<FilteredSummary> {
        let filtered = self.filtered(filter)?;
        Ok(FilteredSummary {
            total_deaths: filtered.iter().map(|c| c.total_deaths).sum(),
            total_hits: filtered.iter().map(|c| c.total_hits).sum(),
            average_hit_percentage: average_percentage(filtered.iter()),
        })
    }

    fn next_id(&self) -> String {
        let last = self
            .crossings
            .iter()
            .filter_map(|c| c.id.strip_prefix("cross-"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("cross-{:03}", last + 1)
    }

    /// Stores a finished run of `file` at the top of the list
    pub fn record(&mut self, file: &DataFile, run: CrossingRun) -> &Crossing {
        let hit_percentage = match run.total_deaths {
            0 => 0.0,
            deaths => round_to(run.total_hits as f64 / deaths as f64 * 100.0, 2),
        };

        let crossing = Crossing {
            id: self.next_id(),
            file_id: file.id.clone(),
            file_name: file.name.clone(),
            file_type: file.file_type,
            reference: file.reference.clone(),
            crossing_date: run.crossing_date,
            total_deaths: run.total_deaths,
            total_hits: run.total_hits,
            hit_percentage,
            execution_time: run.execution_time,
            status: FileStatus::Salvo,
        };
        log_info!(
            "Recorded crossing {} for {}: {}/{} hits",
            crossing.id,
            crossing.file_id,
            crossing.total_hits,
            crossing.total_deaths
        );

        self.crossings.insert(0, crossing);
        &self.crossings[0]
    }
}
