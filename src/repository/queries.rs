// Query results produced by crossings

use super::{Filter, Paging, non_empty, paginate, round_to};
use crate::error::Result;
use crate::models::{HitType, Page, QueryResult};
use crate::reference::ReferenceRange;
use crate::utils::digits_only;
use serde::Serialize;
use strum::IntoEnumIterator;

/// Criteria for the result search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    /// Digits-only substring; punctuation in the input is ignored
    pub cpf: Option<String>,
    /// Case-insensitive substring of the name or the mother's name
    pub name: Option<String>,
    pub crossing_id: Option<String>,
    pub reference_start: Option<String>,
    pub reference_end: Option<String>,
    /// Any of these hit types; empty means all
    pub hit_types: Vec<HitType>,
    /// Keep results with no hit types at all
    pub include_no_hits: bool,
    pub paging: Paging,
}

impl QueryFilter {
    fn cpf_digits(&self) -> Option<String> {
        non_empty(&self.cpf)
            .map(digits_only)
            .filter(|d| !d.is_empty())
    }

    /// Criteria currently set, labelled for display
    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        let mut active = Vec::new();
        let mut push = |key: &'static str, label: &'static str, value: String| {
            active.push(ActiveFilter { key, label, value })
        };

        if let Some(cpf) = non_empty(&self.cpf) {
            push("cpf", "CPF", cpf.to_string());
        }
        if let Some(name) = non_empty(&self.name) {
            push("name", "Nome", name.to_string());
        }
        if let Some(id) = non_empty(&self.crossing_id) {
            push("crossing_id", "Cruzamento", id.to_string());
        }
        if let Some(start) = non_empty(&self.reference_start) {
            push("reference_start", "Período Inicial", start.to_string());
        }
        if let Some(end) = non_empty(&self.reference_end) {
            push("reference_end", "Período Final", end.to_string());
        }
        if !self.hit_types.is_empty() {
            push(
                "hit_types",
                "Tipos de Hit",
                format!("{} tipo(s)", self.hit_types.len()),
            );
        }
        if self.include_no_hits {
            push("include_no_hits", "Incluir Sem Hits", "Sim".to_string());
        }
        active
    }
}

impl Filter for QueryFilter {
    fn paging(&self) -> &Paging {
        &self.paging
    }

    fn paging_mut(&mut self) -> &mut Paging {
        &mut self.paging
    }

    fn active_filters_count(&self) -> usize {
        self.active_filters().len()
    }
}

/// One entry of `QueryFilter::active_filters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveFilter {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStatistics {
    pub total: usize,
    pub with_hits: usize,
    pub without_hits: usize,
    /// Mean score of the results with hits, one decimal
    pub average_match_score: f64,
    /// Every hit type, zero counts included
    pub hit_type_distribution: Vec<(HitType, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryRepository {
    results: Vec<QueryResult>,
}

impl QueryRepository {
    pub fn new(results: Vec<QueryResult>) -> Self {
        Self { results }
    }

    pub fn all(&self) -> &[QueryResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&QueryResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn filtered(&self, filter: &QueryFilter) -> Result<Vec<QueryResult>> {
        let range = ReferenceRange::parse(
            non_empty(&filter.reference_start),
            non_empty(&filter.reference_end),
        )?;
        let cpf = filter.cpf_digits();
        let name = non_empty(&filter.name).map(str::to_lowercase);
        let crossing_id = non_empty(&filter.crossing_id);

        Ok(self
            .results
            .iter()
            .filter(|r| cpf.as_ref().is_none_or(|c| digits_only(&r.cpf).contains(c.as_str())))
            .filter(|r| {
                name.as_ref().is_none_or(|n| {
                    r.name.to_lowercase().contains(n.as_str())
                        || r.mother_name.to_lowercase().contains(n.as_str())
                })
            })
            .filter(|r| crossing_id.is_none_or(|id| r.crossing_id == id))
            .filter(|r| range.matches(&r.file_reference))
            .filter(|r| {
                filter.hit_types.is_empty()
                    || r.hit_types.iter().any(|h| filter.hit_types.contains(h))
            })
            .filter(|r| filter.include_no_hits || r.has_hits())
            .cloned()
            .collect())
    }

    pub fn query(&self, filter: &QueryFilter) -> Result<Page<QueryResult>> {
        let results = self.filtered(filter)?;
        Ok(paginate(results, filter.paging.page, filter.paging.limit))
    }

    pub fn statistics(&self, filter: &QueryFilter) -> Result<QueryStatistics> {
        let filtered = self.filtered(filter)?;
        let with_hits: Vec<&QueryResult> = filtered.iter().filter(|r| r.has_hits()).collect();

        let average = match with_hits.len() {
            0 => 0.0,
            n => {
                let sum: u32 = with_hits.iter().map(|r| u32::from(r.match_score)).sum();
                round_to(f64::from(sum) / n as f64, 1)
            }
        };

        let hit_type_distribution = HitType::iter()
            .map(|h| {
                let count = filtered
                    .iter()
                    .flat_map(|r| r.hit_types.iter())
                    .filter(|t| **t == h)
                    .count();
                (h, count)
            })
            .collect();

        Ok(QueryStatistics {
            total: filtered.len(),
            with_hits: with_hits.len(),
            without_hits: filtered.len() - with_hits.len(),
            average_match_score: average,
            hit_type_distribution,
        })
    }

    /// CSV of every result matching `filter`, pagination ignored
    pub fn export_csv(&self, filter: &QueryFilter) -> Result<String> {
        super::export_csv(&self.filtered(filter)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::error::DashboardError;
    use pretty_assertions::assert_eq;

    fn repo() -> QueryRepository {
        QueryRepository::new(Dataset::seed().unwrap().results)
    }

    fn ids(results: &[QueryResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn with(change: impl FnOnce(&mut QueryFilter)) -> QueryFilter {
        let mut filter = QueryFilter::default();
        filter.apply(change);
        filter
    }

    #[test]
    fn results_without_hits_are_hidden_by_default() {
        let repo = repo();
        assert_eq!(repo.filtered(&QueryFilter::default()).unwrap().len(), 27);
        let all = with(|f| f.include_no_hits = true);
        assert_eq!(repo.filtered(&all).unwrap().len(), 30);
    }

    #[test]
    fn cpf_search_ignores_punctuation() {
        let repo = repo();
        let found = repo.filtered(&with(|f| f.cpf = Some("319.717".into()))).unwrap();
        assert_eq!(ids(&found), vec!["result-005"]);

        let found = repo.filtered(&with(|f| f.cpf = Some("31971747718".into()))).unwrap();
        assert_eq!(ids(&found), vec!["result-005"]);
    }

    #[test]
    fn name_search_covers_mother_name() {
        let found = repo().filtered(&with(|f| f.name = Some("LIMA".into()))).unwrap();
        assert_eq!(
            ids(&found),
            vec![
                "result-001", "result-002", "result-004", "result-005", "result-011",
                "result-012", "result-013", "result-028", "result-029", "result-030",
            ]
        );
    }

    #[test]
    fn crossing_filter_with_and_without_empty_results() {
        let repo = repo();
        let hits = with(|f| f.crossing_id = Some("cross-001".into()));
        assert_eq!(
            ids(&repo.filtered(&hits).unwrap()),
            vec!["result-003", "result-005", "result-025"]
        );

        let all = with(|f| {
            f.crossing_id = Some("cross-001".into());
            f.include_no_hits = true;
        });
        assert_eq!(
            ids(&repo.filtered(&all).unwrap()),
            vec!["result-003", "result-005", "result-024", "result-025"]
        );
    }

    #[test]
    fn hit_types_match_any() {
        let perfect = with(|f| f.hit_types = vec![HitType::Perfeito]);
        assert_eq!(repo().filtered(&perfect).unwrap().len(), 3);

        let either = with(|f| f.hit_types = vec![HitType::Perfeito, HitType::CpfIncompleto]);
        let found = repo().filtered(&either).unwrap();
        assert!(found.iter().all(|r| {
            r.hit_types.contains(&HitType::Perfeito)
                || r.hit_types.contains(&HitType::CpfIncompleto)
        }));
        assert!(found.len() >= 3);
    }

    #[test]
    fn statistics_over_the_filtered_set() {
        let repo = repo();
        let stats = repo.statistics(&with(|f| f.include_no_hits = true)).unwrap();
        assert_eq!(stats.total, 30);
        assert_eq!(stats.with_hits, 27);
        assert_eq!(stats.without_hits, 3);
        assert_eq!(stats.average_match_score, 66.6);
        assert_eq!(
            stats.hit_type_distribution,
            vec![
                (HitType::Perfeito, 3),
                (HitType::CpfCompleto, 5),
                (HitType::CpfIncompleto, 3),
                (HitType::DataNascimento, 14),
                (HitType::ComFalecido, 5),
            ]
        );

        let default = repo.statistics(&QueryFilter::default()).unwrap();
        assert_eq!(default.without_hits, 0);

        let none = repo
            .statistics(&with(|f| f.crossing_id = Some("cross-404".into())))
            .unwrap();
        assert_eq!((none.total, none.average_match_score), (0, 0.0));
    }

    #[test]
    fn active_filter_labels() {
        let filter = with(|f| {
            f.cpf = Some("123".into());
            f.hit_types = vec![HitType::Perfeito, HitType::ComFalecido];
            f.include_no_hits = true;
        });
        let active = filter.active_filters();
        assert_eq!(
            active
                .iter()
                .map(|a| (a.label, a.value.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("CPF", "123"),
                ("Tipos de Hit", "2 tipo(s)"),
                ("Incluir Sem Hits", "Sim")
            ]
        );
        assert_eq!(filter.active_filters_count(), 3);
        assert!(!QueryFilter::default().has_active_filters());
    }

    #[test]
    fn reversed_period_is_rejected() {
        let filter = with(|f| {
            f.reference_start = Some("03/2025".into());
            f.reference_end = Some("01/2025".into());
        });
        assert!(matches!(repo().query(&filter), Err(DashboardError::Validation(_))));
    }
}
