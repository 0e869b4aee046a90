// CSV export of query results

use crate::error::{DashboardError, Result};
use crate::models::QueryResult;
use chrono::NaiveDate;

const HEADER: [&str; 7] = [
    "CPF",
    "Nome",
    "Nome da Mãe",
    "Data Nascimento",
    "Data Óbito",
    "Tipos de Hit",
    "Score de Correspondência (%)",
];

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Renders `results` as CSV: a bare header line, then one line per result
/// with every cell quoted. A missing death date is written as `-`.
pub fn export_csv(results: &[QueryResult]) -> Result<String> {
    if results.is_empty() {
        return Err(DashboardError::Validation(
            "Não há resultados para exportar".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(results.len() + 1);
    lines.push(HEADER.join(","));

    for r in results {
        let hit_types = r
            .hit_types
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let score = r.match_score.to_string();
        let row = [
            r.cpf.as_str(),
            r.name.as_str(),
            r.mother_name.as_str(),
            r.birth_date.as_str(),
            r.death_date.as_deref().unwrap_or("-"),
            hit_types.as_str(),
            score.as_str(),
        ];
        lines.push(row.iter().map(|c| quote(c)).collect::<Vec<_>>().join(","));
    }

    Ok(lines.join("\n"))
}

/// `resultados_sirc_2025-01-15.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("resultados_sirc_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HitType;
    use pretty_assertions::assert_eq;

    fn result() -> QueryResult {
        QueryResult {
            id: "result-x".into(),
            crossing_id: "cross-001".into(),
            file_reference: "01/2025".into(),
            cpf: "111.444.777-35".into(),
            name: "Maria \"Cota\" Souza".into(),
            mother_name: "Ana Souza".into(),
            birth_date: "01/02/1950".into(),
            death_date: None,
            hit_types: vec![HitType::Perfeito, HitType::ComFalecido],
            match_score: 97,
        }
    }

    #[test]
    fn renders_header_and_quoted_rows() {
        let csv = export_csv(&[result()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "CPF,Nome,Nome da Mãe,Data Nascimento,Data Óbito,Tipos de Hit,Score de Correspondência (%)"
        );
        assert_eq!(
            lines[1],
            r#""111.444.777-35","Maria ""Cota"" Souza","Ana Souza","01/02/1950","-","hit-perfeito, hit-com-falecido","97""#
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn empty_export_is_rejected() {
        assert!(matches!(export_csv(&[]), Err(DashboardError::Validation(_))));
    }

    #[test]
    fn file_name_carries_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(export_file_name(date), "resultados_sirc_2025-01-15.csv");
    }
}
