// Domain types shared by the repositories, the store and the CLI

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Badge severity used when rendering statuses and hit types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warn,
    Danger,
    Secondary,
}

/// Upload cadence of a death-record file
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    Mensal,
    Diario,
}

impl FileType {
    pub fn label(&self) -> &'static str {
        match self {
            FileType::Mensal => "Mensal",
            FileType::Diario => "Diário",
        }
    }
}

/// Processing status of a file or crossing
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FileStatus {
    Salvo,
    EmExecucao,
    Erro,
    Agendado,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Salvo => "Salvo",
            FileStatus::EmExecucao => "Em Execução",
            FileStatus::Erro => "Erro",
            FileStatus::Agendado => "Agendado",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FileStatus::Salvo => Severity::Success,
            FileStatus::Agendado => Severity::Warn,
            FileStatus::EmExecucao => Severity::Info,
            FileStatus::Erro => Severity::Danger,
        }
    }
}

/// How strongly a query result matched a registry record
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum HitType {
    #[strum(to_string = "hit-perfeito")]
    #[serde(rename = "hit-perfeito")]
    #[value(name = "hit-perfeito")]
    Perfeito,
    CpfCompleto,
    CpfIncompleto,
    DataNascimento,
    #[strum(to_string = "hit-com-falecido")]
    #[serde(rename = "hit-com-falecido")]
    #[value(name = "hit-com-falecido")]
    ComFalecido,
}

impl HitType {
    /// Full label used in filters and exports
    pub fn label(&self) -> &'static str {
        match self {
            HitType::Perfeito => "Hit Perfeito",
            HitType::CpfCompleto => "CPF Completo",
            HitType::CpfIncompleto => "CPF Incompleto",
            HitType::DataNascimento => "Data Nascimento",
            HitType::ComFalecido => "Com Falecido",
        }
    }

    /// Compact label used in result badges
    pub fn short_label(&self) -> &'static str {
        match self {
            HitType::Perfeito => "Perfeito",
            HitType::CpfCompleto => "CPF Completo",
            HitType::CpfIncompleto => "CPF Parcial",
            HitType::DataNascimento => "Data Nasc.",
            HitType::ComFalecido => "Falecido",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            HitType::Perfeito => Severity::Success,
            HitType::CpfCompleto | HitType::DataNascimento => Severity::Info,
            HitType::CpfIncompleto => Severity::Warn,
            HitType::ComFalecido => Severity::Danger,
        }
    }
}

/// An uploaded death-record file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// `MM/YYYY` for monthly files, `DD/MM/YYYY` for daily ones
    pub reference: String,
    pub hash: String,
    pub upload_date: DateTime<Utc>,
    pub user: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_crossing: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<DateTime<Utc>>,
}

/// A matching run of one file against the death registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    pub id: String,
    pub file_id: String,
    pub file_name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub reference: String,
    pub crossing_date: DateTime<Utc>,
    pub total_deaths: u64,
    pub total_hits: u64,
    pub hit_percentage: f64,
    /// Seconds
    pub execution_time: u64,
    pub status: FileStatus,
}

/// One person found by a crossing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub crossing_id: String,
    pub file_reference: String,
    pub cpf: String,
    pub name: String,
    pub mother_name: String,
    /// `DD/MM/YYYY`
    pub birth_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(default)]
    pub hit_types: Vec<HitType>,
    /// 0..=100
    pub match_score: u8,
}

impl QueryResult {
    pub fn has_hits(&self) -> bool {
        !self.hit_types.is_empty()
    }
}

/// A record held by the personal-registration system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub cpf: String,
    pub name: String,
    pub mother_name: String,
    pub birth_date: String,
    pub status: String,
}

/// Registry-side view of a compared result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryData {
    pub cpf: String,
    pub name: String,
    pub mother_name: String,
    pub birth_date: String,
    pub death_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDifference {
    pub field: String,
    pub registry_value: String,
    pub personal_value: String,
}

/// Side-by-side comparison of a result with the personal system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub result_id: String,
    pub registry_data: RegistryData,
    pub personal_data: PersonRecord,
    pub differences: Vec<FieldDifference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// One page of a filtered collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn wire_names_round_trip_through_strum_and_serde() {
        assert_eq!(FileStatus::EmExecucao.to_string(), "em-execucao");
        assert_eq!(HitType::Perfeito.to_string(), "hit-perfeito");
        assert_eq!(HitType::CpfIncompleto.to_string(), "cpf-incompleto");
        assert_eq!(
            "hit-com-falecido".parse::<HitType>().unwrap(),
            HitType::ComFalecido
        );
        assert_eq!(
            serde_json::to_string(&HitType::DataNascimento).unwrap(),
            "\"data-nascimento\""
        );
        assert_eq!(
            serde_json::from_str::<FileType>("\"diario\"").unwrap(),
            FileType::Diario
        );
    }

    #[test]
    fn every_variant_has_a_label() {
        assert_eq!(FileStatus::iter().count(), 4);
        assert!(HitType::iter().all(|h| !h.label().is_empty() && !h.short_label().is_empty()));
        assert_eq!(FileType::Diario.label(), "Diário");
    }

    #[test]
    fn severities() {
        assert_eq!(FileStatus::Salvo.severity(), Severity::Success);
        assert_eq!(FileStatus::Erro.severity(), Severity::Danger);
        assert_eq!(HitType::CpfIncompleto.severity(), Severity::Warn);
        assert_eq!(HitType::ComFalecido.severity().to_string(), "danger");
    }

    #[test]
    fn data_file_reads_type_field() {
        let json = r#"{
            "id": "file-x", "name": "a.csv", "type": "mensal", "reference": "01/2025",
            "hash": "h", "upload_date": "2025-01-15T10:30:00Z", "user": "u",
            "status": "agendado", "scheduling": "2025-01-16T08:00:00Z"
        }"#;
        let file: DataFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.file_type, FileType::Mensal);
        assert_eq!(file.status, FileStatus::Agendado);
        assert!(file.last_crossing.is_none());
        assert!(file.scheduling.is_some());
    }
}
