// Side-by-side comparison of a result with the personal-registration system

use crate::error::{DashboardError, Result};
use crate::log_debug;
use crate::models::{
    ComparisonResult, FieldDifference, PersonRecord, QueryResult, RegistryData, Severity,
};
use crate::repository::QueryRepository;
use crate::utils::digits_only;

/// Personal-system records, looked up by CPF digits
#[derive(Debug, Clone, Default)]
pub struct PersonalRegistry {
    people: Vec<PersonRecord>,
}

impl PersonalRegistry {
    pub fn new(people: Vec<PersonRecord>) -> Self {
        Self { people }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn find_by_cpf(&self, cpf: &str) -> Option<&PersonRecord> {
        let wanted = digits_only(cpf);
        self.people.iter().find(|p| digits_only(&p.cpf) == wanted)
    }

    /// Looks up `result_id` in `results` and compares it
    pub fn compare_by_id(
        &self,
        results: &QueryRepository,
        result_id: &str,
    ) -> Result<ComparisonResult> {
        let result = results.get(result_id).ok_or_else(|| {
            DashboardError::NotFound(format!("Resultado não encontrado: {}", result_id))
        })?;
        self.compare(result)
    }

    /// Compares `result` with the record holding the same CPF
    pub fn compare(&self, result: &QueryResult) -> Result<ComparisonResult> {
        let person = self.find_by_cpf(&result.cpf).ok_or_else(|| {
            DashboardError::NotFound(format!(
                "Registro não encontrado no sistema pessoal: {}",
                result.cpf
            ))
        })?;

        let mut differences = Vec::new();
        let mut check = |field: &str, registry: &str, personal: &str, same: bool| {
            if !same {
                differences.push(FieldDifference {
                    field: field.to_string(),
                    registry_value: registry.to_string(),
                    personal_value: personal.to_string(),
                });
            }
        };

        check(
            "CPF",
            &result.cpf,
            &person.cpf,
            digits_only(&result.cpf) == digits_only(&person.cpf),
        );
        check(
            "Nome",
            &result.name,
            &person.name,
            result.name.trim() == person.name.trim(),
        );
        check(
            "Nome da Mãe",
            &result.mother_name,
            &person.mother_name,
            result.mother_name.trim() == person.mother_name.trim(),
        );
        check(
            "Data de Nascimento",
            &result.birth_date,
            &person.birth_date,
            result.birth_date.trim() == person.birth_date.trim(),
        );

        log_debug!(
            "Compared {} with the personal system: {} difference(s)",
            result.id,
            differences.len()
        );

        Ok(ComparisonResult {
            result_id: result.id.clone(),
            registry_data: RegistryData {
                cpf: result.cpf.clone(),
                name: result.name.clone(),
                mother_name: result.mother_name.clone(),
                birth_date: result.birth_date.clone(),
                death_date: result.death_date.clone(),
            },
            personal_data: person.clone(),
            differences,
        })
    }
}

impl ComparisonResult {
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    /// Case-insensitive substring match on the difference field names, so
    /// `"nome"` matches both "Nome" and "Nome da Mãe"
    pub fn has_difference(&self, field: &str) -> bool {
        let field = field.to_lowercase();
        self.differences
            .iter()
            .any(|d| d.field.to_lowercase().contains(&field))
    }

    pub fn status_label(&self) -> &'static str {
        match self.has_differences() {
            true => "Divergente",
            false => "Confere",
        }
    }

    pub fn status_severity(&self) -> Severity {
        match self.has_differences() {
            true => Severity::Warn,
            false => Severity::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use pretty_assertions::assert_eq;

    fn fixture() -> (Vec<QueryResult>, PersonalRegistry) {
        let data = Dataset::seed().unwrap();
        (data.results, PersonalRegistry::new(data.people))
    }

    fn result<'a>(results: &'a [QueryResult], id: &str) -> &'a QueryResult {
        results.iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn identical_record_confere() {
        let (results, registry) = fixture();
        let cmp = registry.compare(result(&results, "result-002")).unwrap();
        assert!(!cmp.has_differences());
        assert_eq!(cmp.status_label(), "Confere");
        assert_eq!(cmp.status_severity(), Severity::Success);
        assert_eq!(cmp.personal_data.cpf, cmp.registry_data.cpf);
    }

    #[test]
    fn birth_date_divergence() {
        let (results, registry) = fixture();
        let cmp = registry.compare(result(&results, "result-001")).unwrap();
        assert_eq!(
            cmp.differences,
            vec![FieldDifference {
                field: "Data de Nascimento".into(),
                registry_value: "20/05/1997".into(),
                personal_value: "21/05/1997".into(),
            }]
        );
        assert_eq!(cmp.status_label(), "Divergente");
        assert_eq!(cmp.status_severity(), Severity::Warn);
        assert!(cmp.has_difference("nascimento"));
        assert!(!cmp.has_difference("nome"));
    }

    #[test]
    fn mother_and_own_name_divergence() {
        let (results, registry) = fixture();

        let mother = registry.compare(result(&results, "result-003")).unwrap();
        assert_eq!(mother.differences.len(), 1);
        assert_eq!(mother.differences[0].field, "Nome da Mãe");
        assert_eq!(mother.differences[0].personal_value, "Francisca Oliveira Machado");
        assert!(mother.has_difference("NOME"));

        let own = registry.compare(result(&results, "result-019")).unwrap();
        assert_eq!(own.differences[0].field, "Nome");
        assert_eq!(own.differences[0].personal_value, "Antônia Pereira dos Santos");
    }

    #[test]
    fn missing_personal_record_is_not_found() {
        let (results, registry) = fixture();
        let err = registry.compare(result(&results, "result-012")).unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(_)));
    }

    #[test]
    fn unknown_result_is_not_found() {
        let (results, registry) = fixture();
        let results = QueryRepository::new(results);
        assert!(registry.compare_by_id(&results, "result-005").is_ok());
        assert!(matches!(
            registry.compare_by_id(&results, "result-999"),
            Err(DashboardError::NotFound(_))
        ));
    }

    #[test]
    fn lookup_ignores_punctuation() {
        let (_, registry) = fixture();
        assert!(registry.find_by_cpf("31971747718").is_some());
        assert!(registry.find_by_cpf("000.000.000-00").is_none());
    }
}
