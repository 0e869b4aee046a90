// Uploaded death-record files

use super::{Filter, Paging, non_empty, paginate};
use crate::error::{DashboardError, Result};
use crate::models::{DataFile, FileStatus, FileType, Page};
use crate::reference::ReferenceRange;
use crate::validators::{
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_MB, is_valid_date, is_valid_reference,
    validate_file_upload_with, validate_scheduling,
};
use crate::{log_info, log_warn};
use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use strum::IntoEnumIterator;

/// Criteria for the file list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFilter {
    /// Case-insensitive substring of the file name
    pub name: Option<String>,
    pub file_type: Option<FileType>,
    /// Any of these statuses; empty means all
    pub status: Vec<FileStatus>,
    pub reference_start: Option<String>,
    pub reference_end: Option<String>,
    pub paging: Paging,
}

impl Filter for FileFilter {
    fn paging(&self) -> &Paging {
        &self.paging
    }

    fn paging_mut(&mut self) -> &mut Paging {
        &mut self.paging
    }

    fn active_filters_count(&self) -> usize {
        [
            non_empty(&self.name).is_some(),
            self.file_type.is_some(),
            !self.status.is_empty(),
            non_empty(&self.reference_start).is_some(),
            non_empty(&self.reference_end).is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// A file being added through `upload`
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub name: String,
    pub size_bytes: u64,
    pub file_type: FileType,
    pub reference: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct FileRepository {
    files: Vec<DataFile>,
    max_upload_mb: u64,
    allowed_extensions: Vec<String>,
}

impl FileRepository {
    pub fn new(files: Vec<DataFile>) -> Self {
        Self {
            files,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }

    pub fn with_upload_limits(mut self, max_mb: u64, allowed_extensions: Vec<String>) -> Self {
        self.set_upload_limits(max_mb, allowed_extensions);
        self
    }

    pub fn set_upload_limits(&mut self, max_mb: u64, allowed_extensions: Vec<String>) {
        self.max_upload_mb = max_mb;
        self.allowed_extensions = allowed_extensions;
    }

    pub fn all(&self) -> &[DataFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DataFile> {
        self.files.iter().find(|f| f.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut DataFile> {
        self.files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| DashboardError::NotFound(format!("Arquivo não encontrado: {}", id)))
    }

    /// All files matching `filter`, in stored order
    pub fn filtered(&self, filter: &FileFilter) -> Result<Vec<DataFile>> {
        let range = ReferenceRange::parse(
            non_empty(&filter.reference_start),
            non_empty(&filter.reference_end),
        )?;
        let name = non_empty(&filter.name).map(str::to_lowercase);

        Ok(self
            .files
            .iter()
            .filter(|f| name.as_ref().is_none_or(|n| f.name.to_lowercase().contains(n)))
            .filter(|f| filter.file_type.is_none_or(|t| f.file_type == t))
            .filter(|f| filter.status.is_empty() || filter.status.contains(&f.status))
            .filter(|f| range.matches(&f.reference))
            .cloned()
            .collect())
    }

    pub fn query(&self, filter: &FileFilter) -> Result<Page<DataFile>> {
        let files = self.filtered(filter)?;
        Ok(paginate(files, filter.paging.page, filter.paging.limit))
    }

    /// Count per status over every file, in declaration order
    pub fn count_by_status(&self) -> Vec<(FileStatus, usize)> {
        FileStatus::iter()
            .map(|s| (s, self.files.iter().filter(|f| f.status == s).count()))
            .collect()
    }

    pub fn count_by_type(&self) -> Vec<(FileType, usize)> {
        FileType::iter()
            .map(|t| (t, self.files.iter().filter(|f| f.file_type == t).count()))
            .collect()
    }

    fn next_id(&self, now: &DateTime<Utc>) -> String {
        let mut stamp = now.timestamp_millis();
        loop {
            let id = format!("file-{}", stamp);
            if self.get(&id).is_none() {
                return id;
            }
            stamp += 1;
        }
    }

    /// Validates and stores a new file at the top of the list with status
    /// `Salvo`
    pub fn upload(&mut self, upload: NewUpload) -> Result<&DataFile> {
        validate_file_upload_with(
            &upload.name,
            upload.size_bytes,
            self.max_upload_mb,
            &self.allowed_extensions,
        )
        .into_result()?;

        let reference = upload.reference.trim();
        let (reference_ok, pattern) = match upload.file_type {
            FileType::Mensal => (is_valid_reference(reference), "MM/YYYY"),
            FileType::Diario => (is_valid_date(reference), "DD/MM/YYYY"),
        };
        if !reference_ok {
            return Err(DashboardError::Validation(format!(
                "Referência inválida. Use o formato {}",
                pattern
            )));
        }

        let now = Utc::now();
        let mut hasher = DefaultHasher::new();
        (&upload.name, upload.size_bytes, now.timestamp_millis()).hash(&mut hasher);

        let file = DataFile {
            id: self.next_id(&now),
            name: upload.name,
            file_type: upload.file_type,
            reference: reference.to_string(),
            hash: format!("{:016x}", hasher.finish()),
            upload_date: now,
            user: upload.user,
            status: FileStatus::Salvo,
            last_crossing: None,
            scheduling: None,
        };
        log_info!("Uploaded file {} ({})", file.name, file.id);

        self.files.insert(0, file);
        Ok(&self.files[0])
    }

    pub fn delete(&mut self, id: &str) -> Result<DataFile> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| DashboardError::NotFound(format!("Arquivo não encontrado: {}", id)))?;
        let removed = self.files.remove(index);
        log_info!("Deleted file {}", removed.id);
        Ok(removed)
    }

    /// Schedules a crossing; `frequency` is `unico`, `diario` or `mensal`
    pub fn schedule(&mut self, id: &str, at: DateTime<Utc>, frequency: &str) -> Result<&DataFile> {
        validate_scheduling(&at, frequency).into_result()?;

        let file = self.get_mut(id)?;
        file.status = FileStatus::Agendado;
        file.scheduling = Some(at);
        log_info!("Scheduled file {} for {} ({})", file.id, at.to_rfc3339(), frequency);
        Ok(file)
    }

    /// Marks a file as running a crossing
    pub fn execute(&mut self, id: &str) -> Result<&DataFile> {
        let file = self.get_mut(id)?;
        if file.status == FileStatus::EmExecucao {
            log_warn!("File {} is already running", file.id);
            return Err(DashboardError::Busy(format!(
                "Arquivo já está em execução: {}",
                file.id
            )));
        }
        file.status = FileStatus::EmExecucao;
        Ok(file)
    }

    /// Finishes a running crossing, recording when it ended
    pub fn complete_execution(&mut self, id: &str, at: DateTime<Utc>) -> Result<&DataFile> {
        let file = self.get_mut(id)?;
        file.status = FileStatus::Salvo;
        file.last_crossing = Some(at);
        Ok(file)
    }
}
