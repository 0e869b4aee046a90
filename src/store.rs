// Dashboard store: the repositories plus the dataset they were loaded from

use crate::data::Dataset;
use crate::error::{DashboardError, Result};
use crate::models::{ComparisonResult, Crossing};
use crate::repository::{
    CrossingRepository, CrossingRun, FileRepository, PersonalRegistry, QueryRepository,
};
use crate::retry::{BlockReason, Clock, RetryController, RetryOutcome};
use crate::validators::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_MB};
use crate::{log_info, log_warn};
use std::fmt;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Where `refresh` reads the dataset from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DataSource {
    #[default]
    Seed,
    File(PathBuf),
}

impl DataSource {
    pub fn from_config(data_file: Option<&PathBuf>) -> Self {
        data_file.map_or(DataSource::Seed, |p| DataSource::File(p.clone()))
    }

    async fn load(&self) -> Result<Dataset> {
        match self {
            DataSource::Seed => Dataset::seed(),
            DataSource::File(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || Dataset::load(&path))
                    .await
                    .map_err(|e| DashboardError::Data(format!("Dataset loader stopped: {}", e)))?
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Seed => write!(f, "embedded seed"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The repositories built from one dataset
#[derive(Debug, Clone)]
pub struct Repositories {
    pub files: FileRepository,
    pub crossings: CrossingRepository,
    pub results: QueryRepository,
    pub people: PersonalRegistry,
}

impl Repositories {
    fn build(data: Dataset, max_upload_mb: u64, allowed_extensions: &[String]) -> Self {
        Self {
            files: FileRepository::new(data.files)
                .with_upload_limits(max_upload_mb, allowed_extensions.to_vec()),
            crossings: CrossingRepository::new(data.crossings),
            results: QueryRepository::new(data.results),
            people: PersonalRegistry::new(data.people),
        }
    }

    pub fn compare(&self, result_id: &str) -> Result<ComparisonResult> {
        self.people.compare_by_id(&self.results, result_id)
    }

    /// Runs a crossing for `file_id` end to end: marks the file as running,
    /// records the crossing and marks the file as done
    pub fn run_crossing(&mut self, file_id: &str, run: CrossingRun) -> Result<Crossing> {
        let file = self.files.execute(file_id)?.clone();
        let crossing = self.crossings.record(&file, run).clone();
        self.files.complete_execution(file_id, run.crossing_date)?;
        Ok(crossing)
    }
}

pub struct DashboardStore {
    source: DataSource,
    max_upload_mb: u64,
    allowed_extensions: Vec<String>,
    repos: RwLock<Repositories>,
    refreshing: tokio::sync::Mutex<()>,
}

impl DashboardStore {
    /// An empty store; call `refresh` to load `source`
    pub fn new(source: DataSource) -> Self {
        let allowed: Vec<String> = DEFAULT_ALLOWED_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .collect();
        Self {
            source,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            repos: RwLock::new(Repositories::build(
                Dataset::default(),
                DEFAULT_MAX_UPLOAD_MB,
                &allowed,
            )),
            allowed_extensions: allowed,
            refreshing: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_upload_limits(mut self, max_mb: u64, allowed_extensions: Vec<String>) -> Self {
        self.write()
            .files
            .set_upload_limits(max_mb, allowed_extensions.clone());
        self.max_upload_mb = max_mb;
        self.allowed_extensions = allowed_extensions;
        self
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Repositories> {
        self.repos.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Repositories> {
        self.repos.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reloads every repository from the data source. A refresh started while
    /// another one is pending is ignored and reported as `Busy`.
    pub async fn refresh(&self) -> Result<()> {
        let Ok(_in_flight) = self.refreshing.try_lock() else {
            log_warn!("Refresh already in progress, ignoring duplicate call");
            return Err(DashboardError::Busy("refresh already in progress".to_string()));
        };

        let data = self.source.load().await?;
        log_info!(
            "Loaded {} files, {} crossings and {} results from {}",
            data.files.len(),
            data.crossings.len(),
            data.results.len(),
            self.source
        );

        *self.write() = Repositories::build(data, self.max_upload_mb, &self.allowed_extensions);
        Ok(())
    }

    /// Refreshes through `controller`, sleeping out each cooldown on the
    /// controller's clock until an attempt succeeds or the attempts run out
    pub async fn refresh_with_retry<C: Clock>(
        &self,
        controller: &RetryController<C>,
    ) -> Result<()> {
        let mut last_error: Option<String> = None;

        loop {
            let error_slot = &mut last_error;
            let outcome = controller
                .try_execute(move || async move {
                    self.refresh().await.inspect_err(|e| *error_slot = Some(e.to_string()))
                })
                .await;

            match outcome {
                RetryOutcome::Succeeded => return Ok(()),
                RetryOutcome::Failed => {
                    let state = controller.state();
                    if state.remaining_retries == 0 {
                        return Err(DashboardError::Data(format!(
                            "Giving up after {} attempt(s): {}",
                            state.retry_count,
                            last_error.as_deref().unwrap_or("unknown error")
                        )));
                    }
                    log_info!(
                        "Retrying in {} ({} attempt(s) left)",
                        humantime::format_duration(state.next_retry_in),
                        state.remaining_retries
                    );
                    controller.clock().sleep(state.next_retry_in).await;
                }
                RetryOutcome::Blocked(BlockReason::CoolingDown { remaining }) => {
                    controller.clock().sleep(remaining).await;
                }
                RetryOutcome::Blocked(BlockReason::Exhausted) => {
                    return Err(DashboardError::Data(format!(
                        "No attempts left: {}",
                        last_error.as_deref().unwrap_or("retry budget exhausted")
                    )));
                }
                RetryOutcome::Blocked(BlockReason::InFlight) => {
                    return Err(DashboardError::Busy(
                        "refresh already in progress".to_string(),
                    ));
                }
            }
        }
    }
}
