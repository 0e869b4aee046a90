// SIRC dashboard core

pub mod cli;
pub mod config;
pub mod cpf;
pub mod data;
pub mod error;
pub mod format;
pub mod log;
pub mod models;
pub mod reference;
pub mod repository;
pub mod retry;
pub mod store;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use retry::{RetryConfig, RetryController};
pub use store::{DashboardStore, DataSource};
