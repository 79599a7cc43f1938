use thiserror::Error;

use crate::domain::ItemId;
use crate::store::StorageError;

/// Errors surfaced by the scheduler, selector and analyzer.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No review record for user '{user}' and item {item}")]
    NotFound { user: String, item: ItemId },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
