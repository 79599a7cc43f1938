pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod paths;
pub mod srs;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analysis::DifficultyAnalyzer;
pub use domain::{ItemId, ReviewRecord};
pub use error::{Result, SchedulerError};
pub use srs::{QuestionSelector, Scheduler};
pub use store::{ReviewStore, StorageError};
