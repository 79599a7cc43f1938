//! Read-only error analysis and study advice.

pub mod advice;
pub mod analyzer;

pub use advice::{Recommendation, Suggestion};
pub use analyzer::{
    Consistency, ConsistencyLevel, DifficultQuestion, DifficultyAnalyzer, ErrorPatterns, ErrorSummary, SlowQuestion,
};
