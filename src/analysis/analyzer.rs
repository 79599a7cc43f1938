//! Error analysis over one user's review history.

use serde::Serialize;

use super::advice::{Recommendation, Suggestion};
use crate::config::{
    DIFFICULT_MIN_ATTEMPTS, DIFFICULT_QUESTIONS_LIMIT, DIFFICULT_SUCCESS_RATE, RECOMMENDATIONS_LIMIT,
    SLOW_QUESTIONS_LIMIT, SLOW_RESPONSE_SECS, SUGGESTIONS_LIMIT,
};
use crate::domain::{ItemId, ReviewRecord};
use crate::error::Result;
use crate::srs::scheduler::round_to;
use crate::store::ReviewStore;

/// Item answered wrongly often enough to need focused work
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultQuestion {
    pub item: ItemId,
    /// Percent, 1 decimal
    pub success_rate: f64,
    pub attempts: u32,
    /// 1 decimal
    pub difficulty_score: f64,
    /// 2 decimals
    pub ease_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowQuestion {
    pub item: ItemId,
    /// Seconds, 1 decimal
    pub avg_time: f64,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorPatterns {
    pub mastered: usize,
    pub struggling: usize,
    pub learning: usize,
    /// Mean over items with a recorded response time, 1 decimal
    pub avg_response_time: f64,
    pub slow_questions: Vec<SlowQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorSummary {
    pub questions_attempted: usize,
    pub total_attempts: u64,
    pub total_errors: u64,
    /// Percent, 1 decimal
    pub error_rate: f64,
    pub difficult_questions: Vec<DifficultQuestion>,
    pub patterns: ErrorPatterns,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
    NoData,
}

impl ConsistencyLevel {
    /// Level for a mean repetition streak
    pub fn from_avg_repetitions(avg: f64) -> Self {
        if avg >= 3.0 {
            ConsistencyLevel::Excellent
        } else if avg >= 2.0 {
            ConsistencyLevel::Good
        } else if avg >= 1.0 {
            ConsistencyLevel::Fair
        } else {
            ConsistencyLevel::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Excellent => "Excellent",
            ConsistencyLevel::Good => "Good",
            ConsistencyLevel::Fair => "Fair",
            ConsistencyLevel::NeedsImprovement => "Needs Improvement",
            ConsistencyLevel::NoData => "No data",
        }
    }
}

/// How steadily a user keeps items in their repetition streak
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consistency {
    pub total_questions: usize,
    /// 1 decimal
    pub avg_repetitions: f64,
    pub total_attempts: u64,
    pub level: ConsistencyLevel,
}

/// Raw per-user aggregates shared by the summary and the advice rules.
struct Totals {
    attempts: u64,
    errors: u64,
    /// Percent, unrounded
    error_rate: f64,
    /// Mean of nonzero average response times, if any
    mean_response_time: Option<f64>,
}

impl Totals {
    fn from_records(records: &[(ItemId, ReviewRecord)]) -> Self {
        let attempts: u64 = records.iter().map(|(_, r)| r.total_attempts as u64).sum();
        let errors: u64 = records
            .iter()
            .map(|(_, r)| r.total_attempts.saturating_sub(r.correct_attempts) as u64)
            .sum();
        let error_rate = if attempts > 0 {
            errors as f64 / attempts as f64 * 100.0
        } else {
            0.0
        };

        let times: Vec<f64> = records
            .iter()
            .map(|(_, r)| r.avg_response_time)
            .filter(|t| *t > 0.0)
            .collect();
        let mean_response_time = if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<f64>() / times.len() as f64)
        };

        Self {
            attempts,
            errors,
            error_rate,
            mean_response_time,
        }
    }
}

/// Read-only analysis of a user's records
pub struct DifficultyAnalyzer<S> {
    store: S,
}

impl<S: ReviewStore> DifficultyAnalyzer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn error_summary(&self, user: &str) -> Result<ErrorSummary> {
        let records = self.store.all_for_user(user)?;
        if records.is_empty() {
            return Ok(ErrorSummary::default());
        }

        let totals = Totals::from_records(&records);
        let difficult = difficult_questions(&records);
        let suggestions = build_suggestions(&totals, difficult.len(), &records);

        let mut capped = difficult;
        capped.truncate(DIFFICULT_QUESTIONS_LIMIT);

        tracing::debug!(
            user,
            attempts = totals.attempts,
            errors = totals.errors,
            "Built error summary"
        );

        Ok(ErrorSummary {
            questions_attempted: records.len(),
            total_attempts: totals.attempts,
            total_errors: totals.errors,
            error_rate: round_to(totals.error_rate, 1),
            difficult_questions: capped,
            patterns: error_patterns(&records),
            suggestions,
        })
    }

    pub fn patterns(&self, user: &str) -> Result<ErrorPatterns> {
        Ok(error_patterns(&self.store.all_for_user(user)?))
    }

    /// Improvement suggestions; empty when the user has no history.
    pub fn suggestions(&self, user: &str) -> Result<Vec<Suggestion>> {
        let records = self.store.all_for_user(user)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let totals = Totals::from_records(&records);
        Ok(build_suggestions(&totals, difficult_questions(&records).len(), &records))
    }

    pub fn learning_consistency(&self, user: &str) -> Result<Consistency> {
        let records = self.store.all_for_user(user)?;
        if records.is_empty() {
            return Ok(Consistency {
                total_questions: 0,
                avg_repetitions: 0.0,
                total_attempts: 0,
                level: ConsistencyLevel::NoData,
            });
        }

        let repetitions: u64 = records.iter().map(|(_, r)| r.repetition as u64).sum();
        let avg = repetitions as f64 / records.len() as f64;

        Ok(Consistency {
            total_questions: records.len(),
            avg_repetitions: round_to(avg, 1),
            total_attempts: records.iter().map(|(_, r)| r.total_attempts as u64).sum(),
            level: ConsistencyLevel::from_avg_repetitions(avg),
        })
    }

    pub fn progress_recommendations(&self, user: &str) -> Result<Vec<Recommendation>> {
        let summary = self.error_summary(user)?;
        if summary.questions_attempted == 0 {
            return Ok(vec![Recommendation::StartBaselineQuiz]);
        }

        let mut recommendations = if summary.error_rate > 40.0 {
            vec![
                Recommendation::ReviewFundamentals,
                Recommendation::TargetWeakAreas,
                Recommendation::AccuracyOverSpeed,
            ]
        } else if summary.error_rate > 20.0 {
            vec![
                Recommendation::UseSmartReview,
                Recommendation::PracticeMixedReview,
                Recommendation::MonitorProgress,
            ]
        } else {
            vec![
                Recommendation::ExploreNewTopics,
                Recommendation::MaintainWithMixedReview,
                Recommendation::TryAdvancedQuestions,
            ]
        };

        let difficult = summary.difficult_questions.len();
        if difficult > 3 {
            recommendations.push(Recommendation::FocusOnDifficult { count: difficult });
        }

        recommendations.truncate(RECOMMENDATIONS_LIMIT);
        Ok(recommendations)
    }
}

/// Every difficult item, hardest first (uncapped).
fn difficult_questions(records: &[(ItemId, ReviewRecord)]) -> Vec<DifficultQuestion> {
    let mut difficult: Vec<DifficultQuestion> = records
        .iter()
        .filter(|(_, r)| r.total_attempts >= DIFFICULT_MIN_ATTEMPTS && r.success_rate() < DIFFICULT_SUCCESS_RATE)
        .map(|(item, r)| DifficultQuestion {
            item: item.clone(),
            success_rate: round_to(r.success_rate() * 100.0, 1),
            attempts: r.total_attempts,
            difficulty_score: round_to(r.difficulty_score(), 1),
            ease_factor: round_to(r.ease_factor, 2),
        })
        .collect();

    difficult.sort_by(|a, b| {
        b.difficulty_score
            .total_cmp(&a.difficulty_score)
            .then_with(|| a.item.cmp(&b.item))
    });
    difficult
}

fn error_patterns(records: &[(ItemId, ReviewRecord)]) -> ErrorPatterns {
    let mut patterns = ErrorPatterns::default();
    let mut time_sum = 0.0;
    let mut timed = 0usize;

    for (item, record) in records {
        let success_rate = record.success_rate();
        if success_rate >= 0.8 && record.repetition >= 3 {
            patterns.mastered += 1;
        } else if success_rate < 0.5 {
            patterns.struggling += 1;
        } else {
            patterns.learning += 1;
        }

        if record.avg_response_time > 0.0 {
            time_sum += record.avg_response_time;
            timed += 1;

            if record.avg_response_time > SLOW_RESPONSE_SECS {
                patterns.slow_questions.push(SlowQuestion {
                    item: item.clone(),
                    avg_time: round_to(record.avg_response_time, 1),
                    attempts: record.total_attempts,
                });
            }
        }
    }

    patterns.avg_response_time = round_to(time_sum / timed.max(1) as f64, 1);
    patterns
        .slow_questions
        .sort_by(|a, b| b.avg_time.total_cmp(&a.avg_time).then_with(|| a.item.cmp(&b.item)));
    patterns.slow_questions.truncate(SLOW_QUESTIONS_LIMIT);
    patterns
}

fn build_suggestions(totals: &Totals, difficult_count: usize, records: &[(ItemId, ReviewRecord)]) -> Vec<Suggestion> {
    let mut suggestions = vec![if totals.error_rate > 50.0 {
        Suggestion::ReviewBasics
    } else if totals.error_rate > 30.0 {
        Suggestion::FocusOnMistakes
    } else if totals.error_rate > 15.0 {
        Suggestion::SmartReview
    } else {
        Suggestion::MixedReview
    }];

    if difficult_count > 5 {
        suggestions.push(Suggestion::ChallengingQuestions {
            count: difficult_count,
        });
    }

    match totals.mean_response_time {
        Some(mean) if mean > 15.0 => suggestions.push(Suggestion::ImproveResponseTime),
        Some(mean) if mean < 5.0 => suggestions.push(Suggestion::FastResponses),
        _ => {}
    }

    let very_easy = records
        .iter()
        .filter(|(_, r)| r.ease_factor > 2.8 && r.repetition >= 2)
        .count();
    if very_easy as f64 > records.len() as f64 * 0.7 {
        suggestions.push(Suggestion::MostlyMastered);
    }

    suggestions.truncate(SUGGESTIONS_LIMIT);
    suggestions
}
