//! Typed study advice.
//!
//! Advice is produced as enum values so a frontend can render its own text;
//! `message()` gives the default English wording. Both types serialize as
//! `{ "kind": ..., "message": ... }`.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Short suggestion attached to an error summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    /// Error rate above 50%
    ReviewBasics,
    /// Error rate above 30%
    FocusOnMistakes,
    /// Error rate above 15%
    SmartReview,
    /// Error rate at or below 15%
    MixedReview,
    ChallengingQuestions { count: usize },
    ImproveResponseTime,
    FastResponses,
    MostlyMastered,
}

impl Suggestion {
    pub fn kind(&self) -> &'static str {
        match self {
            Suggestion::ReviewBasics => "review_basics",
            Suggestion::FocusOnMistakes => "focus_on_mistakes",
            Suggestion::SmartReview => "smart_review",
            Suggestion::MixedReview => "mixed_review",
            Suggestion::ChallengingQuestions { .. } => "challenging_questions",
            Suggestion::ImproveResponseTime => "improve_response_time",
            Suggestion::FastResponses => "fast_responses",
            Suggestion::MostlyMastered => "mostly_mastered",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Suggestion::ReviewBasics => {
                "Your error rate is quite high. Consider reviewing basic concepts before attempting quizzes."
                    .to_string()
            }
            Suggestion::FocusOnMistakes => {
                "Focus on your weak areas using the 'Focus on Mistakes' mode.".to_string()
            }
            Suggestion::SmartReview => {
                "You're doing well! Use 'Smart Review' to reinforce your learning.".to_string()
            }
            Suggestion::MixedReview => {
                "Excellent performance! Try 'Mixed Review' to maintain your knowledge.".to_string()
            }
            Suggestion::ChallengingQuestions { count } => format!(
                "You have {} challenging questions. Use spaced repetition to gradually master them.",
                count
            ),
            Suggestion::ImproveResponseTime => {
                "Try to improve your response time by reviewing concepts more frequently.".to_string()
            }
            Suggestion::FastResponses => {
                "Great response times! You might be ready for more advanced topics.".to_string()
            }
            Suggestion::MostlyMastered => {
                "You've mastered most questions! Consider exploring new topics.".to_string()
            }
        }
    }
}

/// Longer-term study recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    StartBaselineQuiz,
    // Error rate above 40%
    ReviewFundamentals,
    TargetWeakAreas,
    AccuracyOverSpeed,
    // Error rate above 20%
    UseSmartReview,
    PracticeMixedReview,
    MonitorProgress,
    // Otherwise
    ExploreNewTopics,
    MaintainWithMixedReview,
    TryAdvancedQuestions,
    FocusOnDifficult { count: usize },
}

impl Recommendation {
    pub fn kind(&self) -> &'static str {
        match self {
            Recommendation::StartBaselineQuiz => "start_baseline_quiz",
            Recommendation::ReviewFundamentals => "review_fundamentals",
            Recommendation::TargetWeakAreas => "target_weak_areas",
            Recommendation::AccuracyOverSpeed => "accuracy_over_speed",
            Recommendation::UseSmartReview => "use_smart_review",
            Recommendation::PracticeMixedReview => "practice_mixed_review",
            Recommendation::MonitorProgress => "monitor_progress",
            Recommendation::ExploreNewTopics => "explore_new_topics",
            Recommendation::MaintainWithMixedReview => "maintain_with_mixed_review",
            Recommendation::TryAdvancedQuestions => "try_advanced_questions",
            Recommendation::FocusOnDifficult { .. } => "focus_on_difficult",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Recommendation::StartBaselineQuiz => {
                "Start with a regular quiz to establish your baseline performance!".to_string()
            }
            Recommendation::ReviewFundamentals => {
                "Review fundamental concepts before taking more quizzes".to_string()
            }
            Recommendation::TargetWeakAreas => {
                "Use 'Focus on Mistakes' mode to target your weak areas".to_string()
            }
            Recommendation::AccuracyOverSpeed => {
                "Take your time - accuracy is more important than speed".to_string()
            }
            Recommendation::UseSmartReview => "Use 'Smart Review' to leverage spaced repetition".to_string(),
            Recommendation::PracticeMixedReview => "Try 'Mixed Review' for comprehensive practice".to_string(),
            Recommendation::MonitorProgress => "Monitor your progress in the Learning Progress section".to_string(),
            Recommendation::ExploreNewTopics => "Excellent work! Consider exploring new topics".to_string(),
            Recommendation::MaintainWithMixedReview => "Use 'Mixed Review' to maintain your knowledge".to_string(),
            Recommendation::TryAdvancedQuestions => "You might be ready for more advanced questions".to_string(),
            Recommendation::FocusOnDifficult { count } => format!(
                "Focus on your {} most difficult questions using spaced repetition",
                count
            ),
        }
    }
}

fn serialize_advice<S: Serializer>(
    serializer: S,
    name: &'static str,
    kind: &'static str,
    message: String,
) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct(name, 2)?;
    state.serialize_field("kind", kind)?;
    state.serialize_field("message", &message)?;
    state.end()
}

impl Serialize for Suggestion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_advice(serializer, "Suggestion", self.kind(), self.message())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_advice(serializer, "Recommendation", self.kind(), self.message())
    }
}
