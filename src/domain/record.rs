use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config;

/// Review history of one item for one user.
///
/// Owned by the store; the scheduler reads a copy, mutates it and writes the
/// whole record back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
  pub ease_factor: f64,
  /// Consecutive correct answers since the last lapse
  pub repetition: u32,
  /// Days until the next review, always >= 1
  pub interval: u32,
  pub next_review: DateTime<Utc>,
  pub total_attempts: u32,
  pub correct_attempts: u32,
  /// Seconds
  pub last_response_time: f64,
  /// Running mean over all attempts, seconds
  pub avg_response_time: f64,
  pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
  /// Fresh record for an item first shown at `now`.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      ease_factor: config::DEFAULT_EASE_FACTOR,
      repetition: 0,
      interval: 1,
      next_review: now,
      total_attempts: 0,
      correct_attempts: 0,
      last_response_time: 0.0,
      avg_response_time: 0.0,
      created_at: now,
    }
  }

  /// Fraction of correct answers; 0.0 when never attempted.
  pub fn success_rate(&self) -> f64 {
    self.correct_attempts as f64 / self.total_attempts.max(1) as f64
  }

  /// Ranking score for "historically hard" items; higher is harder.
  pub fn difficulty_score(&self) -> f64 {
    (1.0 - self.success_rate()) * 100.0 + (3.0 - self.ease_factor) * 20.0
  }

  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    now >= self.next_review
  }
}

/// SM-2 answer grade (0-5). Only used to adjust the ease factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
  Blackout = 0,
  Struggled = 1,
  NearMiss = 2,
  Difficult = 3,
  Hesitant = 4,
  Perfect = 5,
}

impl Quality {
  pub fn from_u8(value: u8) -> Option<Self> {
    match value {
      0 => Some(Self::Blackout),
      1 => Some(Self::Struggled),
      2 => Some(Self::NearMiss),
      3 => Some(Self::Difficult),
      4 => Some(Self::Hesitant),
      5 => Some(Self::Perfect),
      _ => None,
    }
  }

  /// Derive the grade of an answer.
  ///
  /// Correct answers are graded by latency. Wrong answers are graded by how
  /// often the item is usually answered correctly (`success_rate` includes the
  /// current attempt).
  pub fn from_answer(was_correct: bool, response_time: f64, success_rate: f64) -> Self {
    if was_correct {
      if response_time <= config::FAST_RESPONSE_SECS {
        Self::Perfect
      } else if response_time <= config::HESITANT_RESPONSE_SECS {
        Self::Hesitant
      } else {
        Self::Difficult
      }
    } else if success_rate > 0.7 {
      Self::NearMiss
    } else if success_rate > 0.3 {
      Self::Struggled
    } else {
      Self::Blackout
    }
  }

  pub fn as_u8(self) -> u8 {
    self as u8
  }

  pub fn is_correct(self) -> bool {
    self >= Self::Difficult
  }
}
