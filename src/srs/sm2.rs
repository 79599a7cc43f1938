use chrono::{DateTime, Duration, Utc};

use crate::config::{FIRST_INTERVAL_DAYS, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, SECOND_INTERVAL_DAYS};
use crate::domain::{Quality, ReviewRecord};

/// Outcome of grading one answer
#[derive(Debug, Clone)]
pub struct Sm2Result {
  pub record: ReviewRecord,
  pub quality: Quality,
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
pub fn next_ease_factor(current_ease_factor: f64, quality: Quality) -> f64 {
  let miss = 5.0 - quality.as_u8() as f64;
  let ease_delta = 0.1 - miss * (0.08 + miss * 0.02);
  (current_ease_factor + ease_delta).max(MIN_EASE_FACTOR)
}

/// Interval and streak after an answer, using the ease factor from before
/// this answer's adjustment.
pub fn next_interval(was_correct: bool, repetition: u32, interval: u32, ease_factor: f64) -> (u32, u32) {
  if !was_correct {
    return (1, 0);
  }

  let interval = match repetition {
    0 => FIRST_INTERVAL_DAYS,
    1 => SECOND_INTERVAL_DAYS,
    _ => {
      let grown = (interval as f64 * ease_factor).floor();
      (grown.min(MAX_INTERVAL_DAYS as f64) as u32).max(1)
    }
  };
  (interval, repetition + 1)
}

/// Apply one graded answer to a record.
///
/// The input is left untouched; callers persist the returned copy.
pub fn calculate_sm2(
  record: &ReviewRecord,
  was_correct: bool,
  response_time: f64,
  now: DateTime<Utc>,
) -> Sm2Result {
  let mut next = record.clone();

  next.total_attempts += 1;
  if was_correct {
    next.correct_attempts += 1;
  }

  // Exact running mean over all attempts
  let n = next.total_attempts as f64;
  next.last_response_time = response_time;
  next.avg_response_time = (record.avg_response_time * (n - 1.0) + response_time) / n;

  let (interval, repetition) = next_interval(was_correct, record.repetition, record.interval, record.ease_factor);
  next.interval = interval;
  next.repetition = repetition;

  let success_rate = next.correct_attempts as f64 / next.total_attempts as f64;
  let quality = Quality::from_answer(was_correct, response_time, success_rate);
  next.ease_factor = next_ease_factor(record.ease_factor, quality);

  next.next_review = now + Duration::days(interval as i64);

  Sm2Result { record: next, quality }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fresh() -> (ReviewRecord, DateTime<Utc>) {
    let now = Utc::now();
    (ReviewRecord::new(now), now)
  }

  #[test]
  fn test_first_review_fast() {
    let (record, now) = fresh();
    let result = calculate_sm2(&record, true, 3.0, now);

    assert_eq!(result.quality, Quality::Perfect);
    assert_eq!(result.record.repetition, 1);
    assert_eq!(result.record.interval, 1);
    // 2.5 + 0.1
    assert!((result.record.ease_factor - 2.6).abs() < 1e-9);
    assert_eq!(result.record.next_review, now + Duration::days(1));
  }

  #[test]
  fn test_second_review_good() {
    let (mut record, now) = fresh();
    record.repetition = 1;
    record.interval = 1;

    let result = calculate_sm2(&record, true, 8.0, now);
    assert_eq!(result.quality, Quality::Hesitant);
    assert_eq!(result.record.repetition, 2);
    assert_eq!(result.record.interval, 6);
    // Quality 4 leaves ease unchanged
    assert!((result.record.ease_factor - 2.5).abs() < 1e-9);
  }

  #[test]
  fn test_third_review_uses_old_ease_and_floors() {
    let (mut record, now) = fresh();
    record.repetition = 2;
    record.interval = 6;
    record.ease_factor = 2.6;

    let result = calculate_sm2(&record, true, 2.0, now);
    // floor(6 * 2.6) = 15, not the post-update ease 2.7 (16.2)
    assert_eq!(result.record.interval, 15);
    assert_eq!(result.record.repetition, 3);
  }

  #[test]
  fn test_interval_floor_not_round() {
    let (mut record, now) = fresh();
    record.repetition = 2;
    record.interval = 6;
    record.ease_factor = 2.45;

    let result = calculate_sm2(&record, true, 2.0, now);
    // 6 * 2.45 = 14.7 -> 14
    assert_eq!(result.record.interval, 14);
  }

  #[test]
  fn test_failed_review_resets() {
    let (mut record, now) = fresh();
    record.repetition = 5;
    record.interval = 40;
    record.total_attempts = 5;
    record.correct_attempts = 5;

    let result = calculate_sm2(&record, false, 4.0, now);
    assert_eq!(result.record.repetition, 0);
    assert_eq!(result.record.interval, 1);
    // 5 of 6 correct -> 0.83 > 0.7
    assert_eq!(result.quality, Quality::NearMiss);
    assert!(result.record.ease_factor < 2.5);
  }

  #[test]
  fn test_slow_correct_lowers_ease() {
    let (record, now) = fresh();
    let result = calculate_sm2(&record, true, 25.0, now);
    assert_eq!(result.quality, Quality::Difficult);
    // 2.5 + (0.1 - 2 * (0.08 + 2 * 0.02)) = 2.36
    assert!((result.record.ease_factor - 2.36).abs() < 1e-9);
  }

  #[test]
  fn test_ease_deltas_per_quality() {
    let cases = [
      (Quality::Perfect, 0.1),
      (Quality::Hesitant, 0.0),
      (Quality::Difficult, -0.14),
      (Quality::NearMiss, -0.32),
      (Quality::Struggled, -0.54),
      (Quality::Blackout, -0.8),
    ];
    for (quality, delta) in cases {
      let ease = next_ease_factor(2.5, quality);
      assert!((ease - (2.5 + delta)).abs() < 1e-9, "{:?}", quality);
    }
  }

  #[test]
  fn test_ease_factor_floor() {
    // Repeated blackouts should not go below 1.3
    let (mut record, now) = fresh();

    for _ in 0..10 {
      record = calculate_sm2(&record, false, 30.0, now).record;
    }

    assert!((record.ease_factor - MIN_EASE_FACTOR).abs() < 1e-9);
  }

  #[test]
  fn test_running_mean_response_time() {
    let (mut record, now) = fresh();
    for time in [4.0, 6.0, 20.0] {
      record = calculate_sm2(&record, true, time, now).record;
    }
    assert_eq!(record.avg_response_time, 10.0);
    assert_eq!(record.last_response_time, 20.0);
  }

  #[test]
  fn test_interval_is_capped() {
    let (mut record, now) = fresh();
    record.repetition = 30;
    record.interval = MAX_INTERVAL_DAYS;
    record.ease_factor = 3.0;

    let result = calculate_sm2(&record, true, 1.0, now);
    assert_eq!(result.record.interval, MAX_INTERVAL_DAYS);
  }

  #[test]
  fn test_interval_grows_exponentially() {
    let (mut record, now) = fresh();

    for i in 0..5 {
      record = calculate_sm2(&record, true, 8.0, now).record;
      match i {
        0 => assert_eq!(record.interval, 1),
        1 => assert_eq!(record.interval, 6),
        _ => assert!(record.interval > 6),
      }
    }

    // 1 -> 6 -> 15 -> 37 -> 92 at a constant ease of 2.5
    assert_eq!(record.interval, 92);
  }

  #[test]
  fn test_input_record_untouched() {
    let (record, now) = fresh();
    let before = record.clone();
    let _ = calculate_sm2(&record, false, 3.0, now);
    assert_eq!(record, before);
  }
}
