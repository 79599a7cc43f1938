//! SM-2 scheduler over a `ReviewStore`.
//!
//! Owns the update rule, due checks, priority scoring and the per-user
//! statistics/calendar views. Every time-dependent operation has an `_at`
//! form taking an explicit `now`; the short forms use the wall clock.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;

use super::sm2::calculate_sm2;
use crate::config::{MAX_SCHEDULE_DAYS, NEW_ITEM_PRIORITY, OVERDUE_BONUS_CAP_DAYS};
use crate::domain::{ItemId, ReviewRecord};
use crate::error::{Result, SchedulerError};
use crate::store::ReviewStore;

const SECONDS_PER_DAY: i64 = 86_400;

/// Aggregate SM-2 state of one user's items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchedulerStats {
  pub total_items: usize,
  /// repetition >= 3 and ease >= 2.5
  pub mastered: usize,
  /// 1 <= repetition < 3
  pub learning: usize,
  /// ease < 2.0
  pub difficult: usize,
  /// Rounded to 2 decimals
  pub average_ease: f64,
  pub total_reviews: u64,
}

/// Review calendar: every date in the window, in order, with the items due
/// that day.
pub type ReviewCalendar = BTreeMap<NaiveDate, Vec<ItemId>>;

pub struct Scheduler<S> {
  store: S,
}

impl<S: ReviewStore> Scheduler<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// Create a default record if none exists. Returns true if one was created.
  pub fn initialize(&self, user: &str, item: &ItemId) -> Result<bool> {
    self.initialize_at(user, item, Utc::now())
  }

  pub fn initialize_at(&self, user: &str, item: &ItemId, now: DateTime<Utc>) -> Result<bool> {
    if self.store.get(user, item)?.is_some() {
      return Ok(false);
    }
    self.store.put(user, item, &ReviewRecord::new(now))?;
    tracing::debug!(user, item = %item, "Initialized review record");
    Ok(true)
  }

  /// Record an answer. `response_time` is in seconds.
  pub fn update(&self, user: &str, item: &ItemId, was_correct: bool, response_time: f64) -> Result<ReviewRecord> {
    self.update_at(user, item, was_correct, response_time, Utc::now())
  }

  pub fn update_at(
    &self,
    user: &str,
    item: &ItemId,
    was_correct: bool,
    response_time: f64,
    now: DateTime<Utc>,
  ) -> Result<ReviewRecord> {
    if !response_time.is_finite() || response_time < 0.0 {
      return Err(SchedulerError::InvalidInput(format!(
        "response time must be a non-negative number of seconds, got {}",
        response_time
      )));
    }

    let current = self
      .store
      .get(user, item)?
      .unwrap_or_else(|| ReviewRecord::new(now));
    let result = calculate_sm2(&current, was_correct, response_time, now);

    // Single write: either the whole new record lands or the old one stays
    if let Err(e) = self.store.put(user, item, &result.record) {
      tracing::warn!(user, item = %item, "Failed to persist review: {}", e);
      return Err(e.into());
    }

    tracing::debug!(
      user,
      item = %item,
      correct = was_correct,
      quality = result.quality.as_u8(),
      interval = result.record.interval,
      ease = result.record.ease_factor,
      "Updated review record"
    );
    Ok(result.record)
  }

  /// Strict lookup for callers that need an existing record.
  pub fn record(&self, user: &str, item: &ItemId) -> Result<ReviewRecord> {
    self.store.get(user, item)?.ok_or_else(|| SchedulerError::NotFound {
      user: user.to_string(),
      item: item.clone(),
    })
  }

  /// Unknown items are always due.
  pub fn is_due(&self, user: &str, item: &ItemId, now: DateTime<Utc>) -> Result<bool> {
    Ok(match self.store.get(user, item)? {
      Some(record) => record.is_due(now),
      None => true,
    })
  }

  /// Due subset of `items`, in input order.
  pub fn due_set(&self, user: &str, items: &[ItemId], now: DateTime<Utc>) -> Result<Vec<ItemId>> {
    let mut due = Vec::new();
    for item in items {
      if self.is_due(user, item, now)? {
        due.push(item.clone());
      }
    }
    Ok(due)
  }

  /// Urgency score; higher means review sooner.
  pub fn priority(&self, user: &str, item: &ItemId, now: DateTime<Utc>) -> Result<f64> {
    Ok(record_priority(self.store.get(user, item)?.as_ref(), now))
  }

  pub fn statistics(&self, user: &str) -> Result<SchedulerStats> {
    let records = self.store.all_for_user(user)?;
    if records.is_empty() {
      return Ok(SchedulerStats::default());
    }

    let mut stats = SchedulerStats {
      total_items: records.len(),
      ..Default::default()
    };
    let mut ease_sum = 0.0;

    for (_, record) in &records {
      if record.repetition >= 3 && record.ease_factor >= 2.5 {
        stats.mastered += 1;
      }
      if (1..3).contains(&record.repetition) {
        stats.learning += 1;
      }
      if record.ease_factor < 2.0 {
        stats.difficult += 1;
      }
      ease_sum += record.ease_factor;
      stats.total_reviews += record.total_attempts as u64;
    }

    stats.average_ease = round_to(ease_sum / records.len() as f64, 2);
    Ok(stats)
  }

  pub fn schedule(&self, user: &str, horizon_days: u32) -> Result<ReviewCalendar> {
    self.schedule_at(user, horizon_days, Utc::now())
  }

  /// Items whose next review falls in `[now, now + horizon_days]`, bucketed by
  /// local calendar date. Dates without reviews are present with an empty list.
  ///
  /// Both ends are inclusive, so the calendar normally holds `horizon_days + 1`
  /// dates (one date, today, for a horizon of 0). A DST shift near midnight can
  /// add or remove one. Horizons above `MAX_SCHEDULE_DAYS` are `InvalidInput`.
  pub fn schedule_at(&self, user: &str, horizon_days: u32, now: DateTime<Utc>) -> Result<ReviewCalendar> {
    if horizon_days > MAX_SCHEDULE_DAYS {
      return Err(SchedulerError::InvalidInput(format!(
        "schedule horizon must be at most {} days, got {}",
        MAX_SCHEDULE_DAYS, horizon_days
      )));
    }
    let end = now
      .checked_add_signed(Duration::days(horizon_days as i64))
      .ok_or_else(|| SchedulerError::InvalidInput(format!("schedule horizon of {} days overflows", horizon_days)))?;
    let first_day = local_date(now);
    let last_day = local_date(end);

    let mut calendar = ReviewCalendar::new();
    for day in first_day.iter_days().take_while(|day| *day <= last_day) {
      calendar.insert(day, Vec::new());
    }

    let mut upcoming: Vec<(DateTime<Utc>, ItemId)> = self
      .store
      .all_for_user(user)?
      .into_iter()
      .filter(|(_, record)| record.next_review >= now && record.next_review <= end)
      .map(|(item, record)| (record.next_review, item))
      .collect();
    upcoming.sort();

    for (next_review, item) in upcoming {
      calendar.entry(local_date(next_review)).or_default().push(item);
    }
    Ok(calendar)
  }
}

/// Priority of a (possibly missing) record.
///
/// `max(0, d) * 10 + (1 - success) * 50 + (3.0 - ease) * 20 + min(max(0, d), 30)`
/// where `d` is whole days overdue. Overdue days count twice: once unbounded
/// and once capped.
pub fn record_priority(record: Option<&ReviewRecord>, now: DateTime<Utc>) -> f64 {
  let Some(record) = record else {
    return NEW_ITEM_PRIORITY;
  };

  let overdue = days_overdue(record.next_review, now).max(0);
  let overdue_factor = overdue as f64 * 10.0;
  let difficulty_factor = (1.0 - record.success_rate()) * 50.0;
  let ease_factor = (3.0 - record.ease_factor) * 20.0;
  let time_factor = overdue.min(OVERDUE_BONUS_CAP_DAYS) as f64;

  overdue_factor + difficulty_factor + ease_factor + time_factor
}

/// Whole days from `next_review` to `now`, floored (negative when not due yet).
pub fn days_overdue(next_review: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (now - next_review).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn local_date(ts: DateTime<Utc>) -> NaiveDate {
  ts.with_timezone(&Local).date_naive()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}
