//! Quiz composition from a candidate pool.
//!
//! Each selection ranks the pool with scheduler data, takes the top of the
//! ranking and tops up with random picks when the ranking runs short. Results
//! never contain duplicates, even when the caller's pool does.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use super::scheduler::Scheduler;
use crate::config::MIXED_DUE_SHARE;
use crate::domain::ItemId;
use crate::error::Result;
use crate::store::ReviewStore;

pub struct QuestionSelector<'a, S, R = StdRng> {
  scheduler: &'a Scheduler<S>,
  rng: R,
}

impl<'a, S: ReviewStore> QuestionSelector<'a, S> {
  pub fn new(scheduler: &'a Scheduler<S>) -> Self {
    Self::with_rng(scheduler, StdRng::from_os_rng())
  }
}

impl<'a, S: ReviewStore, R: Rng> QuestionSelector<'a, S, R> {
  pub fn with_rng(scheduler: &'a Scheduler<S>, rng: R) -> Self {
    Self { scheduler, rng }
  }

  pub fn select_due_review(&mut self, user: &str, pool: &[ItemId], max_count: usize) -> Result<Vec<ItemId>> {
    self.select_due_review_at(user, pool, max_count, Utc::now())
  }

  /// Most urgent due items first, topped up with random picks, shuffled.
  /// Candidates without a record are initialized before ranking.
  pub fn select_due_review_at(
    &mut self,
    user: &str,
    pool: &[ItemId],
    max_count: usize,
    now: DateTime<Utc>,
  ) -> Result<Vec<ItemId>> {
    let pool = dedup_pool(pool);
    if pool.is_empty() || max_count == 0 {
      return Ok(Vec::new());
    }

    for item in &pool {
      self.scheduler.initialize_at(user, item, now)?;
    }

    let mut selected = self.rank_due(user, &pool, now)?;
    selected.truncate(max_count);
    let due = selected.len();

    self.random_fill(&mut selected, &pool, max_count);
    selected.shuffle(&mut self.rng);

    tracing::debug!(user, due, total = selected.len(), "Selected due review");
    Ok(selected)
  }

  /// Attempted items with the highest difficulty score, topped up with random
  /// picks, shuffled.
  pub fn select_difficulty_focused(&mut self, user: &str, pool: &[ItemId], max_count: usize) -> Result<Vec<ItemId>> {
    let pool = dedup_pool(pool);
    if pool.is_empty() || max_count == 0 {
      return Ok(Vec::new());
    }

    let store = self.scheduler.store();
    let mut scored = Vec::new();
    for item in &pool {
      if let Some(record) = store.get(user, item)? {
        if record.total_attempts > 0 {
          scored.push((item.clone(), record.difficulty_score()));
        }
      }
    }
    // Stable: equal scores keep pool order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut selected: Vec<ItemId> = scored.into_iter().take(max_count).map(|(item, _)| item).collect();
    let ranked = selected.len();

    self.random_fill(&mut selected, &pool, max_count);
    selected.shuffle(&mut self.rng);

    tracing::debug!(user, ranked, total = selected.len(), "Selected difficulty-focused review");
    Ok(selected)
  }

  pub fn select_mixed_review(&mut self, user: &str, pool: &[ItemId], max_count: usize) -> Result<Vec<ItemId>> {
    self.select_mixed_review_at(user, pool, max_count, Utc::now())
  }

  /// 60% of the quota from the due ranking, the rest from a difficulty-focused
  /// selection over the whole pool. Missing records are not initialized here.
  pub fn select_mixed_review_at(
    &mut self,
    user: &str,
    pool: &[ItemId],
    max_count: usize,
    now: DateTime<Utc>,
  ) -> Result<Vec<ItemId>> {
    let pool = dedup_pool(pool);
    if pool.is_empty() || max_count == 0 {
      return Ok(Vec::new());
    }

    let due_quota = (max_count as f64 * MIXED_DUE_SHARE).floor() as usize;
    let difficulty_quota = max_count - due_quota;

    let mut selected = self.rank_due(user, &pool, now)?;
    selected.truncate(due_quota);

    let difficult = self.select_difficulty_focused(user, &pool, difficulty_quota)?;
    let mut seen: HashSet<ItemId> = selected.iter().cloned().collect();
    for item in difficult {
      if seen.insert(item.clone()) {
        selected.push(item);
      }
    }

    self.random_fill(&mut selected, &pool, max_count);
    selected.truncate(max_count);
    selected.shuffle(&mut self.rng);

    tracing::debug!(user, due_quota, difficulty_quota, total = selected.len(), "Selected mixed review");
    Ok(selected)
  }

  /// Due items of `pool` by priority, highest first. Ties keep pool order.
  fn rank_due(&self, user: &str, pool: &[ItemId], now: DateTime<Utc>) -> Result<Vec<ItemId>> {
    let mut ranked = Vec::new();
    for item in self.scheduler.due_set(user, pool, now)? {
      let priority = self.scheduler.priority(user, &item, now)?;
      ranked.push((item, priority));
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(ranked.into_iter().map(|(item, _)| item).collect())
  }

  /// Top `selected` up to `max_count` with uniform draws, without replacement,
  /// from pool items not already selected.
  fn random_fill(&mut self, selected: &mut Vec<ItemId>, pool: &[ItemId], max_count: usize) {
    if selected.len() >= max_count {
      return;
    }

    let taken: HashSet<&ItemId> = selected.iter().collect();
    let remaining: Vec<&ItemId> = pool.iter().filter(|item| !taken.contains(item)).collect();
    let needed = max_count - selected.len();

    let picks: Vec<ItemId> = remaining
      .choose_multiple(&mut self.rng, needed)
      .map(|item| (*item).clone())
      .collect();
    selected.extend(picks);
  }
}

/// First occurrence of each item, in pool order.
fn dedup_pool(pool: &[ItemId]) -> Vec<ItemId> {
  let mut seen = HashSet::with_capacity(pool.len());
  pool.iter().filter(|item| seen.insert(*item)).cloned().collect()
}
