//! Process-local counters for encounters, quest completions and store commits.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::game::combat::BattleOutcome;

static QUESTS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static LEVEL_UPS: AtomicU64 = AtomicU64::new(0);
static SHOP_PURCHASES: AtomicU64 = AtomicU64::new(0);
static SHOP_SALES: AtomicU64 = AtomicU64::new(0);
static COMMIT_ROLLBACKS: AtomicU64 = AtomicU64::new(0);
static COMMIT_ROLLBACK_FAILURES: AtomicU64 = AtomicU64::new(0);

static ENCOUNTER_COUNTERS: OnceLock<Mutex<HashMap<String, EncounterCounter>>> = OnceLock::new();

pub fn inc_quests_completed() {
    QUESTS_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

pub fn add_level_ups(levels: u32) {
    LEVEL_UPS.fetch_add(levels as u64, Ordering::Relaxed);
}

pub fn inc_shop_purchases() {
    SHOP_PURCHASES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_shop_sales() {
    SHOP_SALES.fetch_add(1, Ordering::Relaxed);
}

/// A compensating write ran; `succeeded` is false when it failed too.
pub fn record_rollback(succeeded: bool) {
    COMMIT_ROLLBACKS.fetch_add(1, Ordering::Relaxed);
    if !succeeded {
        COMMIT_ROLLBACK_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}

/// Per-monster encounter tallies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EncounterCounter {
    pub started: u64,
    pub victories: u64,
    pub defeats: u64,
    pub fled: u64,
    pub in_progress: u64,
}

fn encounter_lock() -> MutexGuard<'static, HashMap<String, EncounterCounter>> {
    let lock = ENCOUNTER_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()));
    // Counters stay usable even if a holder panicked.
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn record_encounter_start(monster_id: &str) -> EncounterCounter {
    let mut guard = encounter_lock();
    let counter = guard.entry(monster_id.to_string()).or_default();
    counter.started = counter.started.saturating_add(1);
    counter.in_progress = counter.in_progress.saturating_add(1);
    *counter
}

pub fn record_encounter_end(monster_id: &str, outcome: BattleOutcome) -> EncounterCounter {
    let mut guard = encounter_lock();
    let counter = guard.entry(monster_id.to_string()).or_default();
    match outcome {
        BattleOutcome::Victory => counter.victories = counter.victories.saturating_add(1),
        BattleOutcome::Defeat => counter.defeats = counter.defeats.saturating_add(1),
        BattleOutcome::Fled => counter.fled = counter.fled.saturating_add(1),
    }
    counter.in_progress = counter.in_progress.saturating_sub(1);
    *counter
}

pub fn encounter_counters_snapshot() -> HashMap<String, EncounterCounter> {
    encounter_lock().clone()
}

#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub quests_completed: u64,
    pub level_ups: u64,
    pub shop_purchases: u64,
    pub shop_sales: u64,
    pub commit_rollbacks: u64,
    pub commit_rollback_failures: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        quests_completed: QUESTS_COMPLETED.load(Ordering::Relaxed),
        level_ups: LEVEL_UPS.load(Ordering::Relaxed),
        shop_purchases: SHOP_PURCHASES.load(Ordering::Relaxed),
        shop_sales: SHOP_SALES.load(Ordering::Relaxed),
        commit_rollbacks: COMMIT_ROLLBACKS.load(Ordering::Relaxed),
        commit_rollback_failures: COMMIT_ROLLBACK_FAILURES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encounter_start_and_end_update_counters() {
        // unique key so parallel tests touching the map do not interfere
        let key = "metrics-test-slime";

        let started = record_encounter_start(key);
        assert_eq!(started.started, 1);
        assert_eq!(started.in_progress, 1);

        let ended = record_encounter_end(key, BattleOutcome::Fled);
        assert_eq!(ended.fled, 1);
        assert_eq!(ended.in_progress, 0);

        let snapshot = encounter_counters_snapshot();
        let slime = snapshot.get(key).expect("slime counter");
        assert_eq!(slime.started, 1);
        assert_eq!(slime.victories, 0);
    }

    #[test]
    fn end_without_start_does_not_underflow() {
        let ended = record_encounter_end("metrics-test-ghost", BattleOutcome::Victory);
        assert_eq!(ended.victories, 1);
        assert_eq!(ended.in_progress, 0);
    }

    #[test]
    fn global_counters_only_increase() {
        let before = snapshot();
        inc_quests_completed();
        add_level_ups(2);
        record_rollback(false);
        let after = snapshot();
        assert!(after.quests_completed > before.quests_completed);
        assert!(after.level_ups >= before.level_ups + 2);
        assert!(after.commit_rollback_failures > before.commit_rollback_failures);
    }
}
