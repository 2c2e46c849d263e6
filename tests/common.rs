//! Test utilities & fixtures.
//! Throwaway sled stores plus a fault-injecting store wrapper for commit/rollback tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use uuid::Uuid;

use questforge::game::{
    Achievement, Character, CharacterClass, CharacterPatch, EntityStore, Friend, GameService,
    GameSettings, Item, Monster, Quest, SledEntityStore, SledEntityStoreBuilder, Skill,
    StoreError, StoreResult, UnlockedSkill,
};

/// Open an empty sled store (no starter catalog) in a fresh temp dir.
pub fn open_store() -> (TempDir, SledEntityStore) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = SledEntityStoreBuilder::new(tmp.path())
        .without_catalog_seed()
        .open()
        .expect("open store");
    (tmp, store)
}

/// Service over an empty sled store with zero counter delay.
#[allow(dead_code)]
pub fn sled_service() -> (TempDir, GameService<SledEntityStore>) {
    let (tmp, store) = open_store();
    (tmp, GameService::new(Arc::new(store), fast_settings()))
}

#[allow(dead_code)]
pub fn fast_settings() -> GameSettings {
    GameSettings {
        counter_delay: std::time::Duration::ZERO,
        ..GameSettings::default()
    }
}

/// Store wrapper that can fail selected writes on demand.
pub struct FlakyStore {
    pub inner: SledEntityStore,
    pub fail_inventory_writes: AtomicBool,
    pub fail_quest_writes: AtomicBool,
    /// Character updates allowed to succeed before the rest fail; `usize::MAX` disables.
    pub character_writes_before_failure: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: SledEntityStore) -> Self {
        Self {
            inner,
            fail_inventory_writes: AtomicBool::new(false),
            fail_quest_writes: AtomicBool::new(false),
            character_writes_before_failure: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn fail_inventory(&self, on: bool) {
        self.fail_inventory_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_quests(&self, on: bool) {
        self.fail_quest_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_character_after(&self, successes: usize) {
        self.character_writes_before_failure
            .store(successes, Ordering::SeqCst);
    }

    fn injected(what: &str) -> StoreError {
        StoreError::Backend(format!("injected {} failure", what))
    }
}

#[allow(dead_code)]
pub fn flaky_service() -> (TempDir, Arc<FlakyStore>, GameService<FlakyStore>) {
    let (tmp, store) = open_store();
    let flaky = Arc::new(FlakyStore::new(store));
    let service = GameService::new(Arc::clone(&flaky), fast_settings());
    (tmp, flaky, service)
}

#[async_trait]
impl EntityStore for FlakyStore {
    async fn fetch_character(&self, user_id: &str) -> StoreResult<Character> {
        self.inner.fetch_character(user_id).await
    }

    async fn create_character(&self, character: &Character) -> StoreResult<()> {
        self.inner.create_character(character).await
    }

    async fn update_character(&self, user_id: &str, patch: &CharacterPatch) -> StoreResult<Character> {
        let remaining = self.character_writes_before_failure.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(Self::injected("character"));
        }
        if remaining != usize::MAX {
            self.character_writes_before_failure
                .store(remaining - 1, Ordering::SeqCst);
        }
        self.inner.update_character(user_id, patch).await
    }

    async fn fetch_inventory(&self, user_id: &str) -> StoreResult<Vec<Item>> {
        self.inner.fetch_inventory(user_id).await
    }

    async fn update_inventory(&self, user_id: &str, items: &[Item]) -> StoreResult<()> {
        if self.fail_inventory_writes.load(Ordering::SeqCst) {
            return Err(Self::injected("inventory"));
        }
        self.inner.update_inventory(user_id, items).await
    }

    async fn fetch_quests(&self, user_id: &str) -> StoreResult<Vec<Quest>> {
        self.inner.fetch_quests(user_id).await
    }

    async fn create_quest(&self, quest: &Quest) -> StoreResult<()> {
        self.inner.create_quest(quest).await
    }

    async fn update_quest(&self, quest: &Quest) -> StoreResult<()> {
        if self.fail_quest_writes.load(Ordering::SeqCst) {
            return Err(Self::injected("quest"));
        }
        self.inner.update_quest(quest).await
    }

    async fn delete_quest(&self, user_id: &str, quest_id: Uuid) -> StoreResult<()> {
        self.inner.delete_quest(user_id, quest_id).await
    }

    async fn fetch_monsters(&self) -> StoreResult<Vec<Monster>> {
        self.inner.fetch_monsters().await
    }

    async fn fetch_monster(&self, monster_id: &str) -> StoreResult<Monster> {
        self.inner.fetch_monster(monster_id).await
    }

    async fn fetch_random_monster(&self) -> StoreResult<Monster> {
        self.inner.fetch_random_monster().await
    }

    async fn put_monster(&self, monster: &Monster) -> StoreResult<()> {
        self.inner.put_monster(monster).await
    }

    async fn fetch_skills(&self) -> StoreResult<Vec<Skill>> {
        self.inner.fetch_skills().await
    }

    async fn fetch_skills_by_class(&self, class: CharacterClass) -> StoreResult<Vec<Skill>> {
        self.inner.fetch_skills_by_class(class).await
    }

    async fn put_skill(&self, skill: &Skill) -> StoreResult<()> {
        self.inner.put_skill(skill).await
    }

    async fn fetch_unlocked_skill_records(&self, user_id: &str) -> StoreResult<Vec<UnlockedSkill>> {
        self.inner.fetch_unlocked_skill_records(user_id).await
    }

    async fn insert_unlocked_skill(&self, record: &UnlockedSkill) -> StoreResult<()> {
        self.inner.insert_unlocked_skill(record).await
    }

    async fn fetch_unlocked_skills(&self, user_id: &str) -> StoreResult<Vec<Skill>> {
        self.inner.fetch_unlocked_skills(user_id).await
    }

    async fn fetch_friends(&self, user_id: &str) -> StoreResult<Vec<Friend>> {
        self.inner.fetch_friends(user_id).await
    }

    async fn put_friend(&self, friend: &Friend) -> StoreResult<()> {
        self.inner.put_friend(friend).await
    }

    async fn fetch_achievements(&self, user_id: &str) -> StoreResult<Vec<Achievement>> {
        self.inner.fetch_achievements(user_id).await
    }

    async fn put_achievement(&self, achievement: &Achievement) -> StoreResult<()> {
        self.inner.put_achievement(achievement).await
    }
}
