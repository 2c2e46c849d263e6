//! Entity store contract.
//!
//! The rules engine never talks to a database directly. Whatever owns durable
//! storage implements [`EntityStore`]; every call is async and may fail with a
//! [`StoreError`] that callers propagate instead of swallowing.

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::StoreError;
use super::types::{
    Achievement, Character, CharacterClass, CharacterPatch, Friend, Item, Monster, Quest, Skill,
    UnlockedSkill,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EntityStore: Send + Sync {
    // Characters
    async fn fetch_character(&self, user_id: &str) -> StoreResult<Character>;
    async fn create_character(&self, character: &Character) -> StoreResult<()>;
    /// Apply a partial update and return the stored result.
    async fn update_character(&self, user_id: &str, patch: &CharacterPatch) -> StoreResult<Character>;

    // Inventory
    async fn fetch_inventory(&self, user_id: &str) -> StoreResult<Vec<Item>>;
    async fn update_inventory(&self, user_id: &str, items: &[Item]) -> StoreResult<()>;

    // Quests
    async fn fetch_quests(&self, user_id: &str) -> StoreResult<Vec<Quest>>;
    async fn create_quest(&self, quest: &Quest) -> StoreResult<()>;
    async fn update_quest(&self, quest: &Quest) -> StoreResult<()>;
    /// Deleting a quest that does not exist is not an error.
    async fn delete_quest(&self, user_id: &str, quest_id: Uuid) -> StoreResult<()>;

    // Monster catalog
    async fn fetch_monsters(&self) -> StoreResult<Vec<Monster>>;
    async fn fetch_monster(&self, monster_id: &str) -> StoreResult<Monster>;
    async fn fetch_random_monster(&self) -> StoreResult<Monster>;
    async fn put_monster(&self, monster: &Monster) -> StoreResult<()>;

    // Skill catalog and grants
    async fn fetch_skills(&self) -> StoreResult<Vec<Skill>>;
    async fn fetch_skills_by_class(&self, class: CharacterClass) -> StoreResult<Vec<Skill>>;
    async fn put_skill(&self, skill: &Skill) -> StoreResult<()>;
    async fn fetch_unlocked_skill_records(&self, user_id: &str) -> StoreResult<Vec<UnlockedSkill>>;
    async fn insert_unlocked_skill(&self, record: &UnlockedSkill) -> StoreResult<()>;
    /// Skills the user has unlocked, resolved against the catalog.
    async fn fetch_unlocked_skills(&self, user_id: &str) -> StoreResult<Vec<Skill>>;

    // Social records
    async fn fetch_friends(&self, user_id: &str) -> StoreResult<Vec<Friend>>;
    async fn put_friend(&self, friend: &Friend) -> StoreResult<()>;
    async fn fetch_achievements(&self, user_id: &str) -> StoreResult<Vec<Achievement>>;
    async fn put_achievement(&self, achievement: &Achievement) -> StoreResult<()>;
}
