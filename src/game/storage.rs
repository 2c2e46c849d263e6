use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};
use rand::seq::SliceRandom;
use sled::IVec;
use uuid::Uuid;

use crate::game::errors::StoreError;
use crate::game::seed_loader::starter_catalog;
use crate::game::store::{EntityStore, StoreResult};
use crate::game::types::{
    Achievement, Character, CharacterClass, CharacterPatch, Friend, Item, Monster, Quest, Skill,
    UnlockedSkill, CHARACTER_SCHEMA_VERSION, MONSTER_SCHEMA_VERSION, QUEST_SCHEMA_VERSION,
    SKILL_SCHEMA_VERSION,
};

const TREE_PRIMARY: &str = "questforge";
const TREE_QUESTS: &str = "questforge_quests";
const TREE_CATALOG: &str = "questforge_catalog";
const TREE_SOCIAL: &str = "questforge_social";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledEntityStoreBuilder {
    path: PathBuf,
    ensure_catalog_seed: bool,
}

impl SledEntityStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ensure_catalog_seed: true,
        }
    }

    /// Opt out of seeding the starter monster/skill catalog (useful for targeted tests).
    pub fn without_catalog_seed(mut self) -> Self {
        self.ensure_catalog_seed = false;
        self
    }

    pub fn open(self) -> Result<SledEntityStore, StoreError> {
        SledEntityStore::open_with_options(self.path, self.ensure_catalog_seed)
    }
}

/// Sled-backed entity store for characters, quests, inventories and the catalogs.
pub struct SledEntityStore {
    _db: sled::Db,
    primary: sled::Tree,
    quests: sled::Tree,
    catalog: sled::Tree,
    social: sled::Tree,
}

impl SledEntityStore {
    /// Open (or create) the store rooted at `path`, seeding the starter catalog
    /// when no monsters exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, seed_catalog: bool) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        let quests = db.open_tree(TREE_QUESTS)?;
        let catalog = db.open_tree(TREE_CATALOG)?;
        let social = db.open_tree(TREE_SOCIAL)?;
        let store = Self {
            _db: db,
            primary,
            quests,
            catalog,
            social,
        };

        if seed_catalog {
            store.seed_catalog_if_needed()?;
        }

        Ok(store)
    }

    fn character_key(user_id: &str) -> Vec<u8> {
        format!("characters:{}", user_id.to_ascii_lowercase()).into_bytes()
    }

    fn inventory_key(user_id: &str) -> Vec<u8> {
        format!("inventory:{}", user_id.to_ascii_lowercase()).into_bytes()
    }

    fn quest_prefix(user_id: &str) -> String {
        format!("quests:{}:", user_id.to_ascii_lowercase())
    }

    fn quest_key(user_id: &str, quest_id: Uuid) -> Vec<u8> {
        format!("{}{}", Self::quest_prefix(user_id), quest_id).into_bytes()
    }

    fn monster_key(monster_id: &str) -> Vec<u8> {
        format!("monsters:{}", monster_id).into_bytes()
    }

    fn skill_key(skill_id: &str) -> Vec<u8> {
        format!("skills:{}", skill_id).into_bytes()
    }

    fn unlocked_prefix(user_id: &str) -> String {
        format!("unlocked:{}:", user_id.to_ascii_lowercase())
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn check_schema(entity: &'static str, expected: u8, found: u8) -> Result<(), StoreError> {
        if expected != found {
            return Err(StoreError::SchemaMismatch {
                entity,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn scan<T: serde::de::DeserializeOwned>(tree: &sled::Tree, prefix: &str) -> Result<Vec<T>, StoreError> {
        tree.scan_prefix(prefix.as_bytes())
            .map(|entry| {
                entry
                    .map_err(StoreError::from)
                    .and_then(|(_key, value)| Self::deserialize(value))
            })
            .collect()
    }

    fn put_character_record(&self, mut character: Character) -> Result<(), StoreError> {
        character.schema_version = CHARACTER_SCHEMA_VERSION;
        let key = Self::character_key(&character.user_id);
        let bytes = Self::serialize(&character)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    fn get_character_record(&self, user_id: &str) -> Result<Character, StoreError> {
        let key = Self::character_key(user_id);
        let Some(bytes) = self.primary.get(&key)? else {
            return Err(StoreError::NotFound(format!("character: {}", user_id)));
        };
        let record: Character = Self::deserialize(bytes)?;
        Self::check_schema("character", CHARACTER_SCHEMA_VERSION, record.schema_version)?;
        Ok(record)
    }

    fn put_quest_record(&self, quest: &Quest) -> Result<(), StoreError> {
        let mut quest = quest.clone();
        quest.schema_version = QUEST_SCHEMA_VERSION;
        let key = Self::quest_key(&quest.user_id, quest.id);
        let bytes = Self::serialize(&quest)?;
        self.quests.insert(key, bytes)?;
        self.quests.flush()?;
        Ok(())
    }

    fn all_skills(&self) -> Result<Vec<Skill>, StoreError> {
        let skills: Vec<Skill> = Self::scan(&self.catalog, "skills:")?;
        for skill in &skills {
            Self::check_schema("skill", SKILL_SCHEMA_VERSION, skill.schema_version)?;
        }
        Ok(skills)
    }

    fn all_monsters(&self) -> Result<Vec<Monster>, StoreError> {
        let monsters: Vec<Monster> = Self::scan(&self.catalog, "monsters:")?;
        for monster in &monsters {
            Self::check_schema("monster", MONSTER_SCHEMA_VERSION, monster.schema_version)?;
        }
        Ok(monsters)
    }

    fn put_monster_record(&self, monster: &Monster) -> Result<(), StoreError> {
        let mut monster = monster.clone();
        monster.schema_version = MONSTER_SCHEMA_VERSION;
        let bytes = Self::serialize(&monster)?;
        self.catalog.insert(Self::monster_key(&monster.id), bytes)?;
        self.catalog.flush()?;
        Ok(())
    }

    fn put_skill_record(&self, skill: &Skill) -> Result<(), StoreError> {
        let mut skill = skill.clone();
        skill.schema_version = SKILL_SCHEMA_VERSION;
        let bytes = Self::serialize(&skill)?;
        self.catalog.insert(Self::skill_key(&skill.id), bytes)?;
        self.catalog.flush()?;
        Ok(())
    }

    /// Insert the built-in monsters and skills when the catalog has no monsters.
    /// Returns the number of records written.
    pub fn seed_catalog_if_needed(&self) -> Result<usize, StoreError> {
        if self.catalog.scan_prefix(b"monsters:").next().is_some() {
            return Ok(0);
        }
        let (monsters, skills) = starter_catalog();
        let mut inserted = 0usize;
        for monster in &monsters {
            self.put_monster_record(monster)?;
            inserted += 1;
        }
        for skill in &skills {
            self.put_skill_record(skill)?;
            inserted += 1;
        }
        debug!("seeded starter catalog with {} records", inserted);
        Ok(inserted)
    }

    /// List all user ids with a stored character.
    pub fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for entry in self.primary.scan_prefix(b"characters:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(user_id) = text.strip_prefix("characters:") {
                ids.push(user_id.to_string());
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl EntityStore for SledEntityStore {
    async fn fetch_character(&self, user_id: &str) -> StoreResult<Character> {
        self.get_character_record(user_id)
    }

    async fn create_character(&self, character: &Character) -> StoreResult<()> {
        let key = Self::character_key(&character.user_id);
        if self.primary.contains_key(&key)? {
            return Err(StoreError::Constraint(format!(
                "character already exists: {}",
                character.user_id
            )));
        }
        self.put_character_record(character.clone())
    }

    async fn update_character(&self, user_id: &str, patch: &CharacterPatch) -> StoreResult<Character> {
        let mut character = self.get_character_record(user_id)?;
        character.apply_patch(patch);
        self.put_character_record(character.clone())?;
        Ok(character)
    }

    async fn fetch_inventory(&self, user_id: &str) -> StoreResult<Vec<Item>> {
        match self.primary.get(Self::inventory_key(user_id))? {
            Some(bytes) => Self::deserialize(bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn update_inventory(&self, user_id: &str, items: &[Item]) -> StoreResult<()> {
        let bytes = Self::serialize(&items.to_vec())?;
        self.primary.insert(Self::inventory_key(user_id), bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    async fn fetch_quests(&self, user_id: &str) -> StoreResult<Vec<Quest>> {
        let mut quests: Vec<Quest> = Self::scan(&self.quests, &Self::quest_prefix(user_id))?;
        for quest in &quests {
            Self::check_schema("quest", QUEST_SCHEMA_VERSION, quest.schema_version)?;
        }
        quests.sort_by_key(|q| q.created_at);
        Ok(quests)
    }

    async fn create_quest(&self, quest: &Quest) -> StoreResult<()> {
        let key = Self::quest_key(&quest.user_id, quest.id);
        if self.quests.contains_key(&key)? {
            return Err(StoreError::Constraint(format!("quest already exists: {}", quest.id)));
        }
        self.put_quest_record(quest)
    }

    async fn update_quest(&self, quest: &Quest) -> StoreResult<()> {
        let key = Self::quest_key(&quest.user_id, quest.id);
        if !self.quests.contains_key(&key)? {
            return Err(StoreError::NotFound(format!("quest: {}", quest.id)));
        }
        self.put_quest_record(quest)
    }

    async fn delete_quest(&self, user_id: &str, quest_id: Uuid) -> StoreResult<()> {
        if self.quests.remove(Self::quest_key(user_id, quest_id))?.is_none() {
            warn!("delete of missing quest {} for {}", quest_id, user_id);
        }
        self.quests.flush()?;
        Ok(())
    }

    async fn fetch_monsters(&self) -> StoreResult<Vec<Monster>> {
        self.all_monsters()
    }

    async fn fetch_monster(&self, monster_id: &str) -> StoreResult<Monster> {
        let Some(bytes) = self.catalog.get(Self::monster_key(monster_id))? else {
            return Err(StoreError::NotFound(format!("monster: {}", monster_id)));
        };
        let monster: Monster = Self::deserialize(bytes)?;
        Self::check_schema("monster", MONSTER_SCHEMA_VERSION, monster.schema_version)?;
        Ok(monster)
    }

    async fn fetch_random_monster(&self) -> StoreResult<Monster> {
        let monsters = self.all_monsters()?;
        monsters
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| StoreError::NotFound("monster catalog is empty".to_string()))
    }

    async fn put_monster(&self, monster: &Monster) -> StoreResult<()> {
        self.put_monster_record(monster)
    }

    async fn fetch_skills(&self) -> StoreResult<Vec<Skill>> {
        self.all_skills()
    }

    async fn fetch_skills_by_class(&self, class: CharacterClass) -> StoreResult<Vec<Skill>> {
        Ok(self
            .all_skills()?
            .into_iter()
            .filter(|s| s.required_class == class)
            .collect())
    }

    async fn put_skill(&self, skill: &Skill) -> StoreResult<()> {
        self.put_skill_record(skill)
    }

    async fn fetch_unlocked_skill_records(&self, user_id: &str) -> StoreResult<Vec<UnlockedSkill>> {
        Self::scan(&self.catalog, &Self::unlocked_prefix(user_id))
    }

    async fn insert_unlocked_skill(&self, record: &UnlockedSkill) -> StoreResult<()> {
        let key = format!("{}{}", Self::unlocked_prefix(&record.user_id), record.skill_id);
        if self.catalog.contains_key(key.as_bytes())? {
            return Err(StoreError::Constraint(format!(
                "skill {} already unlocked for {}",
                record.skill_id, record.user_id
            )));
        }
        let bytes = Self::serialize(record)?;
        self.catalog.insert(key.into_bytes(), bytes)?;
        self.catalog.flush()?;
        Ok(())
    }

    async fn fetch_unlocked_skills(&self, user_id: &str) -> StoreResult<Vec<Skill>> {
        let records: Vec<UnlockedSkill> = Self::scan(&self.catalog, &Self::unlocked_prefix(user_id))?;
        let mut skills = Vec::with_capacity(records.len());
        for record in records {
            match self.catalog.get(Self::skill_key(&record.skill_id))? {
                Some(bytes) => skills.push(Self::deserialize(bytes)?),
                None => warn!(
                    "unlocked skill {} for {} missing from catalog",
                    record.skill_id, user_id
                ),
            }
        }
        Ok(skills)
    }

    async fn fetch_friends(&self, user_id: &str) -> StoreResult<Vec<Friend>> {
        Self::scan(&self.social, &format!("friends:{}:", user_id.to_ascii_lowercase()))
    }

    async fn put_friend(&self, friend: &Friend) -> StoreResult<()> {
        let key = format!(
            "friends:{}:{}",
            friend.user_id.to_ascii_lowercase(),
            friend.id
        );
        self.social.insert(key.into_bytes(), Self::serialize(friend)?)?;
        self.social.flush()?;
        Ok(())
    }

    async fn fetch_achievements(&self, user_id: &str) -> StoreResult<Vec<Achievement>> {
        Self::scan(
            &self.social,
            &format!("achievements:{}:", user_id.to_ascii_lowercase()),
        )
    }

    async fn put_achievement(&self, achievement: &Achievement) -> StoreResult<()> {
        let key = format!(
            "achievements:{}:{}",
            achievement.user_id.to_ascii_lowercase(),
            achievement.id
        );
        self.social
            .insert(key.into_bytes(), Self::serialize(achievement)?)?;
        self.social.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{Difficulty, QuestType};
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SledEntityStore {
        SledEntityStoreBuilder::new(dir.path())
            .without_catalog_seed()
            .open()
            .expect("store")
    }

    #[tokio::test]
    async fn store_round_trip_character() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        let character = Character::new("Alice", "Alice", CharacterClass::Wizard).with_gold(42);
        store.create_character(&character).await.expect("create");
        let fetched = store.fetch_character("alice").await.expect("get");
        assert_eq!(fetched.gold, 42);
        assert_eq!(fetched.schema_version, CHARACTER_SCHEMA_VERSION);
        assert_eq!(store.list_user_ids().expect("ids"), vec!["alice".to_string()]);

        let err = store.create_character(&character).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn update_character_applies_patch() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store
            .create_character(&Character::new("bob", "Bob", CharacterClass::Fighter))
            .await
            .expect("create");
        let updated = store
            .update_character("bob", &CharacterPatch::gold(99))
            .await
            .expect("update");
        assert_eq!(updated.gold, 99);
        assert_eq!(store.fetch_character("bob").await.unwrap().gold, 99);

        let missing = store.update_character("nobody", &CharacterPatch::gold(1)).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn quests_are_scoped_per_user() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        let q1 = Quest::new("alice", "Run", QuestType::Daily, Difficulty::Easy);
        let q2 = Quest::new("bob", "Read", QuestType::Weekly, Difficulty::Hard);
        store.create_quest(&q1).await.unwrap();
        store.create_quest(&q2).await.unwrap();

        let alice = store.fetch_quests("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].title, "Run");

        store.delete_quest("alice", q1.id).await.unwrap();
        store.delete_quest("alice", q1.id).await.unwrap();
        assert!(store.fetch_quests("alice").await.unwrap().is_empty());
        assert!(matches!(
            store.update_quest(&q1).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn inventory_defaults_to_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        assert!(store.fetch_inventory("carol").await.unwrap().is_empty());
        let items = vec![Item::stackable("potion", "Potion", 20, 2), Item::equippable("sword", "Sword", 50)];
        store.update_inventory("carol", &items).await.unwrap();
        assert_eq!(store.fetch_inventory("carol").await.unwrap(), items);
    }

    #[tokio::test]
    async fn seeding_catalog_only_happens_once() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = SledEntityStoreBuilder::new(dir.path()).open().expect("store");
            assert!(!store.fetch_monsters().await.unwrap().is_empty());
            assert!(!store.fetch_skills().await.unwrap().is_empty());
        }
        let store = open_store(&dir);
        assert_eq!(store.seed_catalog_if_needed().expect("seed check"), 0);
        let random = store.fetch_random_monster().await.unwrap();
        assert_eq!(store.fetch_monster(&random.id).await.unwrap(), random);
    }

    #[tokio::test]
    async fn unlocked_skills_resolve_against_catalog() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        let bolt = Skill::new("bolt", "Bolt", 5, 10, CharacterClass::Wizard);
        let bash = Skill::new("bash", "Bash", 5, 10, CharacterClass::Fighter);
        store.put_skill(&bolt).await.unwrap();
        store.put_skill(&bash).await.unwrap();

        let wizard_skills = store.fetch_skills_by_class(CharacterClass::Wizard).await.unwrap();
        assert_eq!(wizard_skills, vec![bolt.clone()]);

        store
            .insert_unlocked_skill(&UnlockedSkill::new("alice", "bolt"))
            .await
            .unwrap();
        assert!(store
            .insert_unlocked_skill(&UnlockedSkill::new("alice", "bolt"))
            .await
            .is_err());
        assert_eq!(store.fetch_unlocked_skills("alice").await.unwrap(), vec![bolt]);
        assert_eq!(store.fetch_unlocked_skill_records("alice").await.unwrap().len(), 1);
        assert!(store.fetch_unlocked_skills("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn random_monster_on_empty_catalog_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        assert!(matches!(
            store.fetch_random_monster().await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn social_records_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        store.put_friend(&Friend::new("alice", "bob")).await.unwrap();
        store
            .put_achievement(&Achievement::new("alice", "First Blood", "Won a fight"))
            .await
            .unwrap();
        assert_eq!(store.fetch_friends("alice").await.unwrap().len(), 1);
        assert_eq!(store.fetch_achievements("alice").await.unwrap()[0].title, "First Blood");
        assert!(store.fetch_friends("bob").await.unwrap().is_empty());
    }
}
