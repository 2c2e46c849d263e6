use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CHARACTER_SCHEMA_VERSION: u8 = 1;
pub const QUEST_SCHEMA_VERSION: u8 = 1;
pub const MONSTER_SCHEMA_VERSION: u8 = 1;
pub const SKILL_SCHEMA_VERSION: u8 = 1;

/// Experience threshold per level: reaching level `n` sets the next threshold to `n * 100`.
pub const EXPERIENCE_PER_LEVEL: u64 = 100;
/// Stat points granted for every level gained.
pub const POINTS_PER_LEVEL: u32 = 3;

// ============================================================================
// Character
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Novice,
    Fighter,
    Wizard,
    Rogue,
}

impl Default for CharacterClass {
    fn default() -> Self {
        Self::Novice
    }
}

impl std::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CharacterClass::Novice => "Novice",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Wizard => "Wizard",
            CharacterClass::Rogue => "Rogue",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for CharacterClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "novice" => Ok(Self::Novice),
            "fighter" => Ok(Self::Fighter),
            "wizard" => Ok(Self::Wizard),
            "rogue" => Ok(Self::Rogue),
            other => Err(format!("unknown class: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterStats {
    pub strength: u32,
    pub dexterity: u32,
    pub intelligence: u32,
    /// Unspent points earned by leveling up
    pub available_points: u32,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            strength: 5,
            dexterity: 5,
            intelligence: 5,
            available_points: 0,
        }
    }
}

/// Which base stat an allocation targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Strength,
    Dexterity,
    Intelligence,
}

impl std::str::FromStr for StatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "strength" => Ok(Self::Strength),
            "dex" | "dexterity" => Ok(Self::Dexterity),
            "int" | "intelligence" => Ok(Self::Intelligence),
            other => Err(format!("unknown stat: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vitals {
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_mp: u32,
    pub max_mp: u32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            current_hp: 100,
            max_hp: 100,
            current_mp: 50,
            max_mp: 50,
        }
    }
}

impl Vitals {
    /// Build vitals from live combat counters, clamping into `0..=max`.
    pub fn with_current(&self, hp: i64, mp: i64) -> Self {
        Self {
            current_hp: hp.clamp(0, self.max_hp as i64) as u32,
            max_hp: self.max_hp,
            current_mp: mp.clamp(0, self.max_mp as i64) as u32,
            max_mp: self.max_mp,
        }
    }

    pub fn restored(&self) -> Self {
        Self {
            current_hp: self.max_hp,
            max_hp: self.max_hp,
            current_mp: self.max_mp,
            max_mp: self.max_mp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Character {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub level: u32,
    /// Lifetime experience; never reset when a level is gained
    pub experience: u64,
    pub experience_to_next: u64,
    pub class: CharacterClass,
    pub stats: CharacterStats,
    pub vitals: Vitals,
    pub gold: u64,
    pub skill_points: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl Character {
    pub fn new(user_id: &str, name: &str, class: CharacterClass) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            level: 1,
            experience: 0,
            experience_to_next: EXPERIENCE_PER_LEVEL,
            class,
            stats: CharacterStats::default(),
            vitals: Vitals::default(),
            gold: 0,
            skill_points: 0,
            created_at: now,
            updated_at: now,
            schema_version: CHARACTER_SCHEMA_VERSION,
        }
    }

    pub fn with_gold(mut self, gold: u64) -> Self {
        self.gold = gold;
        self
    }

    pub fn with_stats(mut self, strength: u32, dexterity: u32, intelligence: u32) -> Self {
        self.stats.strength = strength;
        self.stats.dexterity = dexterity;
        self.stats.intelligence = intelligence;
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply a partial update. Only fields present in the patch change.
    pub fn apply_patch(&mut self, patch: &CharacterPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(experience) = patch.experience {
            self.experience = experience;
        }
        if let Some(next) = patch.experience_to_next {
            self.experience_to_next = next;
        }
        if let Some(class) = patch.class {
            self.class = class;
        }
        if let Some(stats) = &patch.stats {
            self.stats = stats.clone();
        }
        if let Some(vitals) = &patch.vitals {
            self.vitals = vitals.clone();
        }
        if let Some(gold) = patch.gold {
            self.gold = gold;
        }
        if let Some(skill_points) = patch.skill_points {
            self.skill_points = skill_points;
        }
        self.touch();
    }
}

/// Partial character update accepted by the entity store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CharacterPatch {
    pub name: Option<String>,
    pub level: Option<u32>,
    pub experience: Option<u64>,
    pub experience_to_next: Option<u64>,
    pub class: Option<CharacterClass>,
    pub stats: Option<CharacterStats>,
    pub vitals: Option<Vitals>,
    pub gold: Option<u64>,
    pub skill_points: Option<u32>,
}

impl CharacterPatch {
    /// Patch carrying every mutable field of `character`; used to write back or roll back.
    pub fn full(character: &Character) -> Self {
        Self {
            name: Some(character.name.clone()),
            level: Some(character.level),
            experience: Some(character.experience),
            experience_to_next: Some(character.experience_to_next),
            class: Some(character.class),
            stats: Some(character.stats.clone()),
            vitals: Some(character.vitals.clone()),
            gold: Some(character.gold),
            skill_points: Some(character.skill_points),
        }
    }

    pub fn gold(gold: u64) -> Self {
        Self {
            gold: Some(gold),
            ..Default::default()
        }
    }

    pub fn vitals(vitals: Vitals) -> Self {
        Self {
            vitals: Some(vitals),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Quests
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Daily,
    Weekly,
    Main,
    Single,
}

impl std::str::FromStr for QuestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "main" => Ok(Self::Main),
            "single" => Ok(Self::Single),
            other => Err(format!("unknown quest type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Epic,
}

impl Difficulty {
    /// Suggested payload for a quest of this difficulty when none is given.
    pub fn default_rewards(self) -> QuestRewards {
        let (experience, gold, skill_points) = match self {
            Difficulty::Easy => (10, 5, None),
            Difficulty::Medium => (25, 10, None),
            Difficulty::Hard => (50, 25, None),
            Difficulty::Epic => (100, 50, Some(1)),
        };
        QuestRewards {
            experience,
            gold,
            skill_points,
            items: Vec::new(),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "epic" => Ok(Self::Epic),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestRewards {
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub skill_points: Option<u32>,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quest {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub quest_type: QuestType,
    pub difficulty: Difficulty,
    pub rewards: QuestRewards,
    pub is_completed: bool,
    pub is_active: bool,
    pub progress: u32,
    pub max_progress: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub schema_version: u8,
}

impl Quest {
    pub fn new(user_id: &str, title: &str, quest_type: QuestType, difficulty: Difficulty) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: String::new(),
            quest_type,
            difficulty,
            rewards: difficulty.default_rewards(),
            is_completed: false,
            is_active: true,
            progress: 0,
            max_progress: 1,
            created_at: Utc::now(),
            due_date: None,
            completed_at: None,
            schema_version: QUEST_SCHEMA_VERSION,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_rewards(mut self, rewards: QuestRewards) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_reward_item(mut self, item: Item) -> Self {
        self.rewards.items.push(item);
        self
    }

    pub fn with_max_progress(mut self, max_progress: u32) -> Self {
        self.max_progress = max_progress.max(1);
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Advance progress, clamped at `max_progress`. Completed quests do not move.
    pub fn advance_progress(&mut self, amount: u32) {
        if self.is_completed {
            return;
        }
        self.progress = self.progress.saturating_add(amount).min(self.max_progress);
    }

    /// One-way transition into the completed state.
    pub fn mark_complete(&mut self) {
        self.is_completed = true;
        self.progress = self.max_progress;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < now)
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    /// Gold cost when bought from a shop
    pub value: u64,
    /// Present only for stackable items
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Present only for equippable items
    #[serde(default)]
    pub is_equipped: Option<bool>,
}

impl Item {
    pub fn new(id: &str, name: &str, value: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            value,
            quantity: None,
            is_equipped: None,
        }
    }

    pub fn stackable(id: &str, name: &str, value: u64, quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::new(id, name, value)
        }
    }

    pub fn equippable(id: &str, name: &str, value: u64) -> Self {
        Self {
            is_equipped: Some(false),
            ..Self::new(id, name, value)
        }
    }

    pub fn is_stackable(&self) -> bool {
        self.quantity.is_some()
    }

    pub fn equipped(&self) -> bool {
        self.is_equipped.unwrap_or(false)
    }

    /// Units represented by this entry; entries without a quantity count as one.
    pub fn units(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }
}

// ============================================================================
// Monsters & skills
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub exp_reward: u64,
    pub gold_reward: u64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

impl Monster {
    pub fn new(id: &str, name: &str, hp: i64, attack: i64, defense: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            hp,
            attack,
            defense,
            exp_reward: 0,
            gold_reward: 0,
            image_url: None,
            schema_version: MONSTER_SCHEMA_VERSION,
        }
    }

    pub fn with_rewards(mut self, exp_reward: u64, gold_reward: u64) -> Self {
        self.exp_reward = exp_reward;
        self.gold_reward = gold_reward;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub mana_cost: u32,
    pub damage: i64,
    pub required_class: CharacterClass,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

impl Skill {
    pub fn new(id: &str, name: &str, mana_cost: u32, damage: i64, required_class: CharacterClass) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            mana_cost,
            damage,
            required_class,
            schema_version: SKILL_SCHEMA_VERSION,
        }
    }
}

fn default_schema_version() -> u8 {
    1
}

/// Per-character grant allowing a skill to be used in combat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnlockedSkill {
    pub user_id: String,
    pub skill_id: String,
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockedSkill {
    pub fn new(user_id: &str, skill_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            skill_id: skill_id.to_string(),
            unlocked_at: Utc::now(),
        }
    }
}

// ============================================================================
// Social records (no engine logic)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friend {
    pub id: Uuid,
    pub user_id: String,
    pub friend_user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Friend {
    pub fn new(user_id: &str, friend_user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            friend_user_id: friend_user_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Achievement {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
}

impl Achievement {
    pub fn new(user_id: &str, title: &str, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            earned_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_character_starts_at_level_one() {
        let c = Character::new("alice", "Alice", CharacterClass::Wizard);
        assert_eq!(c.level, 1);
        assert_eq!(c.experience, 0);
        assert_eq!(c.experience_to_next, 100);
        assert_eq!(c.vitals.current_hp, c.vitals.max_hp);
    }

    #[test]
    fn quest_completion_is_one_way_and_fills_progress() {
        let mut q = Quest::new("alice", "Write report", QuestType::Single, Difficulty::Medium)
            .with_max_progress(4);
        q.advance_progress(10);
        assert_eq!(q.progress, 4);
        q.mark_complete();
        assert!(q.is_completed);
        assert!(q.completed_at.is_some());
        q.advance_progress(1);
        assert_eq!(q.progress, 4);
    }

    #[test]
    fn vitals_clamp_combat_counters() {
        let v = Vitals::default();
        let after = v.with_current(-12, 80);
        assert_eq!(after.current_hp, 0);
        assert_eq!(after.current_mp, 50);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut c = Character::new("bob", "Bob", CharacterClass::Fighter).with_gold(40);
        c.apply_patch(&CharacterPatch::gold(15));
        assert_eq!(c.gold, 15);
        assert_eq!(c.level, 1);
        assert_eq!(c.name, "Bob");
    }

    #[test]
    fn class_and_difficulty_parse_case_insensitively() {
        assert_eq!("WIZARD".parse::<CharacterClass>().unwrap(), CharacterClass::Wizard);
        assert_eq!("Epic".parse::<Difficulty>().unwrap(), Difficulty::Epic);
        assert!("bard".parse::<CharacterClass>().is_err());
    }
}
