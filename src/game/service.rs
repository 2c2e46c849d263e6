//! Command layer
//!
//! Each operation loads the state it needs from the [`EntityStore`], runs the
//! pure engine over owned values and commits the result. Operations that write
//! more than one record keep a journal of the prior values and write them back
//! if a later step fails, so a failed command leaves the store as it found it
//! (or reports [`GameError::Commit`] when even the compensation failed).

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::logutil::escape_log;
use crate::metrics;
use crate::validation::{
    sanitize_description, validate_character_name, validate_quest_title, validate_user_id,
};

use super::combat::{
    select_monster, BattleOutcome, Encounter, DEFAULT_COUNTER_DELAY, DEFAULT_LOG_CAPACITY,
};
use super::errors::{CombatError, GameError, GameResult, StoreError, ValidationError};
use super::inventory;
use super::reward::{self, apply_experience, LevelingPolicy, QuestCompletion};
use super::store::EntityStore;
use super::types::{
    Character, CharacterClass, CharacterPatch, Item, Quest, Skill, StatKind, UnlockedSkill,
};

/// Tunables the service applies to every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub leveling: LevelingPolicy,
    pub log_capacity: usize,
    pub counter_delay: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            leveling: LevelingPolicy::SingleStep,
            log_capacity: DEFAULT_LOG_CAPACITY,
            counter_delay: DEFAULT_COUNTER_DELAY,
        }
    }
}

/// What finishing an encounter changed on the character.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterResolution {
    pub outcome: BattleOutcome,
    pub character: Character,
    pub experience_gained: u64,
    pub gold_gained: u64,
    pub levels_gained: u32,
}

/// Prior value of a record written during one command.
enum Undo {
    Character(Character),
    Quest(Quest),
}

/// Compensation journal for a multi-record command.
struct Journal<'a, S: EntityStore + ?Sized> {
    store: &'a S,
    operation: &'static str,
    undo: Vec<Undo>,
}

impl<'a, S: EntityStore + ?Sized> Journal<'a, S> {
    fn new(store: &'a S, operation: &'static str) -> Self {
        Self {
            store,
            operation,
            undo: Vec::new(),
        }
    }

    fn record(&mut self, undo: Undo) {
        self.undo.push(undo);
    }

    /// Undo every recorded write, newest first, and build the error to return.
    async fn abort(self, source: StoreError) -> GameError {
        if self.undo.is_empty() {
            return GameError::Store(source);
        }
        warn!("{} failed part way ({}); rolling back", self.operation, source);

        let mut rollback_error = None;
        for undo in self.undo.into_iter().rev() {
            let result = match &undo {
                Undo::Character(prior) => self
                    .store
                    .update_character(&prior.user_id, &CharacterPatch::full(prior))
                    .await
                    .map(|_| ()),
                Undo::Quest(prior) => self.store.update_quest(prior).await,
            };
            if let Err(e) = result {
                error!("rollback step for {} failed: {}", self.operation, e);
                if rollback_error.is_none() {
                    rollback_error = Some(e);
                }
            }
        }

        metrics::record_rollback(rollback_error.is_none());
        match rollback_error {
            None => GameError::Store(source),
            Some(rollback) => GameError::Commit {
                operation: self.operation,
                source,
                rollback,
            },
        }
    }
}

fn not_found(err: StoreError) -> GameError {
    match err {
        StoreError::NotFound(what) => GameError::NotFound(what),
        other => GameError::Store(other),
    }
}

fn invalid(err: impl std::fmt::Display) -> GameError {
    ValidationError::InvalidInput(err.to_string()).into()
}

/// Rules engine entry point bound to one entity store.
pub struct GameService<S: EntityStore + ?Sized> {
    store: Arc<S>,
    settings: GameSettings,
}

impl<S: EntityStore + ?Sized> Clone for GameService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
        }
    }
}

impl<S: EntityStore + ?Sized> GameService<S> {
    pub fn new(store: Arc<S>, settings: GameSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    // ========================================================================
    // Characters
    // ========================================================================

    pub async fn create_character(
        &self,
        user_id: &str,
        name: &str,
        class: CharacterClass,
    ) -> GameResult<Character> {
        let user_id = validate_user_id(user_id).map_err(invalid)?;
        let name = validate_character_name(name).map_err(invalid)?;

        match self.store.fetch_character(&user_id).await {
            Ok(_) => return Err(ValidationError::CharacterExists(user_id).into()),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let character = Character::new(&user_id, &name, class);
        self.store
            .create_character(&character)
            .await
            .map_err(|e| match e {
                StoreError::Constraint(_) => {
                    GameError::from(ValidationError::CharacterExists(user_id.clone()))
                }
                other => GameError::Store(other),
            })?;
        info!(
            "character created: {} ({}, {})",
            user_id,
            escape_log(&name),
            class
        );
        Ok(character)
    }

    pub async fn character(&self, user_id: &str) -> GameResult<Character> {
        self.store.fetch_character(user_id).await.map_err(not_found)
    }

    pub async fn inventory(&self, user_id: &str) -> GameResult<Vec<Item>> {
        Ok(self.store.fetch_inventory(user_id).await?)
    }

    /// Spend available stat points.
    pub async fn allocate_stat(
        &self,
        user_id: &str,
        stat: StatKind,
        points: u32,
    ) -> GameResult<Character> {
        let mut character = self.character(user_id).await?;
        reward::allocate_stat(&mut character, stat, points)?;
        let patch = CharacterPatch {
            stats: Some(character.stats.clone()),
            ..Default::default()
        };
        Ok(self.store.update_character(user_id, &patch).await?)
    }

    /// Restore HP and MP to their maximums.
    pub async fn rest(&self, user_id: &str) -> GameResult<Character> {
        let character = self.character(user_id).await?;
        let vitals = character.vitals.restored();
        let updated = self
            .store
            .update_character(user_id, &CharacterPatch::vitals(vitals))
            .await?;
        debug!("{} rested", user_id);
        Ok(updated)
    }

    // ========================================================================
    // Quests
    // ========================================================================

    pub async fn quests(&self, user_id: &str) -> GameResult<Vec<Quest>> {
        Ok(self.store.fetch_quests(user_id).await?)
    }

    async fn quest(&self, user_id: &str, quest_id: Uuid) -> GameResult<Quest> {
        self.store
            .fetch_quests(user_id)
            .await?
            .into_iter()
            .find(|q| q.id == quest_id)
            .ok_or_else(|| GameError::NotFound(format!("quest: {}", quest_id)))
    }

    /// Validate and store a new quest for an existing character.
    pub async fn add_quest(&self, quest: Quest) -> GameResult<Quest> {
        self.character(&quest.user_id).await?;
        let mut quest = quest;
        quest.title = validate_quest_title(&quest.title).map_err(invalid)?;
        quest.description = sanitize_description(&quest.description).map_err(invalid)?;
        if quest.is_completed {
            return Err(ValidationError::QuestAlreadyCompleted.into());
        }
        quest.progress = quest.progress.min(quest.max_progress);

        self.store.create_quest(&quest).await?;
        info!(
            "quest added for {}: {} ({:?}, {:?})",
            quest.user_id,
            escape_log(&quest.title),
            quest.quest_type,
            quest.difficulty
        );
        Ok(quest)
    }

    /// Move a quest's progress forward without completing it.
    pub async fn advance_quest(&self, user_id: &str, quest_id: Uuid, amount: u32) -> GameResult<Quest> {
        let mut quest = self.quest(user_id, quest_id).await?;
        if quest.is_completed {
            return Err(ValidationError::QuestAlreadyCompleted.into());
        }
        if !quest.is_active {
            return Err(ValidationError::QuestInactive.into());
        }
        quest.advance_progress(amount);
        self.store.update_quest(&quest).await?;
        Ok(quest)
    }

    /// Complete a quest and grant its rewards.
    ///
    /// The quest, character and inventory are written in that order; a failure
    /// part way restores the records already written.
    pub async fn complete_quest(&self, user_id: &str, quest_id: Uuid) -> GameResult<QuestCompletion> {
        let quest = self.quest(user_id, quest_id).await?;
        let character = self.character(user_id).await?;
        let items = self.store.fetch_inventory(user_id).await?;

        let completion =
            reward::resolve_quest_completion(&character, &items, &quest, self.settings.leveling)?;

        let store = self.store.as_ref();
        let mut journal = Journal::new(store, "complete_quest");

        if let Err(e) = store.update_quest(&completion.quest).await {
            return Err(journal.abort(e).await);
        }
        journal.record(Undo::Quest(quest));

        if let Err(e) = store
            .update_character(user_id, &CharacterPatch::full(&completion.character))
            .await
        {
            return Err(journal.abort(e).await);
        }
        journal.record(Undo::Character(character));

        if !completion.granted_items.is_empty() {
            if let Err(e) = store.update_inventory(user_id, &completion.inventory).await {
                return Err(journal.abort(e).await);
            }
        }

        metrics::inc_quests_completed();
        metrics::add_level_ups(completion.levels_gained);
        info!(
            "quest completed by {}: {} (+{}xp +{}g)",
            user_id,
            escape_log(&completion.quest.title),
            completion.quest.rewards.experience,
            completion.quest.rewards.gold
        );
        Ok(completion)
    }

    pub async fn delete_quest(&self, user_id: &str, quest_id: Uuid) -> GameResult<()> {
        self.store.delete_quest(user_id, quest_id).await?;
        debug!("quest {} deleted for {}", quest_id, user_id);
        Ok(())
    }

    // ========================================================================
    // Inventory and shop
    // ========================================================================

    /// Apply a character-and-inventory change as one unit: character first,
    /// then inventory, rolling the character back if the inventory write fails.
    async fn commit_trade(
        &self,
        operation: &'static str,
        before: Character,
        after: &Character,
        items: &[Item],
    ) -> GameResult<Character> {
        let store = self.store.as_ref();
        let mut journal = Journal::new(store, operation);

        let stored = match store
            .update_character(&after.user_id, &CharacterPatch::gold(after.gold))
            .await
        {
            Ok(stored) => stored,
            Err(e) => return Err(journal.abort(e).await),
        };
        let user_id = before.user_id.clone();
        journal.record(Undo::Character(before));

        if let Err(e) = store.update_inventory(&user_id, items).await {
            return Err(journal.abort(e).await);
        }
        Ok(stored)
    }

    /// Buy `item` at its full value.
    pub async fn buy_item(&self, user_id: &str, item: Item) -> GameResult<(Character, Vec<Item>)> {
        let before = self.character(user_id).await?;
        let mut items = self.store.fetch_inventory(user_id).await?;
        let mut after = before.clone();

        let price = item.value;
        let item_id = item.id.clone();
        if !inventory::buy_item(&mut after, &mut items, item) {
            return Err(ValidationError::InsufficientGold {
                needed: price,
                available: before.gold,
            }
            .into());
        }

        let stored = self.commit_trade("buy_item", before, &after, &items).await?;
        metrics::inc_shop_purchases();
        info!("{} bought {} for {}g", user_id, item_id, price);
        Ok((stored, items))
    }

    /// Sell one unit of `item_id` for half its value.
    pub async fn sell_item(&self, user_id: &str, item_id: &str) -> GameResult<(Character, Vec<Item>)> {
        let before = self.character(user_id).await?;
        let mut items = self.store.fetch_inventory(user_id).await?;
        let mut after = before.clone();

        let credit = inventory::find_item(&items, item_id)
            .map(inventory::sell_price)
            .ok_or_else(|| GameError::NotFound(format!("item: {}", item_id)))?;
        if !inventory::sell_item(&mut after, &mut items, item_id) {
            return Err(GameError::NotFound(format!("item: {}", item_id)));
        }

        let stored = self.commit_trade("sell_item", before, &after, &items).await?;
        metrics::inc_shop_sales();
        info!("{} sold {} for {}g", user_id, item_id, credit);
        Ok((stored, items))
    }

    pub async fn equip_item(&self, user_id: &str, item_id: &str) -> GameResult<Vec<Item>> {
        let mut items = self.store.fetch_inventory(user_id).await?;
        inventory::equip_item(&mut items, item_id)?;
        self.store.update_inventory(user_id, &items).await?;
        Ok(items)
    }

    pub async fn unequip_item(&self, user_id: &str, item_id: &str) -> GameResult<Vec<Item>> {
        let mut items = self.store.fetch_inventory(user_id).await?;
        inventory::unequip_item(&mut items, item_id)?;
        self.store.update_inventory(user_id, &items).await?;
        Ok(items)
    }

    // ========================================================================
    // Skills
    // ========================================================================

    pub async fn skills(&self, user_id: &str) -> GameResult<Vec<Skill>> {
        Ok(self.store.fetch_unlocked_skills(user_id).await?)
    }

    /// Unlock a catalog skill. The character's class must match the skill's
    /// required class.
    pub async fn unlock_skill(&self, user_id: &str, skill_id: &str) -> GameResult<Skill> {
        let character = self.character(user_id).await?;
        let skill = self
            .store
            .fetch_skills()
            .await?
            .into_iter()
            .find(|s| s.id == skill_id)
            .ok_or_else(|| GameError::NotFound(format!("skill: {}", skill_id)))?;

        if skill.required_class != character.class {
            return Err(ValidationError::WrongClass {
                skill: skill.id.clone(),
                required: skill.required_class.to_string(),
            }
            .into());
        }

        let unlocked = self.store.fetch_unlocked_skill_records(user_id).await?;
        if unlocked.iter().any(|r| r.skill_id == skill.id) {
            return Err(ValidationError::SkillAlreadyUnlocked(skill.id).into());
        }

        self.store
            .insert_unlocked_skill(&UnlockedSkill::new(user_id, &skill.id))
            .await
            .map_err(|e| match e {
                StoreError::Constraint(_) => {
                    GameError::from(ValidationError::SkillAlreadyUnlocked(skill.id.clone()))
                }
                other => GameError::Store(other),
            })?;
        info!("{} unlocked skill {}", user_id, skill.id);
        Ok(skill)
    }

    // ========================================================================
    // Encounters
    // ========================================================================

    /// Start an encounter against `monster_id`, or a random catalog monster.
    pub async fn start_encounter(&self, user_id: &str, monster_id: Option<&str>) -> GameResult<Encounter> {
        let character = self.character(user_id).await?;
        if character.vitals.current_hp == 0 {
            return Err(ValidationError::Incapacitated.into());
        }
        let monster = match monster_id {
            Some(id) => self.store.fetch_monster(id).await?,
            None => {
                let catalog = self.store.fetch_monsters().await?;
                let mut rng = rand::thread_rng();
                select_monster(&catalog, None, &mut rng)?
            }
        };
        let unlocked = self.store.fetch_unlocked_skills(user_id).await?;
        metrics::record_encounter_start(&monster.id);
        Ok(Encounter::begin(
            &character,
            monster,
            unlocked,
            self.settings.log_capacity,
        ))
    }

    /// Write an ended encounter back to the character.
    ///
    /// Vitals are always written back. Only a victory grants the monster's
    /// experience and gold; fleeing and defeat leave gold, experience and
    /// inventory untouched. An encounter is written back once; later calls
    /// fail with `EncounterOver` and change nothing.
    pub async fn finish_encounter(&self, user_id: &str, encounter: &mut Encounter) -> GameResult<EncounterResolution> {
        if encounter.is_written_back() {
            return Err(CombatError::EncounterOver.into());
        }
        let summary = encounter.summary().ok_or_else(|| {
            CombatError::InvalidState(format!("encounter still in {}", encounter.phase()))
        })?;
        let mut character = self.character(user_id).await?;
        character.vitals = character
            .vitals
            .with_current(summary.player_hp, summary.player_mp);

        let (experience_gained, gold_gained, levels_gained, patch) = match summary.outcome {
            BattleOutcome::Victory => {
                let levels = apply_experience(
                    &mut character,
                    summary.exp_reward,
                    summary.gold_reward,
                    self.settings.leveling,
                );
                (
                    summary.exp_reward,
                    summary.gold_reward,
                    levels,
                    CharacterPatch::full(&character),
                )
            }
            BattleOutcome::Defeat | BattleOutcome::Fled => {
                (0, 0, 0, CharacterPatch::vitals(character.vitals.clone()))
            }
        };

        let stored = self.store.update_character(user_id, &patch).await?;
        encounter.mark_written_back();
        metrics::record_encounter_end(&summary.monster_id, summary.outcome);
        metrics::add_level_ups(levels_gained);
        info!(
            "encounter finished: {} vs {} -> {:?}",
            user_id, summary.monster_id, summary.outcome
        );

        Ok(EncounterResolution {
            outcome: summary.outcome,
            character: stored,
            experience_gained,
            gold_gained,
            levels_gained,
        })
    }
}
