//! Reward resolution: converts a quest's reward payload (or a combat victory)
//! into character changes and applies the leveling rule.
//!
//! All functions are pure over their inputs. Completing a quest computes the
//! new character, inventory and quest together so the caller can commit them
//! as one unit.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::errors::{GameResult, ValidationError};
use super::inventory::add_item;
use super::types::{Character, Item, Quest, StatKind, EXPERIENCE_PER_LEVEL, POINTS_PER_LEVEL};

/// How many levels a single reward may grant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LevelingPolicy {
    /// At most one level per reward, even when the reward crosses several thresholds
    #[default]
    SingleStep,
    /// Keep leveling while the accumulated experience meets the next threshold
    Cascading,
}

/// Everything produced by completing one quest.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestCompletion {
    pub character: Character,
    pub inventory: Vec<Item>,
    pub quest: Quest,
    pub granted_items: Vec<Item>,
    pub levels_gained: u32,
}

impl QuestCompletion {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Add experience and gold, then apply the leveling rule. Returns levels gained.
///
/// Experience is never reduced when a level is gained; the next threshold is
/// `level * 100` and every level grants three stat points.
pub fn apply_experience(
    character: &mut Character,
    experience: u64,
    gold: u64,
    policy: LevelingPolicy,
) -> u32 {
    character.experience = character.experience.saturating_add(experience);
    character.gold = character.gold.saturating_add(gold);

    let mut gained = 0;
    while character.experience >= character.experience_to_next {
        character.level += 1;
        character.experience_to_next = character.level as u64 * EXPERIENCE_PER_LEVEL;
        character.stats.available_points += POINTS_PER_LEVEL;
        gained += 1;
        if policy == LevelingPolicy::SingleStep {
            break;
        }
    }

    if gained > 0 {
        info!(
            "{} reached level {} (+{} points)",
            character.user_id,
            character.level,
            gained * POINTS_PER_LEVEL
        );
    }
    gained
}

/// Resolve a quest completion without writing anything.
///
/// Rejects quests that are already completed or inactive; on rejection no
/// input is modified.
pub fn resolve_quest_completion(
    character: &Character,
    inventory: &[Item],
    quest: &Quest,
    policy: LevelingPolicy,
) -> GameResult<QuestCompletion> {
    if quest.is_completed {
        return Err(ValidationError::QuestAlreadyCompleted.into());
    }
    if !quest.is_active {
        return Err(ValidationError::QuestInactive.into());
    }

    let rewards = &quest.rewards;
    let mut updated = character.clone();
    let levels_gained = apply_experience(&mut updated, rewards.experience, rewards.gold, policy);
    updated.skill_points = updated
        .skill_points
        .saturating_add(rewards.skill_points.unwrap_or(0));
    updated.touch();

    let mut updated_inventory = inventory.to_vec();
    for item in &rewards.items {
        add_item(&mut updated_inventory, item.clone());
    }

    let mut completed = quest.clone();
    completed.mark_complete();

    debug!(
        "quest {} resolved for {}: +{}xp +{}g, {} item(s)",
        quest.id,
        character.user_id,
        rewards.experience,
        rewards.gold,
        rewards.items.len()
    );

    Ok(QuestCompletion {
        character: updated,
        inventory: updated_inventory,
        quest: completed,
        granted_items: rewards.items.clone(),
        levels_gained,
    })
}

/// Spend available points on a base stat.
pub fn allocate_stat(character: &mut Character, stat: StatKind, points: u32) -> GameResult<()> {
    if points == 0 {
        return Err(ValidationError::InvalidInput("cannot allocate zero points".to_string()).into());
    }
    let available = character.stats.available_points;
    if points > available {
        return Err(ValidationError::InsufficientPoints {
            needed: points,
            available,
        }
        .into());
    }

    character.stats.available_points -= points;
    let target = match stat {
        StatKind::Strength => &mut character.stats.strength,
        StatKind::Dexterity => &mut character.stats.dexterity,
        StatKind::Intelligence => &mut character.stats.intelligence,
    };
    *target += points;
    character.touch();
    Ok(())
}
