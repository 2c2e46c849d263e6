//! Seed data loaders for the monster and skill catalogs
//!
//! Catalog content lives in JSON files under data/seeds/ so it can be tuned
//! without recompiling. A small built-in catalog is used when a store is opened
//! for the first time.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::game::errors::StoreError;
use crate::game::store::EntityStore;
use crate::game::types::{CharacterClass, Monster, Skill};

#[derive(Debug, Serialize, Deserialize)]
struct MonsterSeed {
    id: String,
    name: String,
    hp: i64,
    attack: i64,
    defense: i64,
    #[serde(default)]
    exp_reward: u64,
    #[serde(default)]
    gold_reward: u64,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SkillSeed {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    mana_cost: u32,
    damage: i64,
    required_class: String,
}

fn invalid_data(path: &Path, message: impl std::fmt::Display) -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("Failed to parse {}: {}", path.display(), message),
    ))
}

/// Load monsters from data/seeds/monsters.json
pub fn load_monsters_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Monster>, StoreError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let seeds: Vec<MonsterSeed> =
        serde_json::from_str(&contents).map_err(|e| invalid_data(path, e))?;

    seeds
        .into_iter()
        .map(|seed| {
            if seed.hp <= 0 {
                return Err(invalid_data(
                    path,
                    format!("monster {} must have positive hp", seed.id),
                ));
            }
            let mut monster = Monster::new(&seed.id, &seed.name, seed.hp, seed.attack, seed.defense)
                .with_rewards(seed.exp_reward, seed.gold_reward);
            monster.image_url = seed.image_url;
            Ok(monster)
        })
        .collect()
}

/// Load skills from data/seeds/skills.json
pub fn load_skills_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Skill>, StoreError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let seeds: Vec<SkillSeed> =
        serde_json::from_str(&contents).map_err(|e| invalid_data(path, e))?;

    seeds
        .into_iter()
        .map(|seed| {
            let class: CharacterClass = seed
                .required_class
                .parse()
                .map_err(|e| invalid_data(path, format!("skill {}: {}", seed.id, e)))?;
            let mut skill = Skill::new(&seed.id, &seed.name, seed.mana_cost, seed.damage, class);
            skill.description = seed.description;
            Ok(skill)
        })
        .collect()
}

/// Built-in catalog written into an empty store.
pub fn starter_catalog() -> (Vec<Monster>, Vec<Skill>) {
    let monsters = vec![
        Monster::new("slime", "Green Slime", 30, 8, 2).with_rewards(10, 5),
        Monster::new("goblin", "Goblin Scout", 50, 12, 4).with_rewards(20, 12),
        Monster::new("wolf", "Dire Wolf", 70, 16, 6).with_rewards(35, 18),
        Monster::new("procrastinator", "The Procrastinator", 120, 20, 10).with_rewards(80, 50),
    ];

    let mut fireball = Skill::new("fireball", "Fireball", 10, 20, CharacterClass::Wizard);
    fireball.description = "Hurl a ball of flame".to_string();
    let mut power_strike = Skill::new("power_strike", "Power Strike", 8, 15, CharacterClass::Fighter);
    power_strike.description = "A heavy two-handed blow".to_string();
    let mut backstab = Skill::new("backstab", "Backstab", 6, 18, CharacterClass::Rogue);
    backstab.description = "Strike from the shadows".to_string();
    let mut focus = Skill::new("focus", "Focus", 5, 8, CharacterClass::Novice);
    focus.description = "Channel your attention into one hit".to_string();

    (monsters, vec![fireball, power_strike, backstab, focus])
}

/// Write every monster and skill into the store, replacing records with the
/// same id. Returns `(monsters, skills)` written.
pub async fn seed_catalog<S: EntityStore + ?Sized>(
    store: &S,
    monsters: &[Monster],
    skills: &[Skill],
) -> Result<(usize, usize), StoreError> {
    for monster in monsters {
        store.put_monster(monster).await?;
    }
    for skill in skills {
        store.put_skill(skill).await?;
    }
    info!(
        "catalog seeded: {} monster(s), {} skill(s)",
        monsters.len(),
        skills.len()
    );
    Ok((monsters.len(), skills.len()))
}
