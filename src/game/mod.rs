//! Quest, combat and inventory rules engine.
//!
//! The pure engines (`reward`, `inventory`, `combat`) work on owned values and
//! never touch storage. `service` loads state through an [`EntityStore`],
//! runs an engine and commits the result.

pub mod combat;
pub mod errors;
pub mod inventory;
pub mod reward;
pub mod seed_loader;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;

pub use combat::{
    attack_damage, counter_damage, select_monster, skill_damage, ActionOutcome, BattleOutcome,
    CombatAction, CombatPhase, CounterOutcome, Encounter, EncounterSummary, TurnReport,
};
pub use errors::{CombatError, GameError, GameResult, StoreError, ValidationError};
pub use inventory::{
    add_item, equip_item, equipped_items, format_inventory, item_quantity, remove_item,
    sell_price, unequip_item, InventoryResult,
};
pub use reward::{
    allocate_stat, apply_experience, resolve_quest_completion, LevelingPolicy, QuestCompletion,
};
pub use seed_loader::{load_monsters_from_json, load_skills_from_json, seed_catalog};
pub use service::{EncounterResolution, GameService, GameSettings};
pub use storage::{SledEntityStore, SledEntityStoreBuilder};
pub use store::{EntityStore, StoreResult};
pub use types::*;
