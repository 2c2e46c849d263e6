//! # Questforge - quest, combat and inventory rules for gamified productivity
//!
//! Real-world tasks become quests. Completing one awards experience, gold and
//! items to a persistent character, who can spend them in a shop or take them
//! into turn-based fights against catalog monsters.
//!
//! ## Features
//!
//! - **Reward Resolver**: quest completion, leveling (single step or cascading) and stat allocation.
//! - **Inventory Engine**: stackable items, equip flags, buy at full value and sell at half.
//! - **Combat Engine**: a small turn-based state machine with skills, mana and counter-attacks.
//! - **Command Layer**: each command loads state, runs a pure engine and commits with rollback.
//! - **Storage**: an async entity store contract with a sled-backed implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use questforge::config::Config;
//! use questforge::game::{CharacterClass, GameService, SledEntityStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = SledEntityStore::open(&config.storage.data_dir)?;
//!     let service = GameService::new(Arc::new(store), config.game_settings());
//!
//!     service.create_character("alice", "Alice", CharacterClass::Wizard).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - data model, engines, entity store and command layer
//! - [`config`] - configuration loading and defaults
//! - [`validation`] - name and quest text validation
//! - [`logutil`] - single-line log escaping
//! - [`metrics`] - process-local counters

pub mod config;
pub mod game;
pub mod logutil;
pub mod metrics;
pub mod validation;
