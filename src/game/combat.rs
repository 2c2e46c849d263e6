//! Turn-based combat between a character and a single monster.
//!
//! An [`Encounter`] is a small state machine:
//!
//! ```text
//! Init -> PlayerTurn <-> SkillMenu -> Resolving -> PlayerTurn | BattleOver
//! ```
//!
//! Attacking and fleeing are only accepted from `PlayerTurn`; the skill menu
//! is left by casting or by closing it. The player always acts first. When the player's hit leaves the monster
//! alive the encounter enters `Resolving` with a counter-attack pending and
//! rejects further actions until [`Encounter::resolve_counter`] runs. A
//! killing blow ends the encounter immediately, so no counter is ever applied
//! in the same exchange.
//!
//! Nothing here persists anything; the live HP/MP counters are handed back to
//! `service` through [`Encounter::summary`] once the encounter is over. An
//! encounter is not `Clone` and is written back at most once.

use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::errors::{CombatError, GameError, GameResult, ValidationError};
use super::types::{Character, CharacterClass, Monster, Skill};

/// Number of log lines kept per encounter.
pub const DEFAULT_LOG_CAPACITY: usize = 10;
/// Pause between the player's action and the monster's counter-attack.
pub const DEFAULT_COUNTER_DELAY: Duration = Duration::from_millis(800);

const BASE_ATTACK_POWER: i64 = 10;
const BASE_EVASION: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Fled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPhase {
    Init,
    PlayerTurn,
    SkillMenu,
    /// A counter-attack is pending
    Resolving,
    BattleOver(BattleOutcome),
}

impl std::fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombatPhase::Init => f.write_str("init"),
            CombatPhase::PlayerTurn => f.write_str("player_turn"),
            CombatPhase::SkillMenu => f.write_str("skill_menu"),
            CombatPhase::Resolving => f.write_str("resolving"),
            CombatPhase::BattleOver(outcome) => write!(f, "battle_over({:?})", outcome),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatAction {
    Attack,
    Skill(String),
    Run,
}

/// Result of the player's half of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Monster survived; its counter-attack must be resolved next
    CounterPending { damage: i64 },
    /// Monster dropped to 0 HP or below
    Victory { damage: i64 },
    Fled,
}

/// Result of the monster's counter-attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOutcome {
    pub damage: i64,
    pub defeated: bool,
}

/// Full report for one exchange driven by [`Encounter::perform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    pub action: ActionOutcome,
    pub counter: Option<CounterOutcome>,
    pub outcome: Option<BattleOutcome>,
}

/// What an ended encounter hands back for write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterSummary {
    pub monster_id: String,
    pub outcome: BattleOutcome,
    pub player_hp: i64,
    pub player_mp: i64,
    pub exp_reward: u64,
    pub gold_reward: u64,
}

// ============================================================================
// Damage formulas
// ============================================================================

/// Basic attack: `max(1, 10 + strength*2 - defense)`.
pub fn attack_damage(strength: u32, monster_defense: i64) -> i64 {
    let power = BASE_ATTACK_POWER + strength as i64 * 2;
    (power - monster_defense).max(1)
}

/// Skill damage. Scaling follows the skill's class gate: Wizard skills add
/// `intelligence*2`, Fighter skills add `strength*1.5`, others add nothing.
/// Only half the target's defense applies.
pub fn skill_damage(skill: &Skill, strength: u32, intelligence: u32, monster_defense: i64) -> i64 {
    let mut raw = skill.damage as f64;
    match skill.required_class {
        CharacterClass::Wizard => raw += intelligence as f64 * 2.0,
        CharacterClass::Fighter => raw += strength as f64 * 1.5,
        _ => {}
    }
    let damage = (raw - monster_defense as f64 / 2.0).floor() as i64;
    damage.max(1)
}

/// Monster counter-attack: `max(1, attack - (5 + dexterity))`.
pub fn counter_damage(monster_attack: i64, dexterity: u32) -> i64 {
    (monster_attack - (BASE_EVASION + dexterity as i64)).max(1)
}

/// Pick the requested monster, or a uniformly random one from the catalog.
pub fn select_monster<R: Rng + ?Sized>(
    catalog: &[Monster],
    requested: Option<&str>,
    rng: &mut R,
) -> GameResult<Monster> {
    if catalog.is_empty() {
        return Err(CombatError::EmptyMonsterCatalog.into());
    }
    match requested {
        Some(id) => catalog
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("monster: {}", id))),
        None => catalog
            .choose(rng)
            .cloned()
            .ok_or_else(|| GameError::from(CombatError::EmptyMonsterCatalog)),
    }
}

// ============================================================================
// Encounter
// ============================================================================

#[derive(Debug)]
pub struct Encounter {
    monster: Monster,
    monster_hp: i64,
    player_name: String,
    player_hp: i64,
    player_mp: i64,
    strength: u32,
    dexterity: u32,
    intelligence: u32,
    unlocked: Vec<Skill>,
    phase: CombatPhase,
    log: VecDeque<String>,
    log_capacity: usize,
    logged: usize,
    written_back: bool,
}

impl Encounter {
    /// Create an encounter in `Init`. Call [`Encounter::start`] to begin.
    ///
    /// Player HP/MP come from the character's current vitals, so injuries carry
    /// into the next fight.
    pub fn new(
        character: &Character,
        monster: Monster,
        unlocked_skills: Vec<Skill>,
        log_capacity: usize,
    ) -> Self {
        Self {
            monster_hp: monster.hp,
            monster,
            player_name: character.name.clone(),
            player_hp: character.vitals.current_hp as i64,
            player_mp: character.vitals.current_mp as i64,
            strength: character.stats.strength,
            dexterity: character.stats.dexterity,
            intelligence: character.stats.intelligence,
            unlocked: unlocked_skills,
            phase: CombatPhase::Init,
            log: VecDeque::with_capacity(log_capacity.max(1)),
            log_capacity: log_capacity.max(1),
            logged: 0,
            written_back: false,
        }
    }

    /// Construct and start in one step.
    pub fn begin(
        character: &Character,
        monster: Monster,
        unlocked_skills: Vec<Skill>,
        log_capacity: usize,
    ) -> Self {
        let mut encounter = Self::new(character, monster, unlocked_skills, log_capacity);
        encounter.start();
        encounter
    }

    pub fn start(&mut self) {
        if self.phase != CombatPhase::Init {
            return;
        }
        self.phase = CombatPhase::PlayerTurn;
        self.push_log(format!("A wild {} appears!", self.monster.name));
        info!(
            "encounter started: {} vs {} ({} hp)",
            self.player_name, self.monster.id, self.monster_hp
        );
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    pub fn monster_hp(&self) -> i64 {
        self.monster_hp
    }

    pub fn player_hp(&self) -> i64 {
        self.player_hp
    }

    pub fn player_mp(&self) -> i64 {
        self.player_mp
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    /// Count of lines ever logged, including ones that slid out of the window.
    pub fn log_mark(&self) -> usize {
        self.logged
    }

    /// Lines logged after `mark` that are still in the window.
    pub fn log_since(&self, mark: usize) -> impl Iterator<Item = &str> {
        let dropped = self.logged - self.log.len();
        self.log.iter().skip(mark.saturating_sub(dropped)).map(String::as_str)
    }

    pub fn unlocked_skills(&self) -> &[Skill] {
        &self.unlocked
    }

    /// Unlocked skills the player can currently afford.
    pub fn castable_skills(&self) -> impl Iterator<Item = &Skill> {
        self.unlocked
            .iter()
            .filter(move |s| s.mana_cost as i64 <= self.player_mp)
    }

    /// True while a counter-attack is pending; no action is accepted meanwhile.
    pub fn is_busy(&self) -> bool {
        self.phase == CombatPhase::Resolving
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, CombatPhase::BattleOver(_))
    }

    /// True once the result has been committed to the character.
    pub fn is_written_back(&self) -> bool {
        self.written_back
    }

    pub(crate) fn mark_written_back(&mut self) {
        self.written_back = true;
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            CombatPhase::BattleOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn open_skill_menu(&mut self) -> GameResult<()> {
        self.ensure_player_turn()?;
        self.phase = CombatPhase::SkillMenu;
        Ok(())
    }

    pub fn close_skill_menu(&mut self) -> GameResult<()> {
        if self.phase == CombatPhase::SkillMenu {
            self.phase = CombatPhase::PlayerTurn;
            return Ok(());
        }
        Err(CombatError::InvalidState(self.phase.to_string()).into())
    }

    /// Skills may be cast from the player's turn or from the open skill menu.
    fn ensure_can_cast(&self) -> Result<(), CombatError> {
        match self.phase {
            CombatPhase::PlayerTurn | CombatPhase::SkillMenu => Ok(()),
            CombatPhase::Resolving => Err(CombatError::ActionInFlight),
            CombatPhase::BattleOver(_) => Err(CombatError::EncounterOver),
            CombatPhase::Init => Err(CombatError::InvalidState(self.phase.to_string())),
        }
    }

    fn ensure_player_turn(&self) -> Result<(), CombatError> {
        match self.phase {
            CombatPhase::PlayerTurn => Ok(()),
            CombatPhase::SkillMenu => Err(CombatError::InvalidState(self.phase.to_string())),
            _ => self.ensure_can_cast(),
        }
    }

    fn push_log(&mut self, line: String) {
        debug!("combat: {}", line);
        self.log.push_back(line);
        self.logged += 1;
        while self.log.len() > self.log_capacity {
            self.log.pop_front();
        }
    }

    /// Apply player damage and either end the encounter or queue the counter.
    fn land_hit(&mut self, damage: i64) -> ActionOutcome {
        self.monster_hp -= damage;
        if self.monster_hp <= 0 {
            self.phase = CombatPhase::BattleOver(BattleOutcome::Victory);
            self.push_log(format!(
                "{} is defeated! You gain {} exp and {} gold.",
                self.monster.name, self.monster.exp_reward, self.monster.gold_reward
            ));
            info!("encounter won by {} against {}", self.player_name, self.monster.id);
            ActionOutcome::Victory { damage }
        } else {
            self.phase = CombatPhase::Resolving;
            ActionOutcome::CounterPending { damage }
        }
    }

    /// Basic attack.
    pub fn attack(&mut self) -> GameResult<ActionOutcome> {
        self.ensure_player_turn()?;
        let damage = attack_damage(self.strength, self.monster.defense);
        self.push_log(format!(
            "You attack {} for {} damage.",
            self.monster.name, damage
        ));
        Ok(self.land_hit(damage))
    }

    /// Cast an unlocked skill. Rejected without any change when the skill is
    /// not unlocked or the player lacks mana.
    pub fn cast_skill(&mut self, skill_id: &str) -> GameResult<ActionOutcome> {
        self.ensure_can_cast()?;
        let skill = self
            .unlocked
            .iter()
            .find(|s| s.id == skill_id)
            .cloned()
            .ok_or_else(|| ValidationError::SkillNotUnlocked(skill_id.to_string()))?;

        let cost = skill.mana_cost as i64;
        if self.player_mp < cost {
            return Err(ValidationError::InsufficientMana {
                needed: cost,
                available: self.player_mp,
            }
            .into());
        }

        let damage = skill_damage(&skill, self.strength, self.intelligence, self.monster.defense);
        self.player_mp -= cost;
        self.push_log(format!(
            "You cast {} on {} for {} damage.",
            skill.name, self.monster.name, damage
        ));
        Ok(self.land_hit(damage))
    }

    /// Run away. Always succeeds; nothing is rewarded.
    pub fn flee(&mut self) -> GameResult<ActionOutcome> {
        self.ensure_player_turn()?;
        self.phase = CombatPhase::BattleOver(BattleOutcome::Fled);
        self.push_log(format!("You fled from {}.", self.monster.name));
        info!("{} fled from {}", self.player_name, self.monster.id);
        Ok(ActionOutcome::Fled)
    }

    /// Run the player's half of an exchange.
    pub fn act(&mut self, action: &CombatAction) -> GameResult<ActionOutcome> {
        match action {
            CombatAction::Attack => self.attack(),
            CombatAction::Skill(id) => self.cast_skill(id),
            CombatAction::Run => self.flee(),
        }
    }

    /// Resolve the pending counter-attack. Fails when the encounter has ended
    /// or nothing is pending, so a late timer can never deal damage.
    pub fn resolve_counter(&mut self) -> GameResult<CounterOutcome> {
        match self.phase {
            CombatPhase::Resolving => {}
            CombatPhase::BattleOver(_) => return Err(CombatError::EncounterOver.into()),
            _ => return Err(CombatError::NoCounterPending.into()),
        }

        let damage = counter_damage(self.monster.attack, self.dexterity);
        self.player_hp -= damage;
        self.push_log(format!(
            "{} strikes back for {} damage.",
            self.monster.name, damage
        ));

        let defeated = self.player_hp <= 0;
        if defeated {
            self.phase = CombatPhase::BattleOver(BattleOutcome::Defeat);
            self.push_log(format!("You were defeated by {}.", self.monster.name));
            info!("{} was defeated by {}", self.player_name, self.monster.id);
        } else {
            self.phase = CombatPhase::PlayerTurn;
        }
        Ok(CounterOutcome { damage, defeated })
    }

    /// Drive a full exchange: the player's action, the presentation delay,
    /// then the counter-attack if the encounter is still waiting for one.
    pub async fn perform(&mut self, action: CombatAction, delay: Duration) -> GameResult<TurnReport> {
        let action = self.act(&action)?;
        let mut counter = None;
        if let ActionOutcome::CounterPending { .. } = action {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.is_busy() {
                counter = Some(self.resolve_counter()?);
            }
        }
        Ok(TurnReport {
            action,
            counter,
            outcome: self.outcome(),
        })
    }

    /// Final numbers for write-back; `None` until the encounter is over.
    pub fn summary(&self) -> Option<EncounterSummary> {
        let outcome = self.outcome()?;
        Some(EncounterSummary {
            monster_id: self.monster.id.clone(),
            outcome,
            player_hp: self.player_hp,
            player_mp: self.player_mp,
            exp_reward: self.monster.exp_reward,
            gold_reward: self.monster.gold_reward,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fighter() -> Character {
        Character::new("alice", "Alice", CharacterClass::Fighter).with_stats(10, 5, 8)
    }

    fn slime() -> Monster {
        Monster::new("slime", "Slime", 40, 15, 4).with_rewards(20, 8)
    }

    fn fireball() -> Skill {
        Skill::new("fireball", "Fireball", 10, 20, CharacterClass::Wizard)
    }

    #[test]
    fn test_attack_damage_formula_and_floor() {
        assert_eq!(attack_damage(10, 4), 26);
        assert_eq!(attack_damage(0, 50), 1);
        assert_eq!(attack_damage(5, 20), 1);
    }

    #[test]
    fn test_skill_damage_class_scaling() {
        let wiz = fireball();
        // 20 + 8*2 - 7/2 = 32.5 -> 32
        assert_eq!(skill_damage(&wiz, 10, 8, 7), 32);

        let cleave = Skill::new("cleave", "Cleave", 5, 12, CharacterClass::Fighter);
        // 12 + 7*1.5 - 3/2 = 21.0
        assert_eq!(skill_damage(&cleave, 7, 0, 3), 21);

        let jab = Skill::new("jab", "Jab", 1, 6, CharacterClass::Rogue);
        assert_eq!(skill_damage(&jab, 50, 50, 4), 4);
        assert_eq!(skill_damage(&jab, 0, 0, 100), 1);
    }

    #[test]
    fn test_counter_damage_floor() {
        assert_eq!(counter_damage(15, 5), 5);
        assert_eq!(counter_damage(3, 20), 1);
    }

    #[test]
    fn test_begin_seeds_from_current_vitals() {
        let mut hero = fighter();
        hero.vitals.current_hp = 37;
        hero.vitals.current_mp = 4;
        let enc = Encounter::begin(&hero, slime(), vec![], DEFAULT_LOG_CAPACITY);
        assert_eq!(enc.phase(), CombatPhase::PlayerTurn);
        assert_eq!(enc.player_hp(), 37);
        assert_eq!(enc.player_mp(), 4);
        assert_eq!(enc.monster_hp(), 40);
        assert_eq!(enc.log().count(), 1);
    }

    #[test]
    fn test_attack_then_counter() {
        let mut enc = Encounter::begin(&fighter(), slime(), vec![], DEFAULT_LOG_CAPACITY);
        let outcome = enc.attack().unwrap();
        assert_eq!(outcome, ActionOutcome::CounterPending { damage: 26 });
        assert!(enc.is_busy());
        assert_eq!(enc.monster_hp(), 14);

        // busy: a second action is refused
        assert!(matches!(
            enc.attack().unwrap_err(),
            GameError::Combat(CombatError::ActionInFlight)
        ));

        let counter = enc.resolve_counter().unwrap();
        assert_eq!(counter, CounterOutcome { damage: 5, defeated: false });
        assert_eq!(enc.player_hp(), 95);
        assert_eq!(enc.phase(), CombatPhase::PlayerTurn);
    }

    #[test]
    fn test_killing_blow_skips_counter() {
        let mut enc = Encounter::begin(&fighter(), slime(), vec![], DEFAULT_LOG_CAPACITY);
        enc.attack().unwrap();
        enc.resolve_counter().unwrap();
        let outcome = enc.attack().unwrap();
        assert_eq!(outcome, ActionOutcome::Victory { damage: 26 });
        assert_eq!(enc.outcome(), Some(BattleOutcome::Victory));
        assert_eq!(enc.player_hp(), 95);
        assert!(matches!(
            enc.resolve_counter().unwrap_err(),
            GameError::Combat(CombatError::EncounterOver)
        ));
    }

    #[test]
    fn test_defeat_when_hp_runs_out() {
        let mut hero = fighter();
        hero.vitals.current_hp = 4;
        let mut enc = Encounter::begin(&hero, slime(), vec![], DEFAULT_LOG_CAPACITY);
        enc.attack().unwrap();
        let counter = enc.resolve_counter().unwrap();
        assert!(counter.defeated);
        assert_eq!(enc.outcome(), Some(BattleOutcome::Defeat));
        assert!(enc.player_hp() <= 0);
    }

    #[test]
    fn test_skill_requires_unlock_and_mana() {
        let mut hero = Character::new("w", "Wren", CharacterClass::Wizard).with_stats(5, 5, 10);
        hero.vitals.current_mp = 15;
        let mut enc = Encounter::begin(&hero, slime(), vec![fireball()], DEFAULT_LOG_CAPACITY);

        let err = enc.cast_skill("frostbolt").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(enc.player_mp(), 15);

        enc.open_skill_menu().unwrap();
        assert_eq!(enc.phase(), CombatPhase::SkillMenu);
        // 20 + 10*2 - 4/2 = 38, slime left at 2
        let outcome = enc.cast_skill("fireball").unwrap();
        assert_eq!(outcome, ActionOutcome::CounterPending { damage: 38 });
        assert_eq!(enc.player_mp(), 5);
        enc.resolve_counter().unwrap();

        let err = enc.cast_skill("fireball").unwrap_err();
        assert!(matches!(
            err,
            GameError::Validation(ValidationError::InsufficientMana { needed: 10, available: 5 })
        ));
        assert_eq!(enc.monster_hp(), 2);
        assert_eq!(enc.castable_skills().count(), 0);
    }

    #[test]
    fn test_flee_ends_encounter() {
        let mut enc = Encounter::begin(&fighter(), slime(), vec![], DEFAULT_LOG_CAPACITY);
        assert_eq!(enc.flee().unwrap(), ActionOutcome::Fled);
        assert_eq!(enc.outcome(), Some(BattleOutcome::Fled));
        assert!(matches!(
            enc.attack().unwrap_err(),
            GameError::Combat(CombatError::EncounterOver)
        ));
        let summary = enc.summary().unwrap();
        assert_eq!(summary.outcome, BattleOutcome::Fled);
        assert_eq!(summary.player_hp, 100);
    }

    #[test]
    fn test_skill_menu_only_casts_or_closes() {
        let mut enc = Encounter::begin(&fighter(), slime(), vec![], DEFAULT_LOG_CAPACITY);
        enc.open_skill_menu().unwrap();
        assert!(matches!(
            enc.attack().unwrap_err(),
            GameError::Combat(CombatError::InvalidState(_))
        ));
        assert!(matches!(
            enc.flee().unwrap_err(),
            GameError::Combat(CombatError::InvalidState(_))
        ));
        assert!(enc.open_skill_menu().is_err());
        assert_eq!(enc.phase(), CombatPhase::SkillMenu);
        assert_eq!(enc.monster_hp(), slime().hp);

        enc.close_skill_menu().unwrap();
        assert!(matches!(enc.attack().unwrap(), ActionOutcome::CounterPending { .. }));
    }

    #[test]
    fn test_log_is_bounded_window() {
        let tank = Monster::new("golem", "Golem", 10_000, 1, 0);
        let mut enc = Encounter::begin(&fighter(), tank, vec![], 10);
        for _ in 0..8 {
            enc.attack().unwrap();
            enc.resolve_counter().unwrap();
        }
        let lines: Vec<&str> = enc.log().collect();
        assert_eq!(lines.len(), 10);
        assert!(!lines.iter().any(|l| l.contains("appears")));
        assert!(lines[9].contains("strikes back"));

        // 1 intro line + 8 exchanges of 2 lines
        assert_eq!(enc.log_mark(), 17);
        let mark = enc.log_mark();
        enc.attack().unwrap();
        assert_eq!(enc.log_since(mark).count(), 1);
        assert_eq!(enc.log_since(0).count(), 10);
    }

    #[test]
    fn test_select_monster() {
        let mut rng = StdRng::seed_from_u64(7);
        let catalog = vec![slime(), Monster::new("rat", "Rat", 5, 2, 0)];
        let picked = select_monster(&catalog, None, &mut rng).unwrap();
        assert!(catalog.contains(&picked));
        assert_eq!(select_monster(&catalog, Some("rat"), &mut rng).unwrap().id, "rat");
        assert!(select_monster(&catalog, Some("dragon"), &mut rng)
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            select_monster(&[], None, &mut rng).unwrap_err(),
            GameError::Combat(CombatError::EmptyMonsterCatalog)
        ));
    }

    #[tokio::test]
    async fn test_perform_resolves_counter_after_delay() {
        let mut enc = Encounter::begin(&fighter(), slime(), vec![], DEFAULT_LOG_CAPACITY);
        let report = enc
            .perform(CombatAction::Attack, Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(report.counter, Some(CounterOutcome { damage: 5, defeated: false }));
        assert_eq!(report.outcome, None);

        let report = enc.perform(CombatAction::Attack, Duration::ZERO).await.unwrap();
        assert_eq!(report.counter, None);
        assert_eq!(report.outcome, Some(BattleOutcome::Victory));
    }

    #[test]
    fn test_perform_flee_skips_delay() {
        let mut enc = Encounter::begin(&fighter(), slime(), vec![], DEFAULT_LOG_CAPACITY);
        let report = tokio_test::block_on(enc.perform(CombatAction::Run, Duration::from_secs(60)))
            .unwrap();
        assert_eq!(report.action, ActionOutcome::Fled);
        assert_eq!(report.outcome, Some(BattleOutcome::Fled));
        assert!(tokio_test::block_on(enc.perform(CombatAction::Attack, Duration::ZERO)).is_err());
    }
}
