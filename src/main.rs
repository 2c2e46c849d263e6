//! Binary entrypoint for the Questforge CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and open the data store
//! - `seed` - load the monster and skill catalogs from the JSON seed files
//! - `status` - print store and catalog summary
//! - `character`, `quest`, `item`, `skill` - manage one user's game state
//! - `fight` - run an encounter against a catalog monster
//!
//! See the library crate docs for module-level details: `questforge::`.
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use questforge::config::Config;
use questforge::game::{
    format_inventory, load_monsters_from_json, load_skills_from_json, seed_catalog, ActionOutcome,
    BattleOutcome, CharacterClass, CombatAction, Difficulty, EntityStore, GameService, Item, Quest,
    QuestRewards, QuestType, SledEntityStore, StatKind,
};
use questforge::metrics;

#[derive(Parser)]
#[command(name = "questforge")]
#[command(about = "Quest, combat and inventory rules for gamified productivity")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the data store
    Init,
    /// Load monsters and skills from the configured seed files
    Seed,
    /// Show store and catalog summary
    Status,
    /// Character management
    Character {
        #[command(subcommand)]
        command: CharacterCommand,
    },
    /// Quest management
    Quest {
        #[command(subcommand)]
        command: QuestCommand,
    },
    /// Inventory and shop
    Item {
        #[command(subcommand)]
        command: ItemCommand,
    },
    /// Skill catalog and unlocks
    Skill {
        #[command(subcommand)]
        command: SkillCommand,
    },
    /// Fight a monster
    Fight {
        user: String,
        /// Monster id; random when omitted
        #[arg(short, long)]
        monster: Option<String>,
        /// Scripted actions: attack, run, or skill:<id>. Prompts when exhausted on a TTY.
        #[arg(short, long)]
        action: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CharacterCommand {
    Create {
        user: String,
        name: String,
        #[arg(long, default_value = "novice")]
        class: String,
    },
    Show {
        user: String,
    },
    /// Restore HP and MP
    Rest {
        user: String,
    },
    /// Spend stat points (str, dex, int)
    Allocate {
        user: String,
        stat: String,
        #[arg(default_value_t = 1)]
        points: u32,
    },
}

#[derive(Subcommand)]
enum QuestCommand {
    Add {
        user: String,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "type", default_value = "single")]
        quest_type: String,
        #[arg(long, default_value = "easy")]
        difficulty: String,
        /// Override the difficulty's experience reward
        #[arg(long)]
        exp: Option<u64>,
        /// Override the difficulty's gold reward
        #[arg(long)]
        gold: Option<u64>,
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    List {
        user: String,
    },
    Progress {
        user: String,
        id: Uuid,
        #[arg(default_value_t = 1)]
        amount: u32,
    },
    Complete {
        user: String,
        id: Uuid,
    },
    Delete {
        user: String,
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum ItemCommand {
    List {
        user: String,
    },
    Buy {
        user: String,
        id: String,
        name: String,
        value: u64,
        /// Stack size; omit for a single non-stackable item
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        equippable: bool,
    },
    Sell {
        user: String,
        id: String,
    },
    Equip {
        user: String,
        id: String,
    },
    Unequip {
        user: String,
        id: String,
    },
}

#[derive(Subcommand)]
enum SkillCommand {
    /// List the catalog, or one user's unlocked skills
    List {
        user: Option<String>,
    },
    Unlock {
        user: String,
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Initializing new Questforge configuration");
        Config::create_default(&cli.config).await?;
        let config = Config::load(&cli.config).await?;
        tokio::fs::create_dir_all(&config.storage.data_dir).await?;
        SledEntityStore::open(&config.storage.data_dir)?;
        println!("Questforge initialized.");
        println!("Configuration: {}", cli.config);
        println!("Data store: {}", config.storage.data_dir);
        println!("Run `questforge seed` to load the JSON catalogs.");
        return Ok(());
    }

    let config = match Config::load(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} (using defaults; run `questforge init` to create one)", e);
            Config::default()
        }
    };
    init_logging(&Some(config.clone()), cli.verbose);

    let store = Arc::new(SledEntityStore::open(&config.storage.data_dir)?);
    let service = GameService::new(store, config.game_settings());

    match cli.command {
        Commands::Init => {}
        Commands::Seed => {
            let monsters = load_monsters_from_json(&config.seeds.monsters)?;
            let skills = load_skills_from_json(&config.seeds.skills)?;
            let (m, s) = seed_catalog(service.store().as_ref(), &monsters, &skills).await?;
            println!("Seeded {} monsters and {} skills.", m, s);
        }
        Commands::Status => {
            let store = service.store();
            let users = store.list_user_ids()?;
            let monsters = store.fetch_monsters().await?;
            let skills = store.fetch_skills().await?;
            println!("Questforge Status:");
            println!("  Data store: {}", config.storage.data_dir);
            println!("  Characters: {}", users.len());
            println!("  Monsters: {}", monsters.len());
            println!("  Skills: {}", skills.len());
            println!("  Leveling: {:?}", config.leveling_policy());
        }
        Commands::Character { command } => character_command(&service, command).await?,
        Commands::Quest { command } => quest_command(&service, command).await?,
        Commands::Item { command } => item_command(&service, command).await?,
        Commands::Skill { command } => skill_command(&service, command).await?,
        Commands::Fight {
            user,
            monster,
            action,
        } => fight(&service, &user, monster.as_deref(), action).await?,
    }

    let snap = metrics::snapshot();
    if snap.commit_rollbacks > 0 {
        warn!(
            "{} rollback(s) ran this session, {} failed",
            snap.commit_rollbacks, snap.commit_rollback_failures
        );
    }
    Ok(())
}

fn parse_arg<T: FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse::<T>().map_err(|e| anyhow!(e))
}

async fn character_command(service: &GameService<SledEntityStore>, command: CharacterCommand) -> Result<()> {
    match command {
        CharacterCommand::Create { user, name, class } => {
            let class: CharacterClass = parse_arg(&class)?;
            let character = service.create_character(&user, &name, class).await?;
            println!("Created {} the {} (id {}).", character.name, character.class, character.id);
        }
        CharacterCommand::Show { user } => {
            let c = service.character(&user).await?;
            println!("{} - level {} {}", c.name, c.level, c.class);
            println!("  EXP: {}/{}", c.experience, c.experience_to_next);
            println!(
                "  HP: {}/{}  MP: {}/{}",
                c.vitals.current_hp, c.vitals.max_hp, c.vitals.current_mp, c.vitals.max_mp
            );
            println!(
                "  STR {}  DEX {}  INT {}  (points: {})",
                c.stats.strength, c.stats.dexterity, c.stats.intelligence, c.stats.available_points
            );
            println!("  Gold: {}  Skill points: {}", c.gold, c.skill_points);
        }
        CharacterCommand::Rest { user } => {
            let c = service.rest(&user).await?;
            println!("{} rests. HP {}/{}, MP {}/{}.", c.name, c.vitals.current_hp, c.vitals.max_hp, c.vitals.current_mp, c.vitals.max_mp);
        }
        CharacterCommand::Allocate { user, stat, points } => {
            let stat: StatKind = parse_arg(&stat)?;
            let c = service.allocate_stat(&user, stat, points).await?;
            println!(
                "STR {}  DEX {}  INT {}  (points left: {})",
                c.stats.strength, c.stats.dexterity, c.stats.intelligence, c.stats.available_points
            );
        }
    }
    Ok(())
}

async fn quest_command(service: &GameService<SledEntityStore>, command: QuestCommand) -> Result<()> {
    match command {
        QuestCommand::Add {
            user,
            title,
            description,
            quest_type,
            difficulty,
            exp,
            gold,
            steps,
        } => {
            let quest_type: QuestType = parse_arg(&quest_type)?;
            let difficulty: Difficulty = parse_arg(&difficulty)?;
            let defaults = difficulty.default_rewards();
            let rewards = QuestRewards {
                experience: exp.unwrap_or(defaults.experience),
                gold: gold.unwrap_or(defaults.gold),
                ..defaults
            };
            let quest = Quest::new(&user, &title, quest_type, difficulty)
                .with_description(&description)
                .with_rewards(rewards)
                .with_max_progress(steps);
            let quest = service.add_quest(quest).await?;
            println!("Quest added: {} ({})", quest.title, quest.id);
        }
        QuestCommand::List { user } => {
            let quests = service.quests(&user).await?;
            if quests.is_empty() {
                println!("No quests.");
            }
            let now = chrono::Utc::now();
            for q in quests {
                let state = if q.is_completed {
                    "done"
                } else if q.is_overdue(now) {
                    "overdue"
                } else {
                    "open"
                };
                println!(
                    "{} [{}] {} {}/{} (+{}xp +{}g)",
                    q.id, state, q.title, q.progress, q.max_progress, q.rewards.experience, q.rewards.gold
                );
            }
        }
        QuestCommand::Progress { user, id, amount } => {
            let q = service.advance_quest(&user, id, amount).await?;
            println!("{}: {}/{}", q.title, q.progress, q.max_progress);
        }
        QuestCommand::Complete { user, id } => {
            let done = service.complete_quest(&user, id).await?;
            println!(
                "Quest complete: {} (+{}xp +{}g)",
                done.quest.title, done.quest.rewards.experience, done.quest.rewards.gold
            );
            for item in &done.granted_items {
                println!("  Received {}", item.name);
            }
            if done.leveled_up() {
                println!("Level up! Now level {}.", done.character.level);
            }
        }
        QuestCommand::Delete { user, id } => {
            service.delete_quest(&user, id).await?;
            println!("Quest deleted.");
        }
    }
    Ok(())
}

async fn item_command(service: &GameService<SledEntityStore>, command: ItemCommand) -> Result<()> {
    match command {
        ItemCommand::List { user } => {
            for line in format_inventory(&service.inventory(&user).await?) {
                println!("{}", line);
            }
        }
        ItemCommand::Buy {
            user,
            id,
            name,
            value,
            quantity,
            equippable,
        } => {
            let mut item = match quantity {
                Some(q) => Item::stackable(&id, &name, value, q),
                None => Item::new(&id, &name, value),
            };
            if equippable {
                item.is_equipped = Some(false);
            }
            let (c, _) = service.buy_item(&user, item).await?;
            println!("Bought {}. Gold left: {}", name, c.gold);
        }
        ItemCommand::Sell { user, id } => {
            let (c, _) = service.sell_item(&user, &id).await?;
            println!("Sold {}. Gold: {}", id, c.gold);
        }
        ItemCommand::Equip { user, id } => {
            service.equip_item(&user, &id).await?;
            println!("Equipped {}.", id);
        }
        ItemCommand::Unequip { user, id } => {
            service.unequip_item(&user, &id).await?;
            println!("Unequipped {}.", id);
        }
    }
    Ok(())
}

async fn skill_command(service: &GameService<SledEntityStore>, command: SkillCommand) -> Result<()> {
    match command {
        SkillCommand::List { user: None } => {
            for s in service.store().fetch_skills().await? {
                println!(
                    "{} - {} ({}, {} MP, {} dmg): {}",
                    s.id, s.name, s.required_class, s.mana_cost, s.damage, s.description
                );
            }
        }
        SkillCommand::List { user: Some(user) } => {
            let skills = service.skills(&user).await?;
            if skills.is_empty() {
                println!("No skills unlocked.");
            }
            for s in skills {
                println!("{} - {} ({} MP)", s.id, s.name, s.mana_cost);
            }
        }
        SkillCommand::Unlock { user, id } => {
            let skill = service.unlock_skill(&user, &id).await?;
            println!("Unlocked {}.", skill.name);
        }
    }
    Ok(())
}

fn parse_action(input: &str) -> Result<CombatAction> {
    let input = input.trim().to_ascii_lowercase();
    match input.as_str() {
        "a" | "attack" => Ok(CombatAction::Attack),
        "r" | "run" | "flee" => Ok(CombatAction::Run),
        other => match other.strip_prefix("skill:").or_else(|| other.strip_prefix("s:")) {
            Some(id) if !id.is_empty() => Ok(CombatAction::Skill(id.to_string())),
            _ => Err(anyhow!("unknown action: {}", other)),
        },
    }
}

async fn fight(
    service: &GameService<SledEntityStore>,
    user: &str,
    monster: Option<&str>,
    scripted: Vec<String>,
) -> Result<()> {
    let mut encounter = service.start_encounter(user, monster).await?;
    let interactive = atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout);
    let mut scripted = scripted.into_iter();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut mark = 0usize;
    let delay = service.settings().counter_delay;

    while !encounter.is_over() {
        for line in encounter.log_since(mark) {
            println!("{}", line);
        }
        mark = encounter.log_mark();

        let action = match scripted.next() {
            Some(raw) => parse_action(&raw)?,
            None if interactive => {
                println!(
                    "HP {} MP {} | {} HP {} > [a]ttack, s:<skill>, [r]un",
                    encounter.player_hp(),
                    encounter.player_mp(),
                    encounter.monster().name,
                    encounter.monster_hp()
                );
                match stdin.next_line().await? {
                    Some(line) => match parse_action(&line) {
                        Ok(action) => action,
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    },
                    None => CombatAction::Run,
                }
            }
            None => CombatAction::Attack,
        };

        match encounter.perform(action, delay).await {
            Ok(report) => {
                if let ActionOutcome::CounterPending { damage } = report.action {
                    log::debug!("{} took {} damage", encounter.monster().id, damage);
                }
            }
            Err(e) if e.is_validation() => println!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }

    for line in encounter.log_since(mark) {
        println!("{}", line);
    }
    let resolution = service.finish_encounter(user, &mut encounter).await?;
    match resolution.outcome {
        BattleOutcome::Victory => println!(
            "Victory! +{}xp +{}g{}",
            resolution.experience_gained,
            resolution.gold_gained,
            if resolution.levels_gained > 0 {
                format!(" (level {})", resolution.character.level)
            } else {
                String::new()
            }
        ),
        BattleOutcome::Defeat => println!("Defeated. Rest to recover."),
        BattleOutcome::Fled => println!("You escaped."),
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| log::LevelFilter::from_str(&cfg.logging.level).ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config.as_ref().and_then(|cfg| cfg.logging.file.as_ref()).and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    if let Some(f) = file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Console output only when attached to a terminal; the file always gets the line
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
