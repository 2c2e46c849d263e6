use thiserror::Error;

/// Errors raised by an entity store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when a write would violate a uniqueness or ownership rule.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Any other backend failure (network, remote service, injected fault).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Rejections that leave every input untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("insufficient gold: need {needed}, have {available}")]
    InsufficientGold { needed: u64, available: u64 },

    #[error("insufficient mana: need {needed}, have {available}")]
    InsufficientMana { needed: i64, available: i64 },

    #[error("insufficient stat points: need {needed}, have {available}")]
    InsufficientPoints { needed: u32, available: u32 },

    #[error("quest already completed")]
    QuestAlreadyCompleted,

    #[error("quest is not active")]
    QuestInactive,

    #[error("skill not unlocked: {0}")]
    SkillNotUnlocked(String),

    #[error("skill {skill} requires class {required}")]
    WrongClass { skill: String, required: String },

    #[error("skill already unlocked: {0}")]
    SkillAlreadyUnlocked(String),

    #[error("character has no hit points left")]
    Incapacitated,

    #[error("character already exists for {0}")]
    CharacterExists(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors internal to a single encounter. None of them touch persisted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("monster catalog is empty")]
    EmptyMonsterCatalog,

    #[error("an action is already being resolved")]
    ActionInFlight,

    #[error("the encounter is over")]
    EncounterOver,

    #[error("no counter-attack is pending")]
    NoCounterPending,

    #[error("action not allowed in state {0}")]
    InvalidState(String),
}

/// Top-level error for engine and service operations.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Combat(#[from] CombatError),

    /// A multi-record write failed part way and the compensating write also failed.
    #[error("partial commit during {operation}: {source}; rollback failed: {rollback}")]
    Commit {
        operation: &'static str,
        source: StoreError,
        rollback: StoreError,
    },
}

impl GameError {
    pub fn is_validation(&self) -> bool {
        matches!(self, GameError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GameError::NotFound(_) | GameError::Store(StoreError::NotFound(_)))
    }
}

pub type GameResult<T> = Result<T, GameError>;
