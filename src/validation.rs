//! Validation for user-entered text: character names, user ids, quest titles and descriptions

use std::collections::HashSet;

/// Name validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Name is too short (minimum {min} characters)")]
    TooShort { min: usize },

    #[error("Name is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Name cannot start or end with whitespace")]
    InvalidWhitespace,

    #[error("Name contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("Name is reserved")]
    Reserved,
}

/// Free-text validation errors (quest titles and descriptions)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },
}

/// Name validation rules
#[derive(Debug, Clone)]
pub struct NameRules {
    pub min_length: usize,
    pub max_length: usize,
    pub allow_spaces: bool,
    pub allow_unicode: bool,
}

impl NameRules {
    /// Store keys: ascii only, no spaces
    pub fn user_id() -> Self {
        NameRules {
            min_length: 2,
            max_length: 32,
            allow_spaces: false,
            allow_unicode: false,
        }
    }

    /// Display names for characters
    pub fn character() -> Self {
        NameRules {
            min_length: 2,
            max_length: 24,
            allow_spaces: true,
            allow_unicode: true,
        }
    }
}

pub const MAX_QUEST_TITLE: usize = 80;
pub const MAX_QUEST_DESCRIPTION: usize = 1000;

fn reserved_names() -> HashSet<&'static str> {
    [
        "admin", "administrator", "root", "system", "sysop", "operator", "gm", "gamemaster",
        "monster", "npc", "server", "null", "none",
    ]
    .iter()
    .copied()
    .collect()
}

/// Validate a name according to the given rules, returning the accepted form
pub fn validate_name(name: &str, rules: &NameRules) -> Result<String, NameError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();

    if length < rules.min_length {
        return Err(NameError::TooShort {
            min: rules.min_length,
        });
    }
    if length > rules.max_length {
        return Err(NameError::TooLong {
            max: rules.max_length,
        });
    }
    if trimmed != name {
        return Err(NameError::InvalidWhitespace);
    }
    if reserved_names().contains(trimmed.to_lowercase().as_str()) {
        return Err(NameError::Reserved);
    }

    let mut invalid: Vec<char> = trimmed
        .chars()
        .filter(|&ch| {
            let valid = if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                true
            } else if ch == ' ' {
                rules.allow_spaces
            } else if ch.is_alphanumeric() && !ch.is_ascii() {
                rules.allow_unicode
            } else {
                false
            };
            !valid
        })
        .collect();

    if !invalid.is_empty() {
        invalid.sort_unstable();
        invalid.dedup();
        let chars: String = invalid
            .into_iter()
            .map(|c| {
                if c.is_control() {
                    format!("\\u{{{:04x}}}", c as u32)
                } else {
                    c.to_string()
                }
            })
            .collect();
        return Err(NameError::InvalidCharacters { chars });
    }

    Ok(trimmed.to_string())
}

/// Validate the user id a character is keyed by
pub fn validate_user_id(user_id: &str) -> Result<String, NameError> {
    validate_name(user_id, &NameRules::user_id())
}

/// Validate a character display name
pub fn validate_character_name(name: &str) -> Result<String, NameError> {
    validate_name(name, &NameRules::character())
}

/// Validate a quest title: trimmed, non-empty, control characters removed
pub fn validate_quest_title(title: &str) -> Result<String, TextError> {
    let cleaned: String = title.trim().chars().filter(|c| !c.is_control()).collect();
    if cleaned.is_empty() {
        return Err(TextError::Empty { field: "Quest title" });
    }
    if cleaned.chars().count() > MAX_QUEST_TITLE {
        return Err(TextError::TooLong {
            field: "Quest title",
            max: MAX_QUEST_TITLE,
        });
    }
    Ok(cleaned)
}

/// Sanitize a quest description (remove control characters, keep newlines and tabs)
pub fn sanitize_description(description: &str) -> Result<String, TextError> {
    let sanitized: String = description
        .trim()
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect();
    if sanitized.chars().count() > MAX_QUEST_DESCRIPTION {
        return Err(TextError::TooLong {
            field: "Quest description",
            max: MAX_QUEST_DESCRIPTION,
        });
    }
    Ok(sanitized)
}
