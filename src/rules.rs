use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::fields::FieldId;

/// Character classes a value can be required to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
}

impl CharClass {
    fn is_present(&self, value: &str) -> bool {
        match self {
            CharClass::Lower => value.chars().any(|c| c.is_ascii_lowercase()),
            CharClass::Upper => value.chars().any(|c| c.is_ascii_uppercase()),
            CharClass::Digit => value.chars().any(|c| c.is_ascii_digit()),
        }
    }
}

/// Shape constraint on a field value.
///
/// The password composition rule is a `Classes` pattern rather than a regex:
/// the `regex` crate has no lookahead, and a per-class scan states the
/// requirement directly.
#[derive(Debug, Clone)]
pub enum Pattern {
    Regex(Regex),
    Classes(Vec<CharClass>),
}

impl Pattern {
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Pattern::Regex(regex) => regex.is_match(value),
            Pattern::Classes(classes) => classes.iter().all(|class| class.is_present(value)),
        }
    }
}

/// Validation configuration for a single field.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub required: bool,
    pub min_length: Option<usize>,
    pub pattern: Option<Pattern>,
    pub match_field: Option<FieldId>,
}

/// Defects in a rule table, detected at construction time so that misuse
/// never surfaces as a call-time failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("no rule set supplied for field '{0}'")]
    MissingField(FieldId),
    #[error("field '{0}' declares a match rule against itself")]
    SelfMatch(FieldId),
}

/// The immutable rule table: exactly one [`RuleSet`] per [`FieldId`].
///
/// Built once at startup and never mutated; all validation runs against it.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: BTreeMap<FieldId, RuleSet>,
}

impl RuleTable {
    /// Assembles and verifies a table from per-field rule sets.
    pub fn new(rules: BTreeMap<FieldId, RuleSet>) -> Result<Self, RuleTableError> {
        let table = Self { rules };
        table.verify()?;
        Ok(table)
    }

    /// The signup form's built-in rules, matching the shipped product:
    /// name (required, >=2 chars, letters and spaces), email (required,
    /// local@domain.tld shape), password (required, >=6 chars with lower,
    /// upper, and digit), confirm-password (required, must equal password).
    pub fn builtin() -> Self {
        let name_pattern = Regex::new(r"^[a-zA-ZÀ-ÿ\s]+$").expect("name pattern must compile");
        let email_pattern =
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile");

        let mut rules = BTreeMap::new();
        rules.insert(
            FieldId::Name,
            RuleSet {
                required: true,
                min_length: Some(2),
                pattern: Some(Pattern::Regex(name_pattern)),
                match_field: None,
            },
        );
        rules.insert(
            FieldId::Email,
            RuleSet {
                required: true,
                min_length: None,
                pattern: Some(Pattern::Regex(email_pattern)),
                match_field: None,
            },
        );
        rules.insert(
            FieldId::Password,
            RuleSet {
                required: true,
                min_length: Some(6),
                pattern: Some(Pattern::Classes(vec![
                    CharClass::Lower,
                    CharClass::Upper,
                    CharClass::Digit,
                ])),
                match_field: None,
            },
        );
        rules.insert(
            FieldId::ConfirmPassword,
            RuleSet {
                required: true,
                min_length: None,
                pattern: None,
                match_field: Some(FieldId::Password),
            },
        );

        let table = Self { rules };
        debug_assert!(table.verify().is_ok());
        table
    }

    /// Checks table invariants: an entry for every field, and no match rule
    /// pointing at the field itself. Referencing a missing field is already
    /// covered by the entry check since match targets are [`FieldId`]s.
    pub fn verify(&self) -> Result<(), RuleTableError> {
        for field in FieldId::ALL {
            if !self.rules.contains_key(&field) {
                return Err(RuleTableError::MissingField(field));
            }
        }
        for (field, rules) in &self.rules {
            if rules.match_field == Some(*field) {
                return Err(RuleTableError::SelfMatch(*field));
            }
        }
        Ok(())
    }

    pub fn rules(&self, field: FieldId) -> &RuleSet {
        // Invariant from verify(): every FieldId has an entry.
        &self.rules[&field]
    }
}

/// Shared built-in table for callers that never load external configuration.
pub static BUILTIN_RULES: LazyLock<RuleTable> = LazyLock::new(RuleTable::builtin);
