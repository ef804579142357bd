use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::fields::FieldId;
use crate::rules::{BUILTIN_RULES, CharClass, Pattern, RuleSet, RuleTable, RuleTableError};

/// Environment variable naming a JSON file that overrides the built-in
/// rule table.
pub const RULES_ENV_VAR: &str = "CADASTRO_RULES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rules file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse rules file at {path}: {source}")]
    Parse {
        path: String,
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: FieldId,
        source: regex::Error,
    },
    #[error(transparent)]
    Table(#[from] RuleTableError),
}

/// One field's rules as written in the configuration file. Mirrors
/// [`RuleSet`] with the pattern still in source form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RuleSpec {
    #[serde(default)]
    required: bool,
    min_length: Option<usize>,
    pattern: Option<PatternSpec>,
    match_field: Option<FieldId>,
}

/// A pattern is either a regex string or a set of required character
/// classes (the form the built-in password rule uses).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PatternSpec {
    Regex(String),
    #[serde(rename_all = "camelCase")]
    Classes { char_classes: Vec<CharClass> },
}

impl RuleSpec {
    fn compile(self, field: FieldId) -> Result<RuleSet, ConfigError> {
        let pattern = match self.pattern {
            None => None,
            Some(PatternSpec::Regex(source)) => Some(Pattern::Regex(
                Regex::new(&source).map_err(|source| ConfigError::InvalidPattern {
                    field,
                    source,
                })?,
            )),
            Some(PatternSpec::Classes { char_classes }) => {
                Some(Pattern::Classes(char_classes))
            }
        };

        Ok(RuleSet {
            required: self.required,
            min_length: self.min_length,
            pattern,
            match_field: self.match_field,
        })
    }
}

/// Loads the rule table for this process: the file named by
/// `CADASTRO_RULES` when set, otherwise the built-in table. Any defect in
/// the file (unreadable, malformed, bad regex, missing field, self-match)
/// is a startup error, never a call-time one.
pub fn load_rules() -> Result<RuleTable, ConfigError> {
    match std::env::var(RULES_ENV_VAR) {
        Ok(path) => {
            tracing::debug!(path = %path, "Loading rule table from configuration file");
            rules_from_file(Path::new(&path))
        }
        Err(_) => {
            tracing::debug!("No rules file configured; using built-in rule table");
            Ok(BUILTIN_RULES.clone())
        }
    }
}

pub fn rules_from_file(path: &Path) -> Result<RuleTable, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    rules_from_json(&raw).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: display,
            source,
        },
        other => other,
    })
}

fn rules_from_json(raw: &str) -> Result<RuleTable, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let specs: BTreeMap<FieldId, RuleSpec> = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|source| ConfigError::Parse {
            path: String::new(),
            source,
        })?;

    let mut rules = BTreeMap::new();
    for (field, spec) in specs {
        rules.insert(field, spec.compile(field)?);
    }
    Ok(RuleTable::new(rules)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Violation;

    const FULL_RULES: &str = r#"{
        "name": { "required": true, "minLength": 2, "pattern": "^[a-zA-ZÀ-ÿ\\s]+$" },
        "email": { "required": true, "pattern": "^[^\\s@]+@[^\\s@]+\\.[^\\s@]+$" },
        "password": {
            "required": true,
            "minLength": 6,
            "pattern": { "charClasses": ["lower", "upper", "digit"] }
        },
        "confirmPassword": { "required": true, "matchField": "password" }
    }"#;

    #[test]
    fn test_full_rules_file_behaves_like_builtin() {
        let table = rules_from_json(FULL_RULES).unwrap();
        let no_siblings = |_: FieldId| String::new();
        assert_eq!(
            table.validate(FieldId::Name, "John123", no_siblings),
            vec![Violation::InvalidName]
        );
        assert_eq!(table.validate(FieldId::Email, "a@b.co", no_siblings), vec![]);
        assert_eq!(
            table.validate(FieldId::Password, "abc123", no_siblings),
            vec![Violation::WeakPassword]
        );
    }

    #[test]
    fn test_missing_field_in_file_is_rejected() {
        let raw = r#"{ "name": { "required": true } }"#;
        let err = rules_from_json(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Table(RuleTableError::MissingField(_))
        ));
    }

    #[test]
    fn test_self_match_in_file_is_rejected() {
        let raw = r#"{
            "name": {},
            "email": {},
            "password": {},
            "confirmPassword": { "matchField": "confirmPassword" }
        }"#;
        let err = rules_from_json(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Table(RuleTableError::SelfMatch(FieldId::ConfirmPassword))
        ));
    }

    #[test]
    fn test_bad_regex_is_rejected_with_field_context() {
        let raw = r#"{
            "name": { "pattern": "[unclosed" },
            "email": {},
            "password": {},
            "confirmPassword": {}
        }"#;
        let err = rules_from_json(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern {
                field: FieldId::Name,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let raw = r#"{ "name": { "minLength": "two" } }"#;
        let err = rules_from_json(raw).unwrap_err();
        let ConfigError::Parse { source, .. } = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(source.path().to_string(), "name.minLength");
    }

    #[test]
    fn test_unknown_rule_key_is_rejected() {
        let raw = r#"{ "name": { "maxLength": 10 } }"#;
        assert!(matches!(
            rules_from_json(raw).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }
}
