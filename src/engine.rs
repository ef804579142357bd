use std::collections::BTreeMap;

use thiserror::Error;

use crate::fields::FieldId;
use crate::rules::RuleTable;

/// One violated rule. `Display` is the user-facing message text, hardcoded
/// in the product's single pt-BR locale.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("Este campo é obrigatório")]
    Required,
    #[error("Deve ter pelo menos {0} caracteres")]
    TooShort(usize),
    #[error("Nome deve conter apenas letras e espaços")]
    InvalidName,
    #[error("Por favor, insira um e-mail válido")]
    InvalidEmail,
    #[error("Senha deve ter pelo menos 6 caracteres, incluindo maiúscula, minúscula e número")]
    WeakPassword,
    #[error("As senhas não coincidem")]
    PasswordMismatch,
}

/// The pattern-failure message is keyed by the field, not derived from the
/// pattern itself. Confirm-password carries no pattern message: a pattern
/// failure there appends nothing, matching the shipped behavior.
fn pattern_violation(field: FieldId) -> Option<Violation> {
    match field {
        FieldId::Name => Some(Violation::InvalidName),
        FieldId::Email => Some(Violation::InvalidEmail),
        FieldId::Password => Some(Violation::WeakPassword),
        FieldId::ConfirmPassword => None,
    }
}

/// Aggregated result of whole-form validation, one entry per field in
/// enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormReport {
    fields: BTreeMap<FieldId, Vec<Violation>>,
}

impl FormReport {
    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|violations| violations.is_empty())
    }

    /// First field in enumeration order with at least one violation; the
    /// caller focuses this control. Pure function over the aggregated map.
    pub fn first_invalid(&self) -> Option<FieldId> {
        self.fields
            .iter()
            .find(|(_, violations)| !violations.is_empty())
            .map(|(field, _)| *field)
    }

    pub fn violations(&self, field: FieldId) -> &[Violation] {
        self.fields
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl RuleTable {
    /// Evaluates one field's raw value against its rules.
    ///
    /// Returns every violated rule in a fixed order: required, length,
    /// pattern, match. A required field with a blank (trimmed-empty) value
    /// short-circuits to exactly `[Required]`; a blank optional field is
    /// valid and no further rule runs, including the match rule.
    ///
    /// `read_field` is the caller-injected capability for reading a sibling
    /// field's *current* value; the engine never owns field storage. Pure
    /// apart from debug logging, safe to call redundantly.
    pub fn validate(
        &self,
        field: FieldId,
        value: &str,
        read_field: impl Fn(FieldId) -> String,
    ) -> Vec<Violation> {
        let rules = self.rules(field);
        let mut violations = Vec::new();
        let blank = value.trim().is_empty();

        if rules.required && blank {
            tracing::debug!(field = %field, "Validation failed: required field is blank");
            violations.push(Violation::Required);
            return violations;
        }

        if blank {
            return violations;
        }

        if let Some(min) = rules.min_length
            && value.chars().count() < min
        {
            tracing::debug!(
                field = %field,
                length = value.chars().count(),
                min_length = min,
                "Validation failed: value below minimum length"
            );
            violations.push(Violation::TooShort(min));
        }

        if let Some(pattern) = &rules.pattern
            && !pattern.is_match(value)
        {
            tracing::debug!(field = %field, "Validation failed: value does not match pattern");
            violations.extend(pattern_violation(field));
        }

        if let Some(other) = rules.match_field
            && value != read_field(other)
        {
            tracing::debug!(
                field = %field,
                match_field = %other,
                "Validation failed: value differs from match field"
            );
            violations.push(Violation::PasswordMismatch);
        }

        violations
    }

    /// Validates every field in enumeration order, reading each current
    /// value through `read_field`. The form is valid iff the report is.
    pub fn validate_all(&self, read_field: impl Fn(FieldId) -> String) -> FormReport {
        let fields = FieldId::ALL
            .into_iter()
            .map(|field| {
                let value = read_field(field);
                (field, self.validate(field, &value, &read_field))
            })
            .collect();
        let report = FormReport { fields };
        tracing::debug!(valid = report.is_valid(), "Whole-form validation complete");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{BUILTIN_RULES, CharClass, Pattern};

    fn no_siblings(_: FieldId) -> String {
        String::new()
    }

    fn reader(password: &str) -> impl Fn(FieldId) -> String + '_ {
        move |field| match field {
            FieldId::Password => password.to_string(),
            _ => String::new(),
        }
    }

    #[test]
    fn test_required_field_blank_yields_only_required() {
        for field in FieldId::ALL {
            assert_eq!(
                BUILTIN_RULES.validate(field, "", no_siblings),
                vec![Violation::Required],
                "field {field} should short-circuit on blank"
            );
            assert_eq!(
                BUILTIN_RULES.validate(field, "   ", no_siblings),
                vec![Violation::Required]
            );
        }
    }

    #[test]
    fn test_optional_blank_field_is_valid() {
        // Same table as builtin, except name and confirm-password are optional.
        let mut map = std::collections::BTreeMap::new();
        for field in FieldId::ALL {
            map.insert(field, BUILTIN_RULES.rules(field).clone());
        }
        map.get_mut(&FieldId::Name).unwrap().required = false;
        map.get_mut(&FieldId::ConfirmPassword).unwrap().required = false;
        let table = RuleTable::new(map).unwrap();

        assert_eq!(table.validate(FieldId::Name, "", no_siblings), vec![]);
        assert_eq!(table.validate(FieldId::Name, "  ", no_siblings), vec![]);
        // A blank optional field skips every later rule, the match rule included.
        assert_eq!(
            table.validate(FieldId::ConfirmPassword, "", reader("Abc123")),
            vec![]
        );
    }

    #[test]
    fn test_name_rejects_digits() {
        let violations = BUILTIN_RULES.validate(FieldId::Name, "John123", no_siblings);
        assert!(violations.contains(&Violation::InvalidName));
    }

    #[test]
    fn test_name_below_min_length_accumulates_with_pattern() {
        // "1" is both too short and non-alphabetic; order is length then pattern.
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::Name, "1", no_siblings),
            vec![Violation::TooShort(2), Violation::InvalidName]
        );
    }

    #[test]
    fn test_name_accepts_accented_full_name() {
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::Name, "João da Silva", no_siblings),
            vec![]
        );
    }

    #[test]
    fn test_email_format() {
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::Email, "not-an-email", no_siblings),
            vec![Violation::InvalidEmail]
        );
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::Email, "a@b.co", no_siblings),
            vec![]
        );
    }

    #[test]
    fn test_password_composition() {
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::Password, "abc123", no_siblings),
            vec![Violation::WeakPassword],
            "missing uppercase"
        );
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::Password, "Abc123", no_siblings),
            vec![]
        );
    }

    #[test]
    fn test_short_password_reports_length_and_composition() {
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::Password, "abc", no_siblings),
            vec![Violation::TooShort(6), Violation::WeakPassword]
        );
    }

    #[test]
    fn test_confirm_password_reads_sibling_live() {
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::ConfirmPassword, "Abc999", reader("Abc123")),
            vec![Violation::PasswordMismatch]
        );
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::ConfirmPassword, "Abc123", reader("Abc123")),
            vec![]
        );
        // Same confirm value, different sibling value: the read is live.
        assert_eq!(
            BUILTIN_RULES.validate(FieldId::ConfirmPassword, "Abc123", reader("Xyz789")),
            vec![Violation::PasswordMismatch]
        );
    }

    #[test]
    fn test_confirm_password_pattern_failure_appends_no_message() {
        // A configured table may put a pattern on the confirmation field,
        // but no message is mapped to it, so a failure must surface nothing.
        let mut map = std::collections::BTreeMap::new();
        for field in FieldId::ALL {
            map.insert(field, BUILTIN_RULES.rules(field).clone());
        }
        map.get_mut(&FieldId::ConfirmPassword).unwrap().pattern =
            Some(Pattern::Classes(vec![CharClass::Digit]));
        let table = RuleTable::new(map).unwrap();

        // "abc" fails the digit pattern; only the mismatch is reported.
        assert_eq!(
            table.validate(FieldId::ConfirmPassword, "abc", reader("Abc123")),
            vec![Violation::PasswordMismatch]
        );
        // Pattern still fails, but the values match: no violation at all.
        assert_eq!(
            table.validate(FieldId::ConfirmPassword, "abc", reader("abc")),
            vec![]
        );
    }

    #[test]
    fn test_validate_all_flags_only_the_invalid_field() {
        let read = |field: FieldId| {
            match field {
                FieldId::Name => "Maria Souza",
                FieldId::Email => "not-an-email",
                FieldId::Password => "Abc123",
                FieldId::ConfirmPassword => "Abc123",
            }
            .to_string()
        };
        let report = BUILTIN_RULES.validate_all(read);
        assert!(!report.is_valid());
        assert_eq!(report.first_invalid(), Some(FieldId::Email));
        assert_eq!(report.violations(FieldId::Email), [Violation::InvalidEmail]);
        for field in [FieldId::Name, FieldId::Password, FieldId::ConfirmPassword] {
            assert!(report.violations(field).is_empty(), "{field} should pass");
        }
    }

    #[test]
    fn test_validate_all_valid_form() {
        let read = |field: FieldId| {
            match field {
                FieldId::Name => "Maria Souza",
                FieldId::Email => "maria@example.com",
                FieldId::Password => "Abc123",
                FieldId::ConfirmPassword => "Abc123",
            }
            .to_string()
        };
        let report = BUILTIN_RULES.validate_all(read);
        assert!(report.is_valid());
        assert_eq!(report.first_invalid(), None);
    }

    #[test]
    fn test_first_invalid_follows_enumeration_order() {
        let report = BUILTIN_RULES.validate_all(|_| String::new());
        assert_eq!(report.first_invalid(), Some(FieldId::Name));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let first = BUILTIN_RULES.validate(FieldId::Password, "abc", no_siblings);
        let second = BUILTIN_RULES.validate(FieldId::Password, "abc", no_siblings);
        assert_eq!(first, second);
    }

    #[test]
    fn test_message_texts() {
        assert_eq!(Violation::Required.to_string(), "Este campo é obrigatório");
        assert_eq!(
            Violation::TooShort(6).to_string(),
            "Deve ter pelo menos 6 caracteres"
        );
        assert_eq!(
            Violation::PasswordMismatch.to_string(),
            "As senhas não coincidem"
        );
    }
}
