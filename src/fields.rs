use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for one of the four fixed signup form fields.
///
/// The set is closed by design: the rule table carries exactly one entry per
/// variant, so "unknown field" is unrepresentable rather than a runtime
/// error. Declaration order is the form's enumeration order (`Ord` derives
/// from it), which drives whole-form validation and first-invalid selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Name,
    Email,
    Password,
    ConfirmPassword,
}

// Manual impl rather than derive: the derived enum deserializer goes through
// `deserialize_enum`, which `serde_path_to_error` cannot capture when a
// `FieldId` is a map key, so config parse errors would lose the field name
// from their path. A plain string visit keeps that context.
impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct FieldIdVisitor;

        impl serde::de::Visitor<'_> for FieldIdVisitor {
            type Value = FieldId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a field identifier")
            }

            fn visit_str<E>(self, value: &str) -> Result<FieldId, E>
            where
                E: serde::de::Error,
            {
                match value {
                    "name" => Ok(FieldId::Name),
                    "email" => Ok(FieldId::Email),
                    "password" => Ok(FieldId::Password),
                    "confirmPassword" => Ok(FieldId::ConfirmPassword),
                    _ => Err(E::unknown_variant(
                        value,
                        &["name", "email", "password", "confirmPassword"],
                    )),
                }
            }
        }

        deserializer.deserialize_str(FieldIdVisitor)
    }
}

impl FieldId {
    /// Every field, in form enumeration order.
    pub const ALL: [FieldId; 4] = [
        FieldId::Name,
        FieldId::Email,
        FieldId::Password,
        FieldId::ConfirmPassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::Email => "email",
            FieldId::Password => "password",
            FieldId::ConfirmPassword => "confirmPassword",
        }
    }

    /// User-facing prompt label (single pt-BR locale, like the messages).
    pub fn label(&self) -> &'static str {
        match self {
            FieldId::Name => "Nome",
            FieldId::Email => "E-mail",
            FieldId::Password => "Senha",
            FieldId::ConfirmPassword => "Confirmar senha",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_order_matches_ord() {
        let mut sorted = FieldId::ALL;
        sorted.sort();
        assert_eq!(sorted, FieldId::ALL);
    }

    #[test]
    fn test_serde_names_are_camel_case() {
        assert_eq!(
            serde_json::to_string(&FieldId::ConfirmPassword).unwrap(),
            "\"confirmPassword\""
        );
        let parsed: FieldId = serde_json::from_str("\"email\"").unwrap();
        assert_eq!(parsed, FieldId::Email);
    }

    #[test]
    fn test_unknown_field_name_is_rejected() {
        assert!(serde_json::from_str::<FieldId>("\"nickname\"").is_err());
    }
}
