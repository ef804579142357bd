use std::fmt;

/// Email wrapper that masks the local part before the value reaches a log
/// line. The domain stays visible for debugging.
#[derive(Debug, Clone)]
pub struct RedactedEmail(String);

impl RedactedEmail {
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();
        Self(Self::redact(&email))
    }

    fn redact(email: &str) -> String {
        match email.split_once('@') {
            Some((local, domain)) if local.chars().count() > 2 => {
                let first = local.chars().next().unwrap();
                format!("{first}***@{domain}")
            }
            Some((local, domain)) => {
                format!("{}@{domain}", "*".repeat(local.chars().count()))
            }
            // Not shaped like an email; hide it entirely.
            None => "***".to_string(),
        }
    }
}

impl fmt::Display for RedactedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logs only the character count of a value. Used for free-text fields like
/// the name; passwords are never logged, not even through this.
#[derive(Debug, Clone, Copy)]
pub struct RedactedLen(usize);

impl RedactedLen {
    pub fn of(value: &str) -> Self {
        Self(value.chars().count())
    }
}

impl fmt::Display for RedactedLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} chars>", self.0)
    }
}

/// Form lifecycle events for structured logging.
#[derive(Debug, Clone, Copy)]
pub enum FormEvent {
    RulesLoaded,
    SubmissionAccepted,
    SubmissionRejected,
    FormReset,
}

impl FormEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormEvent::RulesLoaded => "rules_loaded",
            FormEvent::SubmissionAccepted => "submission_accepted",
            FormEvent::SubmissionRejected => "submission_rejected",
            FormEvent::FormReset => "form_reset",
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, FormEvent::SubmissionRejected)
    }
}

impl fmt::Display for FormEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log a form lifecycle event with redacted context.
#[macro_export]
macro_rules! log_form_event {
    ($event:expr, $($field:tt)*) => {
        if $event.is_rejection() {
            tracing::warn!(
                form_event = %$event,
                event_type = "form",
                $($field)*
            );
        } else {
            tracing::info!(
                form_event = %$event,
                event_type = "form",
                $($field)*
            );
        }
    };
}
