use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::engine::Violation;
use crate::fields::FieldId;
use crate::rules::RuleTable;

/// Quiet period after the last keystroke before a field is re-validated.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Rendered state of one field, the error/success class analog.
///
/// A field stays `Pristine` until something validates it, and returns to
/// `Pristine` when blank-and-valid (success styling is only for fields with
/// a non-blank value).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldStatus {
    #[default]
    Pristine,
    Valid,
    Invalid(Violation),
}

impl FieldStatus {
    pub fn first_message(&self) -> Option<String> {
        match self {
            FieldStatus::Invalid(violation) => Some(violation.to_string()),
            _ => None,
        }
    }
}

/// Collapses rapid per-field edits to one validation after a quiet period.
///
/// Holds only deadlines; the field value is read at fire time, so collapsed
/// edits always validate the last-entered value. The caller drives the
/// clock, which keeps this testable without sleeping.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    deadlines: HashMap<FieldId, Instant>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    /// Records an edit, replacing any pending deadline for the field.
    fn record(&mut self, field: FieldId, now: Instant) {
        self.deadlines.insert(field, now + self.window);
    }

    fn cancel(&mut self, field: FieldId) {
        self.deadlines.remove(&field);
    }

    /// Drains fields whose quiet period has elapsed, in enumeration order.
    fn due(&mut self, now: Instant) -> Vec<FieldId> {
        let mut ready: Vec<FieldId> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(field, _)| *field)
            .collect();
        ready.sort();
        for field in &ready {
            self.deadlines.remove(field);
        }
        ready
    }

    fn clear(&mut self) {
        self.deadlines.clear();
    }
}

/// Outcome of a submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// Validation failed; the caller focuses the named field.
    Rejected { first_invalid: FieldId },
}

/// Owns the form's field values and rendered statuses, and schedules
/// validation around them. The engine only ever sees the values through the
/// read closure handed to it per call.
#[derive(Debug)]
pub struct SignupForm {
    rules: RuleTable,
    values: BTreeMap<FieldId, String>,
    statuses: BTreeMap<FieldId, FieldStatus>,
    debouncer: Debouncer,
}

impl SignupForm {
    pub fn new(rules: RuleTable) -> Self {
        Self::with_debounce_window(rules, DEBOUNCE_WINDOW)
    }

    pub fn with_debounce_window(rules: RuleTable, window: Duration) -> Self {
        let values = FieldId::ALL
            .into_iter()
            .map(|field| (field, String::new()))
            .collect();
        let statuses = FieldId::ALL
            .into_iter()
            .map(|field| (field, FieldStatus::Pristine))
            .collect();
        Self {
            rules,
            values,
            statuses,
            debouncer: Debouncer::new(window),
        }
    }

    pub fn value(&self, field: FieldId) -> &str {
        &self.values[&field]
    }

    pub fn status(&self, field: FieldId) -> &FieldStatus {
        &self.statuses[&field]
    }

    /// Stores a keystroke's worth of input and schedules a debounced
    /// validation of the field.
    pub fn on_input(&mut self, field: FieldId, value: impl Into<String>, now: Instant) {
        self.values.insert(field, value.into());
        self.debouncer.record(field, now);
    }

    /// Runs validations whose quiet period has elapsed. After validating
    /// either password field, the sibling is re-validated when non-empty, in
    /// both directions. Returns each field validated on this tick once.
    pub fn tick(&mut self, now: Instant) -> Vec<FieldId> {
        let due = self.debouncer.due(now);
        let mut validated = Vec::new();
        for field in due.iter().copied() {
            self.validate_field(field);
            validated.push(field);

            // Skip the sibling when it is due itself; it gets its own turn.
            if let Some(sibling) = password_sibling(field)
                && !due.contains(&sibling)
                && !self.values[&sibling].is_empty()
            {
                self.validate_field(sibling);
                validated.push(sibling);
            }
        }
        validated
    }

    /// Validates immediately, cancelling any pending debounced run for the
    /// field. Returns whether the field is valid.
    pub fn on_blur(&mut self, field: FieldId) -> bool {
        self.debouncer.cancel(field);
        self.validate_field(field)
    }

    /// Validates the whole form and refreshes every status.
    pub fn submit(&mut self) -> SubmitOutcome {
        let values = &self.values;
        let report = self.rules.validate_all(|field| values[&field].clone());

        for field in FieldId::ALL {
            let violations = report.violations(field).to_vec();
            self.apply(field, violations);
        }

        match report.first_invalid() {
            None => SubmitOutcome::Accepted,
            Some(first_invalid) => {
                tracing::debug!(first_invalid = %first_invalid, "Form submission rejected");
                SubmitOutcome::Rejected { first_invalid }
            }
        }
    }

    /// Clears values, statuses, and pending validations.
    pub fn reset(&mut self) {
        for field in FieldId::ALL {
            self.values.insert(field, String::new());
            self.statuses.insert(field, FieldStatus::Pristine);
        }
        self.debouncer.clear();
    }

    fn validate_field(&mut self, field: FieldId) -> bool {
        let values = &self.values;
        let violations = self
            .rules
            .validate(field, &values[&field], |other| values[&other].clone());
        self.apply(field, violations)
    }

    fn apply(&mut self, field: FieldId, violations: Vec<Violation>) -> bool {
        // Only the first violation is surfaced.
        let status = match violations.into_iter().next() {
            Some(violation) => FieldStatus::Invalid(violation),
            None if !self.values[&field].trim().is_empty() => FieldStatus::Valid,
            None => FieldStatus::Pristine,
        };
        let valid = !matches!(status, FieldStatus::Invalid(_));
        self.statuses.insert(field, status);
        valid
    }
}

fn password_sibling(field: FieldId) -> Option<FieldId> {
    match field {
        FieldId::Password => Some(FieldId::ConfirmPassword),
        FieldId::ConfirmPassword => Some(FieldId::Password),
        FieldId::Name | FieldId::Email => None,
    }
}
