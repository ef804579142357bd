mod config;
mod engine;
mod fields;
mod form;
mod logging;
mod rules;

use std::io::Write as _;
use std::time::{Duration, Instant};

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use fields::FieldId;
use form::{FieldStatus, SignupForm, SubmitOutcome};
use logging::{FormEvent, RedactedEmail, RedactedLen};

/// Simulated backend latency for an accepted submission, and the pause
/// before the form clears afterwards.
const SUBMIT_LATENCY: Duration = Duration::from_secs(2);
const RESET_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rules = config::load_rules()?;
    crate::log_form_event!(FormEvent::RulesLoaded, "Rule table ready");

    let mut form = SignupForm::new(rules);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("== Cadastro ==");

    loop {
        // Prompt every field that has not validated yet; after a rejected
        // submit this lands on the first invalid field, the focus analog.
        for field in FieldId::ALL {
            if matches!(form.status(field), FieldStatus::Valid) {
                continue;
            }
            let Some(value) = prompt(&mut lines, field).await? else {
                println!();
                return Ok(());
            };
            form.on_input(field, value, Instant::now());
            if !form.on_blur(field)
                && let Some(message) = form.status(field).first_message()
            {
                println!("  ! {message}");
            }
        }

        match form.submit() {
            SubmitOutcome::Accepted => {
                crate::log_form_event!(
                    FormEvent::SubmissionAccepted,
                    email = %RedactedEmail::new(form.value(FieldId::Email)),
                    name = %RedactedLen::of(form.value(FieldId::Name)),
                    "Signup form accepted"
                );

                println!("Cadastrando...");
                tokio::time::sleep(SUBMIT_LATENCY).await;
                println!("Cadastro realizado com sucesso!");

                tokio::time::sleep(RESET_DELAY).await;
                form.reset();
                crate::log_form_event!(
                    FormEvent::FormReset,
                    "Form cleared after successful submission"
                );
                return Ok(());
            }
            SubmitOutcome::Rejected { first_invalid } => {
                crate::log_form_event!(
                    FormEvent::SubmissionRejected,
                    first_invalid = %first_invalid,
                    "Signup form rejected"
                );

                println!("Corrija os campos abaixo:");
                for field in FieldId::ALL {
                    if let Some(message) = form.status(field).first_message() {
                        println!("  {}: {message}", field.label());
                    }
                }
            }
        }
    }
}

/// Prompts for one field and reads a line; `None` on end of input.
async fn prompt(
    lines: &mut Lines<BufReader<Stdin>>,
    field: FieldId,
) -> anyhow::Result<Option<String>> {
    print!("{}: ", field.label());
    std::io::stdout().flush().context("failed to flush prompt")?;
    lines
        .next_line()
        .await
        .context("failed to read input line")
}
