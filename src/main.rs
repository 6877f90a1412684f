//! MediCheck terminal client
//!
//! Interactive shell over the star gate and the symptom submission flow.
//! Verification and submission run as background tasks so the form stays
//! editable while a request is in flight.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use medicheck::{render, utils, ClientConfig, FormField, SymptomSession};

const HELP: &str = "\
💡 Commands:
   user <name>        set your GitHub username (not the full URL)
   verify             check that you starred the repository
   symptoms <text>    describe your symptoms
   age <group>        Child | Teen | Adult | Senior
   gender <value>     Male | Female | Other
   submit             analyze the current form
   form | result      show the form or the latest result
   status | health    show gate state or ping the service
   quit";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    utils::init_logging()?;

    let config = ClientConfig::from_env().context("Invalid MediCheck configuration")?;
    let session = Arc::new(SymptomSession::from_config(&config).context("Failed to build HTTP client")?);

    println!("\n{}", "═".repeat(60));
    println!("🩺 MediCheck Symptom Checker v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "═".repeat(60));
    println!("⭐ Star {} to unlock the checker.", config.repository_url);
    println!("{}\n", "═".repeat(60));
    println!("{}\n", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("🩺 > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c.to_lowercase(), a.trim().to_string()),
            None => (line.to_lowercase(), String::new()),
        };

        match command.as_str() {
            "quit" | "exit" | "q" => {
                println!("\n👋 Goodbye!\n");
                break;
            }
            "help" | "?" => println!("{}\n", HELP),
            "user" => match session.gate.set_identity(arg).await {
                Ok(()) => println!("👤 Username set to '{}'\n", session.gate.identity().await),
                Err(e) => println!("{}\n", render::error(&e)),
            },
            "verify" => {
                let session = session.clone();
                tokio::spawn(async move {
                    match session.gate.verify().await {
                        Ok(()) => println!(
                            "\n✅ Verification successful! You can now use the symptom checker.\n"
                        ),
                        Err(e) => println!("\n{}\n", render::error(&e)),
                    }
                });
            }
            "symptoms" => {
                session.submission.update_field(FormField::Symptoms(arg)).await;
                println!("📝 Symptoms updated\n");
            }
            "age" => match arg.parse() {
                Ok(group) => {
                    session.submission.update_field(FormField::AgeGroup(Some(group))).await;
                    println!("📝 Age group set to {}\n", group.label());
                }
                Err(e) => println!("{}\n{}\n", render::error(&e), render::choices()),
            },
            "gender" => match arg.parse() {
                Ok(gender) => {
                    session.submission.update_field(FormField::Gender(Some(gender))).await;
                    println!("📝 Gender set to {}\n", gender);
                }
                Err(e) => println!("{}\n{}\n", render::error(&e), render::choices()),
            },
            "submit" => {
                let session = session.clone();
                tokio::spawn(async move {
                    let outcome = session.submit().await;
                    let shown = session.submission.result().await;
                    println!("\n{}\n", render::submission_outcome(&outcome, shown.as_ref()));
                });
            }
            "form" => println!("📋 Intake form:\n{}\n", render::form(&session.submission.form().await)),
            "result" => match session.submission.result().await {
                Some(result) => println!("{}\n", render::diagnosis(&result)),
                None => println!("No results yet.\n"),
            },
            "status" => {
                println!("{}", render::gate_status(&session.gate.status().await));
                println!("📨 Submission: {}\n", render::submission_status(&session.submission.state().await));
            }
            "health" => match session.service_status().await {
                Ok(message) => println!("🟢 {}\n", message),
                Err(e) => println!("🔴 Service unreachable: {}\n", e),
            },
            other => println!("Unknown command '{}'. Type 'help'.\n", other),
        }
    }

    info!("Session closed");
    Ok(())
}
