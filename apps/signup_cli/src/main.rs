use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::normalize_backend_url, load_settings, messages, FormValues, SignupCommand,
    SignupFormController, UniquenessChecker,
};
use shared::domain::{Field, IdentifierKind, UniquenessResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use validation::{
    evaluate_password_strength, get_password_strength, validate_username, MAX_SCORE,
};

#[derive(Parser, Debug)]
#[command(about = "Drive the signup form engine from a terminal")]
struct Cli {
    /// Settings file; defaults to ./signup.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read form events from stdin and print a snapshot after each change.
    Interactive,
    /// Score a password without contacting the backend.
    Strength { password: String },
    CheckUsername { username: String },
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Command(SignupCommand),
    Show,
    Help,
    Quit,
}

const HELP: &str = "commands: set <field> <value> | blur <field> [value] | send-code | code <value> | verify | agree <on|off> | show | help | quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url.as_deref() {
        settings.backend_url = Some(normalize_backend_url(url)?);
    }

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            info!(backend = ?settings.backend_url, "starting interactive signup session");
            let controller =
                SignupFormController::new(settings.transport()?, settings.form_rules());
            run_interactive(controller).await?;
        }
        Command::Strength { password } => {
            let score = evaluate_password_strength(&password);
            println!(
                "score={score}/{MAX_SCORE} strength={}",
                get_password_strength(score)
            );
        }
        Command::CheckUsername { username } => {
            if !validate_username(&username) {
                println!("{}", messages::USERNAME_INVALID);
                return Ok(());
            }
            let checker = UniquenessChecker::new(settings.transport()?);
            let result = checker
                .check_unique(IdentifierKind::Username, &username)
                .await;
            let message = match result {
                UniquenessResult::Available => messages::USERNAME_AVAILABLE,
                other => messages::uniqueness_error(IdentifierKind::Username, other),
            };
            println!("{message}");
        }
    }

    Ok(())
}

async fn run_interactive(mut controller: SignupFormController) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_input(&line, &controller.snapshot().values) {
                    Ok(None) => {}
                    Ok(Some(Input::Quit)) => break,
                    Ok(Some(Input::Help)) => println!("{HELP}"),
                    Ok(Some(Input::Show)) => print_snapshot(&controller)?,
                    Ok(Some(Input::Command(command))) => {
                        controller.dispatch(command);
                        print_snapshot(&controller)?;
                    }
                    Err(err) => eprintln!("{err}"),
                }
            }
            applied = controller.next_completion() => {
                if !applied {
                    break;
                }
                print_snapshot(&controller)?;
            }
        }
    }

    controller.shutdown();
    Ok(())
}

fn print_snapshot(controller: &SignupFormController) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    Ok(())
}

/// `values` supplies the blur value when the line omits it.
fn parse_input(line: &str, values: &FormValues) -> Result<Option<Input>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let input = match verb {
        "set" => {
            let (field, value) = split_field(rest)?;
            Input::Command(SignupCommand::Edit {
                field,
                value: value.to_string(),
            })
        }
        "blur" => {
            let (field, value) = split_field(rest)?;
            let value = if value.is_empty() {
                values.get(field).to_string()
            } else {
                value.to_string()
            };
            Input::Command(SignupCommand::Blur { field, value })
        }
        "send-code" => Input::Command(SignupCommand::RequestCode),
        "code" => Input::Command(SignupCommand::EditCode(rest.to_string())),
        "verify" => Input::Command(SignupCommand::SubmitCode),
        "agree" => match rest {
            "on" | "yes" | "true" => Input::Command(SignupCommand::ToggleAgree(true)),
            "off" | "no" | "false" => Input::Command(SignupCommand::ToggleAgree(false)),
            other => bail!("agree expects on or off, got '{other}'"),
        },
        "show" => Input::Show,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(input))
}

fn split_field(rest: &str) -> Result<(Field, &str)> {
    let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
    if name.is_empty() {
        return Err(anyhow!("missing field name"));
    }
    let field = name.parse::<Field>()?;
    Ok((field, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<Input> {
        parse_input(line, &FormValues::default()).expect("parse")
    }

    #[test]
    fn parses_field_commands() {
        assert_eq!(
            parse("set email  a@b.co "),
            Some(Input::Command(SignupCommand::Edit {
                field: Field::Email,
                value: "a@b.co".to_string(),
            }))
        );
        assert_eq!(
            parse("set nickname"),
            Some(Input::Command(SignupCommand::Edit {
                field: Field::Nickname,
                value: String::new(),
            }))
        );
        assert_eq!(
            parse("agree on"),
            Some(Input::Command(SignupCommand::ToggleAgree(true)))
        );
        assert_eq!(parse("   "), None);
        assert_eq!(parse("quit"), Some(Input::Quit));
    }

    #[test]
    fn blur_without_value_uses_current_field_value() {
        let mut controller_values = FormValues::default();
        controller_values.email = "kept@example.com".to_string();
        assert_eq!(
            parse_input("blur email", &controller_values).expect("parse"),
            Some(Input::Command(SignupCommand::Blur {
                field: Field::Email,
                value: "kept@example.com".to_string(),
            }))
        );
    }

    #[test]
    fn rejects_unknown_input() {
        let values = FormValues::default();
        assert!(parse_input("launch", &values).is_err());
        assert!(parse_input("set colour red", &values).is_err());
        assert!(parse_input("agree maybe", &values).is_err());
        assert!(parse_input("blur", &values).is_err());
    }
}
