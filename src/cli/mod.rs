//! Command-line interface

mod account;
mod milk;
mod report;
mod users;

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::logging;
use crate::services::{capabilities_for, AuthSession, Capabilities, FileStore, HttpApi, Session};
use crate::types::{MilktrackError, Result};

/// Milk collection dashboard and client
#[derive(Parser)]
#[command(name = "milktrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend API base URL (e.g. http://localhost:8080/api)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui,

    /// Sign in and remember the session
    Login(account::LoginArgs),

    /// Register a new account
    Signup(account::SignupArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user and what they may do
    Whoami,

    /// Show dashboard statistics
    Dashboard(report::DashboardArgs),

    /// Manage milk entries
    #[command(subcommand)]
    Milk(milk::MilkCommand),

    /// Manage user accounts
    #[command(subcommand)]
    Users(users::UsersCommand),

    /// Change your password
    Password(account::PasswordArgs),
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let data_dir = Config::data_dir()?;
        let command = self.command.unwrap_or(Commands::Tui);

        // before config resolution so its debug output is kept
        if matches!(command, Commands::Tui) {
            logging::init_file(self.verbose, &Config::log_path_in(&data_dir))?;
        } else {
            logging::init_stderr(self.verbose);
        }
        let config = Config::load(data_dir, self.api_url.as_deref())?;

        command.run(&mut Context::new(config))
    }
}

impl Commands {
    fn run(self, ctx: &mut Context) -> anyhow::Result<()> {
        match self {
            Self::Tui => return crate::tui::run(ctx.config.clone()),
            Self::Login(args) => args.run(ctx)?,
            Self::Signup(args) => args.run(ctx)?,
            Self::Logout => account::logout(ctx)?,
            Self::Whoami => account::whoami(ctx)?,
            Self::Dashboard(args) => args.run(ctx)?,
            Self::Milk(cmd) => cmd.run(ctx)?,
            Self::Users(cmd) => cmd.run(ctx)?,
            Self::Password(args) => args.run(ctx)?,
        }
        Ok(())
    }
}

/// Config plus the stored session, shared by every subcommand
pub(crate) struct Context {
    config: Config,
    auth: AuthSession<FileStore>,
}

impl Context {
    fn new(config: Config) -> Self {
        let auth = AuthSession::restore(FileStore::new(&config.data_dir));
        Self { config, auth }
    }

    /// Client carrying the stored token, if any
    fn api(&self) -> Result<HttpApi> {
        Ok(HttpApi::new(&self.config)?.with_token(self.auth.token().map(str::to_string)))
    }

    fn session(&self) -> Result<&Session> {
        self.auth.require()
    }

    fn capabilities(&self) -> Capabilities {
        capabilities_for(self.auth.current())
    }

    /// Fail unless signed in and `allowed`
    fn ensure(&self, allowed: bool, action: &str) -> Result<()> {
        self.session()?;
        if allowed {
            Ok(())
        } else {
            Err(MilktrackError::Permission(format!(
                "{} requires an administrator account",
                action
            )))
        }
    }

    /// Drop the stored session when the backend rejected it
    fn checked<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_auth_failure() {
                warn!(error = %e, "backend rejected the session, signing out");
                if let Err(e) = self.auth.logout() {
                    warn!(error = %e, "failed to clear stored session");
                }
            }
        }
        result
    }
}

/// Read one line from stdin after printing `prompt` to stderr
fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask a yes/no question; anything but y/yes is "no"
fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", question))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| MilktrackError::Parse(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["milktrack"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "milktrack",
            "whoami",
            "--api-url",
            "http://example.test/api",
            "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Whoami)));
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/api"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_login() {
        let cli =
            Cli::try_parse_from(["milktrack", "login", "-u", "admin", "-p", "secret"]).unwrap();
        match cli.command {
            Some(Commands::Login(args)) => {
                assert_eq!(args.username, "admin");
                assert_eq!(args.password.as_deref(), Some("secret"));
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["milktrack", "backup"]).is_err());
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}
