//! CLI - Command Line Interface for PodTUI
//!
//! Without a subcommand the interactive TUI starts. The subcommands expose
//! the directory search and feed reader for scripting.
//!
//! # Examples
//!
//! ```bash
//! # Search the directory
//! podtui search "rust" --json
//!
//! # List a feed's episodes
//! podtui episodes https://example.com/feed.xml --limit 5
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// General error (bad feed, serialization)
    Error = 1,
    InvalidArgs = 2,
    /// Request failed or the server answered with an error status
    NetworkError = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// PodTUI - terminal podcast player
///
/// Run without arguments to launch the interactive TUI.
#[derive(Parser, Debug)]
#[command(
    name = "podtui",
    version,
    about = "Terminal podcast player: search shows, browse episodes, listen",
    after_help = "EXAMPLES:\n\
                  podtui                                       Launch interactive TUI\n\
                  podtui search \"history\"                      Search for shows\n\
                  podtui episodes https://example.com/rss      List a feed's episodes"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the podcast directory for shows
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// List the episodes of a show's RSS feed
    #[command(visible_alias = "e")]
    Episodes(EpisodesCmd),
}

#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search terms
    #[arg(required = true)]
    pub query: String,

    /// Maximum number of shows (defaults to the configured limit)
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct EpisodesCmd {
    /// Feed URL, as printed by `podtui search`
    pub feed_url: String,

    /// Only print the first N episodes
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }
}

impl JsonOutput<()> {
    pub fn failure(msg: impl Into<String>, code: ExitCode) -> Self {
        Self {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print data as wrapped JSON, or as `text` for humans
    pub fn print<T: Serialize>(&self, data: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&JsonOutput::success(data))?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            if let Ok(json) = serde_json::to_string_pretty(&JsonOutput::failure(&msg, code)) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet and JSON mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Feed URLs must be absolute http(s) URLs
pub fn validate_feed_url(url: &str) -> Result<&str, &'static str> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(url),
        _ => Err("Invalid feed URL (expected http:// or https://)"),
    }
}

// =============================================================================
// Tests
// =============================================================================
