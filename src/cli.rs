//! CLI - Command Line Interface for embedplay
//!
//! Scriptable access to the player core: list providers, resolve embed URLs,
//! print the guard script, and walk a headless session through episodes.
//! All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # List providers from the configured catalog
//! embedplay sources
//!
//! # Resolve an episode URL with a specific provider
//! embedplay resolve 1396 -t tv -s 2 -e 5 -p vidsrc
//!
//! # Walk a series across a season boundary
//! embedplay walk 1396 --seasons 1:7,2:13 -s 1 -e 7 next next prev
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{ContentKind, SeasonSummary};
use crate::player::PlayerNotice;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Provider cannot serve the request
    SourceUnavailable = 4,
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

/// embedplay - player core for embed-URL video sources
#[derive(Parser, Debug)]
#[command(
    name = "embedplay",
    version,
    about = "Resolve and walk embed-URL video sources",
    long_about = "Resolves playable embed URLs from a catalog of interchangeable \
                  providers and drives a headless player session.\n\n\
                  Set RUST_LOG=debug to trace state transitions on stderr.",
    after_help = "EXAMPLES:\n\
                  embedplay sources                         List providers\n\
                  embedplay resolve 550                     Movie URL on the default provider\n\
                  embedplay resolve 1396 -t tv -s 2 -e 5    Episode URL\n\
                  embedplay walk 1396 --seasons 1:7,2:13 -s 1 -e 7 next prev"
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

    /// Provider catalog URL (overrides config)
    #[arg(long, global = true)]
    pub sources_url: Option<String>,

    /// Local provider catalog JSON file (overrides URL)
    #[arg(long, global = true)]
    pub sources_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List providers in the catalog
    #[command(visible_alias = "ls")]
    Sources(SourcesCmd),

    /// Resolve the embed URL for a movie or episode
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Print the script injected into loaded pages
    Script(ScriptCmd),

    /// Drive a headless player session through a sequence of moves
    #[command(visible_alias = "w")]
    Walk(WalkCmd),
}

/// Content kind argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindArg {
    #[default]
    Movie,
    Tv,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => ContentKind::Movie,
            KindArg::Tv => ContentKind::Series,
        }
    }
}

// =============================================================================
// Sources Command
// =============================================================================

/// List providers in catalog order
#[derive(Args, Debug)]
pub struct SourcesCmd {}

// =============================================================================
// Resolve Command
// =============================================================================

/// Resolve a single embed URL
#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// Content ID (TMDB)
    #[arg(required = true)]
    pub id: u64,

    /// Content kind
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub kind: KindArg,

    /// Season number (TV)
    #[arg(long, short = 's', default_value = "1")]
    pub season: u32,

    /// Episode number (TV)
    #[arg(long, short = 'e', default_value = "1")]
    pub episode: u32,

    /// Provider key or index (default: first provider)
    #[arg(long, short = 'p')]
    pub provider: Option<String>,
}

// =============================================================================
// Script Command
// =============================================================================

/// Print the guard script
#[derive(Args, Debug)]
pub struct ScriptCmd {
    /// Iframe re-scan interval in milliseconds (overrides config)
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

// =============================================================================
// Walk Command
// =============================================================================

/// Walk a headless session
#[derive(Args, Debug)]
pub struct WalkCmd {
    /// Content ID (TMDB)
    #[arg(required = true)]
    pub id: u64,

    /// Content kind
    #[arg(long, short = 't', value_enum, default_value = "tv")]
    pub kind: KindArg,

    /// Season list as NUMBER:EPISODES pairs, e.g. 1:10,2:8
    #[arg(long, default_value = "")]
    pub seasons: String,

    /// Starting season
    #[arg(long, short = 's', default_value = "1")]
    pub season: u32,

    /// Starting episode
    #[arg(long, short = 'e', default_value = "1")]
    pub episode: u32,

    /// Moves: next, prev, source:N, fail
    pub moves: Vec<String>,
}

impl WalkCmd {
    /// Parse the season list
    pub fn parse_seasons(&self) -> Result<Vec<SeasonSummary>, String> {
        parse_seasons(&self.seasons)
    }

    /// Parse every move argument
    pub fn parse_moves(&self) -> Vec<WalkMove> {
        self.moves.iter().map(|m| WalkMove::parse(m)).collect()
    }
}

/// One move in a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkMove {
    Next,
    Prev,
    /// Switch to provider index
    Source(usize),
    /// Simulate a load error on the current URL
    Fail,
    Invalid(String),
}

impl WalkMove {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "next" | "n" => return WalkMove::Next,
            "prev" | "p" => return WalkMove::Prev,
            "fail" | "f" => return WalkMove::Fail,
            _ => {}
        }
        if let Some(index) = s.strip_prefix("source:") {
            if let Ok(index) = index.parse::<usize>() {
                return WalkMove::Source(index);
            }
        }
        WalkMove::Invalid(s.to_string())
    }
}

/// Parse `1:10,2:8` into season summaries
pub fn parse_seasons(s: &str) -> Result<Vec<SeasonSummary>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (number, count) = part
                .split_once(':')
                .ok_or_else(|| format!("Invalid season '{}' (expected NUMBER:EPISODES)", part))?;
            let number: u32 = number
                .trim()
                .parse()
                .map_err(|_| format!("Invalid season number in '{}'", part))?;
            let count: u32 = count
                .trim()
                .parse()
                .map_err(|_| format!("Invalid episode count in '{}'", part))?;
            if count == 0 {
                return Err(format!("Season {} must have at least one episode", number));
            }
            Ok(SeasonSummary::new(number, count))
        })
        .collect()
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
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Provider row for `sources`
#[derive(Debug, Serialize)]
pub struct ProviderRow {
    pub index: usize,
    pub key: String,
    pub name: String,
}

/// Result of `resolve`
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub provider: String,
    pub kind: ContentKind,
    pub url: String,
}

/// One line of a `walk`
#[derive(Debug, Serialize)]
pub struct WalkStep {
    #[serde(rename = "move")]
    pub action: String,
    pub label: String,
    pub source: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<PlayerNotice>,
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

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            // For non-JSON, caller should handle formatting
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print raw text (scripts, URLs)
    pub fn print_raw(&self, text: &str) {
        println!("{}", text);
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
