// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! quotabar CLI - usage and quota checker for AI coding CLIs.
//!
//! # Examples
//!
//! ```bash
//! # Every provider, detailed
//! quotabar
//!
//! # Claude only
//! quotabar --claude
//!
//! # JSON output
//! quotabar --json
//!
//! # Compact one-liner for a status bar, reusing a report up to 5 minutes old
//! quotabar --oneline both --cache-ttl 300
//! ```

mod output;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use quotabar_core::ProviderKind;
use quotabar_fetch::{FetchContext, TransportKind};
use quotabar_store::{AggregateRequest, Aggregator, Cache, CacheMode, Config};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use output::{OnelineFormatter, OnelineWindow, Style, TextFormatter, format_json};

// ============================================================================
// CLI Definition
// ============================================================================

/// quotabar - usage and quota checker for AI coding CLIs.
#[derive(Debug, Parser)]
#[command(name = "quotabar")]
#[command(about = "Check AI CLI usage/quota for Claude, Codex, Gemini, Z.AI, OpenRouter")]
#[command(after_help = r"
Credential locations (auto-discovered):
  Claude     ~/.claude/.credentials.json, or the macOS keychain
  Codex      ~/.codex/auth.json, or $OPENAI_API_KEY
  Gemini     ~/.gemini/oauth_creds.json (expired tokens are refreshed)
  Z.AI       $ZAI_API_KEY or $ZAI_KEY
  OpenRouter $OPENROUTER_API_KEY

Examples:
  quotabar                 # All providers, detailed
  quotabar --claude        # Claude only
  quotabar --json          # JSON output
  quotabar --oneline       # Compact one-liner (5h window)
  quotabar --oneline both  # Compact one-liner (5h/7d)
")]
#[command(version)]
pub struct Cli {
    /// Output the report as JSON.
    #[arg(long, conflicts_with = "oneline")]
    pub json: bool,

    /// Compact one-line output (5h, 7d or both).
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "5h", value_name = "WINDOW")]
    pub oneline: Option<OnelineWindow>,

    /// Use colored text instead of emoji status icons.
    #[arg(long)]
    pub noemoji: bool,

    /// Only check Claude Code.
    #[arg(long)]
    pub claude: bool,

    /// Only check OpenAI Codex.
    #[arg(long)]
    pub codex: bool,

    /// Only check Gemini CLI.
    #[arg(long)]
    pub gemini: bool,

    /// Only check Z.AI.
    #[arg(long)]
    pub zai: bool,

    /// Only check OpenRouter.
    #[arg(long)]
    pub openrouter: bool,

    /// Use the cached report if it is still fresh.
    #[arg(long)]
    pub cached: bool,

    /// Cache freshness in seconds (implies --cached).
    #[arg(long, value_name = "SECONDS")]
    pub cache_ttl: Option<u64>,

    /// HTTP transport (reqwest or ureq).
    #[arg(long)]
    pub transport: Option<TransportKind>,

    /// Configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr).
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Providers selected by flags; empty when none was given.
    fn selected_providers(&self) -> BTreeSet<ProviderKind> {
        [
            (self.claude, ProviderKind::Claude),
            (self.codex, ProviderKind::Codex),
            (self.gemini, ProviderKind::Gemini),
            (self.zai, ProviderKind::Zai),
            (self.openrouter, ProviderKind::OpenRouter),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect()
    }

    /// Applies command-line overrides on top of the loaded configuration.
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache_ttl_secs = ttl;
        }
        config.validate()
    }

    fn cache_mode(&self, ttl: Duration) -> CacheMode {
        if self.cached || self.cache_ttl.is_some() {
            CacheMode::UseIfFresh { ttl }
        } else {
            CacheMode::Bypass
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("quotabar=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    let config = cli.apply_overrides(loaded);
    debug!(?config, "Configuration resolved");

    let mut providers = cli.selected_providers();
    if providers.is_empty() {
        providers.extend(config.providers.iter().copied());
    }

    let cache = config.cache_settings();
    let request = AggregateRequest::all()
        .with_providers(providers)
        .with_cache(cli.cache_mode(cache.ttl));

    let ctx = FetchContext::with_settings(config.fetch_settings());
    let aggregator = Aggregator::new(ctx, Cache::new(cache.path));
    let report = aggregator.run(&request).await;

    let style = Style::from_noemoji(cli.noemoji);
    if cli.json {
        println!("{}", format_json(&report)?);
    } else if let Some(window) = cli.oneline {
        println!("{}", OnelineFormatter::new(&config.thresholds, window, style).format(&report));
    } else {
        println!("{}", TextFormatter::new(style).format_report(&report, aggregator.context().now()));
    }

    Ok(())
}
