//! Tandem CLI - command-line front end for Tandem listening groups.
//!
//! Every command runs one operation against a JSON data file and prints the
//! result as JSON on stdout. Logs go to stderr.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tandem_core::{bootstrap_services, JsonFileStore, TandemApi, TandemError};

use crate::config::CliConfig;

/// Tandem - listening groups with synchronized Spotify playback.
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn", env = "TANDEM_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Data file holding users and groups (overrides config file).
    #[arg(short = 'd', long, env = "TANDEM_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Bearer token from `tandem login`.
    #[arg(short, long, env = "TANDEM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new user.
    Register { username: String, password: String },
    /// Log in and print a bearer token.
    Login { username: String, password: String },
    /// Link a Spotify access token to your account.
    LinkAccount { account_token: String },
    /// Join a group, creating it if needed. Leaves your current group.
    Join { group: String },
    /// List all groups.
    Groups,
    /// List the members of your group and what they are playing.
    Members,
    /// Play your current track on every member's account.
    Sync,
    /// Show your listening personality.
    Personality,
    /// Create a playlist from another user's top tracks.
    Playlist { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::debug!("Tandem CLI v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(data_file) = args.data_file.clone() {
        config.data_file = data_file;
    }

    log::debug!("Using data file: {}", config.data_file.display());

    let token_secret = config.require_token_secret()?;
    let core_config = config.to_core_config();
    let store = Arc::new(JsonFileStore::new(config.data_file.clone()));
    let services = bootstrap_services(&core_config, store, Some(token_secret))
        .map_err(describe)
        .context("Failed to bootstrap services")?;

    run(&services.api, &args).await
}

/// Runs the selected command and prints its result.
async fn run(api: &TandemApi, args: &Args) -> Result<()> {
    match &args.command {
        Command::Register { username, password } => {
            api.register(username, password).await.map_err(describe)?;
            print_json(&json!({ "registered": username.trim() }))
        }
        Command::Login { username, password } => {
            print_json(&api.login(username, password).await.map_err(describe)?)
        }
        Command::LinkAccount { account_token } => {
            api.link_account(credential(args)?, account_token)
                .await
                .map_err(describe)?;
            print_json(&json!({ "linked": true }))
        }
        Command::Join { group } => {
            print_json(&api.join_group(credential(args)?, group).await.map_err(describe)?)
        }
        Command::Groups => print_json(&api.group_list(credential(args)?).await.map_err(describe)?),
        Command::Members => {
            print_json(&api.group_members(credential(args)?).await.map_err(describe)?)
        }
        Command::Sync => {
            let results = api
                .sync_current_track(credential(args)?)
                .await
                .map_err(describe)?;
            let failed = results.iter().filter(|r| !r.success).count();
            if failed > 0 {
                log::warn!("{} of {} member(s) could not be synced", failed, results.len());
            }
            print_json(&results)
        }
        Command::Personality => {
            print_json(&api.personality(credential(args)?).await.map_err(describe)?)
        }
        Command::Playlist { username } => print_json(
            &api.playlist_from_top_tracks(credential(args)?, username)
                .await
                .map_err(describe)?,
        ),
    }
}

/// Returns the bearer token given on the command line or in the environment.
fn credential(args: &Args) -> Result<&str> {
    args.token
        .as_deref()
        .context("No bearer token: pass --token or set TANDEM_TOKEN (see `tandem login`)")
}

/// Attaches the machine-readable code to a core error.
fn describe(err: TandemError) -> anyhow::Error {
    anyhow::anyhow!("{} [{}]", err, err.code())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", out);
    Ok(())
}
