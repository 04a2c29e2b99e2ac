//! Guild Dispatch Bot - Main Entry Point
//!
//! Runs the command dispatcher against a console gateway: every stdin line is
//! a chat message and replies are printed to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use guild_dispatch_bot::commands::StaticCommandTable;
use guild_dispatch_bot::config::{BotSettings, CommunityConfigStore, CustomConfigFile};
use guild_dispatch_bot::dispatch::{
    CounterSet, Dispatcher, DispatcherServices, LoggingErrorTracker,
};
use guild_dispatch_bot::gateway::{
    Author, ChannelId, CommunityId, ConsoleGateway, ConsoleSource, UserId,
};
use guild_dispatch_bot::store::LocalDatabase;

/// Command dispatcher for a chat community bot.
#[derive(Parser, Debug)]
#[command(name = "guild_dispatch_bot")]
#[command(about = "Dispatch chat commands typed on the console")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Directory of per-community config files (overrides `CONFIG_DIRECTORY`).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Aliases and custom commands file (overrides `CUSTOM_CONFIG_PATH`).
    #[arg(long)]
    custom_config: Option<PathBuf>,

    /// Community the console user posts in.
    #[arg(long, default_value_t = 100)]
    community: u64,

    /// Channel the console user posts in.
    #[arg(long, default_value_t = 10)]
    channel: u64,

    /// User id of the console user.
    #[arg(long, default_value_t = 2)]
    user_id: u64,

    /// Display name of the console user.
    #[arg(long, default_value = "console")]
    user_name: String,

    /// Generate an example custom config file and exit.
    #[arg(long)]
    generate_custom_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    if args.generate_custom_config {
        return generate_example_custom_config();
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let mut settings =
        BotSettings::from_env().context("Failed to load bot settings from environment")?;
    if let Some(dir) = args.config_dir {
        settings.config_directory = dir;
    }
    if let Some(path) = args.custom_config {
        settings.custom_config_path = path;
    }

    let custom = CustomConfigFile::load_or_default(&settings.custom_config_path)
        .with_context(|| {
            format!(
                "Failed to load custom config from {}",
                settings.custom_config_path.display()
            )
        })?;
    info!(
        "Loaded custom config for {} communities from {}",
        custom.len(),
        settings.custom_config_path.display()
    );

    let database = LocalDatabase::new(
        CommunityConfigStore::new(settings.config_directory.clone()),
        custom,
        settings.blacklisted_users.iter().copied(),
    );

    let services = DispatcherServices {
        database: Arc::new(database.clone()),
        custom_configs: Arc::new(database.clone()),
        commands: Arc::new(StaticCommandTable::with_builtins(Arc::new(database))),
        gateway: Arc::new(ConsoleGateway::new(settings.bot_user_id)),
        errors: Arc::new(LoggingErrorTracker::new()),
        counters: Arc::new(CounterSet::new()),
    };
    let dispatcher = Arc::new(
        Dispatcher::new(services, settings.command_prefix).with_deployment(settings.deployment),
    );

    let source = ConsoleSource::new(
        Author::new(UserId(args.user_id), args.user_name),
        CommunityId(args.community),
        ChannelId(args.channel),
    );

    info!("Starting dispatch bot...");
    info!(
        "Default prefix: {} (deployment: {}, configs: {})",
        settings.command_prefix,
        settings.deployment,
        settings.config_directory.display()
    );
    info!("Type messages below. Use Ctrl+C to stop.");

    tokio::select! {
        result = run_console(Arc::clone(&dispatcher), source) => {
            result.context("Failed to read console input")?;
            info!("Console input closed, shutting down...");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    for (name, value) in dispatcher.counters().snapshot() {
        info!("{}: {}", name, value);
    }

    Ok(())
}

/// Dispatches every stdin line, each on its own task.
async fn run_console(dispatcher: Arc<Dispatcher>, source: ConsoleSource) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = tokio::task::JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let Some(message) = source.parse_line(&line) else {
            continue;
        };
        let dispatcher = Arc::clone(&dispatcher);
        tasks.spawn(async move {
            let outcome = dispatcher.handle_message(message).await;
            if !outcome.is_silent() {
                debug!("Message outcome: {}", outcome);
            }
        });

        // Reap finished tasks so the set does not grow unbounded.
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                error!("Dispatch task failed: {}", e);
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Dispatch task failed: {}", e);
        }
    }
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Generates an example custom config file.
fn generate_example_custom_config() -> Result<()> {
    let example = CustomConfigFile::example();
    example.save_to_file("custom.example.json")?;

    println!("✓ Example custom config written to: custom.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy custom.example.json to custom.json");
    println!("2. Edit the aliases and custom commands to your liking");
    println!("3. Optionally create a .env file with COMMAND_PREFIX and DEPLOYMENT");
    println!("4. Run: guild_dispatch_bot");

    Ok(())
}
