//! Standalone validator for community config files.
//!
//! Checks every `*.config.json` file in a directory: the file name must carry
//! a community id, the content must parse, and the prefix must be usable.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use guild_dispatch_bot::config::{
    BotSettings, CONFIG_FILE_SUFFIX, CommunityConfig, CommunityConfigError,
};

/// Community config validator.
#[derive(Parser, Debug)]
#[command(name = "validate_community_configs")]
#[command(about = "Validates per-community config files of the dispatch bot")]
#[command(version)]
struct Args {
    /// Directory holding the `<id>.config.json` files
    /// (defaults to `CONFIG_DIRECTORY`, then `config`).
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Show details for every valid file.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let dir = args
        .dir
        .unwrap_or_else(|| BotSettings::from_env_with_defaults().config_directory);
    validate_directory(&dir, args.verbose).await
}

async fn validate_directory(dir: &Path, verbose: bool) -> ExitCode {
    println!("Validating: {}\n", dir.display());

    let mut paths = match config_files(dir).await {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("✗ Failed to read directory: {e}");
            return ExitCode::FAILURE;
        }
    };
    paths.sort();

    let mut errors = 0;
    for path in &paths {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );

        match validate_file(path).await {
            Ok(config) => {
                if verbose {
                    println!(
                        "✓ {name}: {} community, prefix {}, {} ignored channel(s)",
                        config.server_type,
                        config.prefix.as_deref().unwrap_or("(default)"),
                        config.ignored_channels.len()
                    );
                }
            }
            Err(e) => {
                errors += 1;
                println!("✗ {name}: {e}");
            }
        }
    }

    println!();

    let total = paths.len();
    if errors == 0 {
        println!("✓ All {total} community configs are valid!");
        ExitCode::SUCCESS
    } else {
        println!("✗ Validation failed: {errors} error(s) in {total} files");
        println!("  Valid: {}/{total}", total - errors);
        ExitCode::FAILURE
    }
}

/// Lists the community config files in `dir`.
async fn config_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_config = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(CONFIG_FILE_SUFFIX));
        if is_config {
            paths.push(path);
        }
    }
    Ok(paths)
}

async fn validate_file(path: &Path) -> Result<CommunityConfig, CommunityConfigError> {
    let config = CommunityConfig::load_path(path).await?;
    config.validate()?;
    Ok(config)
}
