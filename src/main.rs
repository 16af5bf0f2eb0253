//! CLI entry point for the CONTENTdm packager.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result};
use cdm_packager::{CdmClient, Components, FileConfig, PackageWriter, split_into_sets, write_records};
use clap::Parser;
use tracing::{debug, info};

mod cli;
mod terminal;

use cli::{Args, Command};
use terminal::{LogTarget, init_tracing, record_progress, resolve_log_level, should_show_progress};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = FileConfig::load(&args.config);
    let configured_level = loaded
        .as_ref()
        .ok()
        .and_then(|config| config.logging.level.as_deref())
        .map(str::to_ascii_lowercase);
    let (level, force_cli_level) = resolve_log_level(args.quiet, args.verbose, configured_level.as_deref());
    init_tracing(&LogTarget {
        level,
        force_cli_level,
        path: loaded
            .as_ref()
            .ok()
            .and_then(|config| config.logging.path_to_log.as_deref()),
    })?;

    debug!(?args, "CLI arguments parsed");
    let config = loaded.with_context(|| format!("invalid config {}", args.config.display()))?;

    match &args.command {
        Command::CheckConfig => check_config(&args.config, &config),
        Command::SplitSets { set_size } => {
            let summary = split_into_sets(&config.writer.output_directory, &config.writer.metadata_filename, *set_size)
                .with_context(|| format!("cannot split {}", config.writer.output_directory.display()))?;
            info!(packages = summary.packages, sets = summary.sets.len(), "split complete");
            Ok(())
        }
        Command::Write { record_keys } => write(&args, &config, record_keys).await,
    }
}

fn check_config(path: &Path, config: &FileConfig) -> Result<()> {
    let settings = config.writer_settings()?;
    println!("config: {} is valid", path.display());
    println!("writer: {}", config.writer.class);
    println!("output directory: {}", settings.output_directory.display());
    if config.writer.datastreams.is_empty() {
        println!("datastreams: all");
    } else {
        println!("datastreams: {}", config.writer.datastreams.join(", "));
    }
    println!("file getter: {}", config.file_getter.class);
    println!("metadata parser: {}", config.metadata_parser.class);
    println!("catalog: {} ({})", config.catalog.ws_url, config.catalog.alias);
    Ok(())
}

async fn write(args: &Args, config: &FileConfig, record_keys: &[String]) -> Result<()> {
    // Read input: from positional args or stdin
    let keys: Vec<String> = if !record_keys.is_empty() {
        record_keys.to_vec()
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("cannot read record keys from stdin")?;
        buffer.lines().map(str::to_string).collect()
    } else {
        info!("No record keys provided. Pass them as arguments or pipe them via stdin.");
        info!("Example: echo 1234 | cdm-packager write");
        return Ok(());
    };
    let keys: Vec<String> = keys
        .into_iter()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect();
    if keys.is_empty() {
        info!("No record keys found in input");
        return Ok(());
    }

    let client = CdmClient::new(config.client_config()).context("cannot build catalog client")?;
    let components = Components::from_config(config)?;
    let mut writer = PackageWriter::new(
        components.profile,
        config.writer_settings()?,
        &client,
        components.files.as_ref(),
        components.metadata.as_ref(),
    );

    let progress = record_progress(should_show_progress(io::stderr().is_terminal(), args.quiet), keys.len());
    info!(records = keys.len(), writer = %config.writer.class, "writing packages");
    let result = write_records(&mut writer, &client, components.metadata.as_ref(), &keys, |key| {
        progress.set_message(key.to_string());
        progress.inc(1);
    })
    .await;
    progress.finish_and_clear();
    let summary = result.context("run stopped")?;

    info!(
        written = summary.written,
        not_found = summary.not_found,
        skipped = summary.skipped,
        "Run complete"
    );
    Ok(())
}
