//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cdm_packager::{DEFAULT_CONFIG_FILENAME, DEFAULT_SET_SIZE};

/// Package CONTENTdm records for batch ingest.
///
/// Fetches newspaper issues or books from a CONTENTdm catalog and writes one
/// directory per record, with metadata and image datastreams for every page.
#[derive(Parser, Debug)]
#[command(name = "cdm-packager")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write packages for record keys (from arguments or piped stdin, one per line)
    Write {
        /// Catalog record keys (CONTENTdm pointers)
        record_keys: Vec<String>,
    },

    /// Move finished packages in the output directory into numbered sets
    SplitSets {
        /// Packages per set
        #[arg(short = 'n', long, default_value_t = DEFAULT_SET_SIZE, value_parser = parse_set_size)]
        set_size: usize,
    },

    /// Validate the config file and print the resolved settings
    CheckConfig,
}

fn parse_set_size(raw: &str) -> Result<usize, String> {
    let size: usize = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    if size == 0 {
        return Err("set size must be at least 1".to_string());
    }
    Ok(size)
}
