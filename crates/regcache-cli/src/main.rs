#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::fn_params_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use regcache_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "regcache")]
#[command(author, version, about = "Inspect, merge and validate package registry manifests", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output and JSON log lines
    #[arg(long, global = true)]
    json: bool,

    /// Read configuration from a JSON file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Repair a manifest and print the result
    Normalize {
        /// Manifest file
        file: PathBuf,
    },

    /// Merge an uplink manifest into a cached one
    Merge {
        /// Cached manifest file
        cache: PathBuf,

        /// Manifest fetched from the uplink
        remote: PathBuf,

        /// Record the fetch under this uplink id
        #[arg(long, value_name = "ID")]
        uplink: Option<String>,

        /// ETag the uplink answered with
        #[arg(long, requires = "uplink")]
        etag: Option<String>,
    },

    /// Reduce a manifest to the fields a client may see
    Project {
        /// Manifest file
        file: PathBuf,

        /// Keep `_uplinks` bookkeeping
        #[arg(long)]
        keep_uplinks: bool,
    },

    /// Print the effective readme of a manifest
    Readme {
        /// Manifest file
        file: PathBuf,
    },

    /// Point a dist-tag at a version
    Tag {
        /// Manifest file
        file: PathBuf,

        /// Target version
        version: String,

        /// Tag name
        tag: String,
    },

    /// Check the shape of a publish body
    ValidatePublish {
        /// Publish body file
        file: PathBuf,
    },

    /// Print the search record of a manifest
    Search {
        /// Manifest file
        file: PathBuf,

        /// Modification timestamp (defaults to `time.modified`, then now)
        #[arg(long)]
        modified: Option<String>,
    },

    /// Print the revision that follows REV
    Revision {
        /// Current revision, e.g. "3-9f2c..."
        rev: String,
    },

    /// Check that a package name is free on every uplink
    Exists {
        /// Package name
        name: String,

        /// Uplink base URL (repeatable, added after configured uplinks)
        #[arg(long = "uplink", value_name = "URL")]
        uplinks: Vec<String>,

        /// Accept the name when an uplink cannot be reached
        #[arg(long)]
        allow_offline: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path).into_diagnostic()?,
        None => Config::default().with_env_overrides(),
    };
    let verbosity = config.verbosity.max(cli.verbose);
    let json_logs = config.json_logs || cli.json;
    let config = config
        .with_verbosity(verbosity)
        .with_json_logs(json_logs);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Commands::Normalize { file } => commands::normalize::run(&file),
        Commands::Merge {
            cache,
            remote,
            uplink,
            etag,
        } => commands::merge::run(&cache, &remote, uplink.as_deref(), etag.as_deref()),
        Commands::Project { file, keep_uplinks } => {
            commands::project::run(&file, keep_uplinks || config.keep_uplink_data)
        }
        Commands::Readme { file } => commands::readme::run(&file, cli.json),
        Commands::Tag { file, version, tag } => commands::tag::run(&file, &version, &tag),
        Commands::ValidatePublish { file } => commands::publish::run(&file, cli.json),
        Commands::Search { file, modified } => commands::search::run(&file, modified),
        Commands::Revision { rev } => commands::revision::run(&rev, cli.json),
        Commands::Exists {
            name,
            uplinks,
            allow_offline,
        } => {
            let span = tracing::info_span!("exists", cmd = "exists", name = %name);
            let _guard = span.enter();
            commands::exists::run(&config, &name, &uplinks, allow_offline, cli.json)
        }
    }
}
