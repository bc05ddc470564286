//! CLI argument definitions for the `ranctl` binary.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use ranctl_core::config::RanctlConfig;

/// Remote gNB/5GC/UE scenario runner.
///
/// Pushes configuration, starts components in dependency order, runs the
/// scenario and stops everything that was started.
#[derive(Parser, Debug)]
#[command(name = "ranctl")]
#[command(version, about, long_about = None)]
pub struct RunnerCli {
    /// Path to ranctl.toml configuration file.
    #[arg(short, long, default_value = "ranctl.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without contacting any component.
    #[arg(long)]
    pub validate: bool,

    /// Override the artifacts directory.
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,
}

impl RunnerCli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut RanctlConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(dir) = &self.artifacts_dir {
            config.general.artifacts_dir = dir.display().to_string();
        }
    }
}
