// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  sluice watch --url wss://events.example.com/stream -C acme
  sluice pending acme        List events queued while offline
  sluice reset acme          Replay the channel from now on next connect
  sluice sweep               Drop expired snapshots and old synced events";

#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(about = "Real-time channel subscriptions that survive going offline")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides the configuration)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Subscribe to channels and print events as JSON lines
    Watch {
        /// Subscription URL (overrides the configuration)
        #[arg(long)]
        url: Option<String>,

        /// Channel to subscribe to (repeatable)
        #[arg(short = 'C', long = "channel")]
        channels: Vec<String>,
    },

    /// List events queued for a channel
    Pending {
        /// Channel key
        channel: String,

        /// Include entries already delivered
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Forget a channel's resume token
    Reset {
        /// Channel key
        channel: String,
    },

    /// Delete expired snapshots and synced events past retention
    Sweep {
        /// Channel to sweep (repeatable, default: every queued channel)
        #[arg(short = 'C', long = "channel")]
        channels: Vec<String>,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
