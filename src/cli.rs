use clap::{Parser, Subcommand};

use crate::commands::{download, info, license, search, updates};

#[derive(Debug, Parser)]
#[command(name = "mkt")]
#[command(about = "Plugin Marketplace CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the marketplace for plugins and themes
    Search(search::Args),

    /// Show catalog details for a single plugin
    Info(info::Args),

    /// List installed plugins that have an update available
    Updates(updates::Args),

    /// Download the latest plugin package to a temporary file
    Download(download::Args),

    /// Manage the license key
    License(license::Args),
}
