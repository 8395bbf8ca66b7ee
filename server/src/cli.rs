use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// podbridge: republishes a remote music profile as a podcast feed.
#[derive(Debug, Parser)]
#[command(name = "podbridge", version, about)]
pub struct Cli {
    /// Path to the TOML config file. Defaults to `~/.config/podbridge/config.toml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server in the foreground (default if no subcommand given).
    Serve,
    /// Run the HTTP server and also start the watcher for `watch_music_sets`.
    Watch,
}

impl Cli {
    pub fn resolved_config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }

    pub fn should_watch(&self) -> bool {
        matches!(self.command, Some(Command::Watch))
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("podbridge")
        .join("config.toml")
}
