//! CLI module for constel.
//!
//! Subcommands:
//! - `view`: Render a graph JSON file in 3D
//! - `track`: Run the gesture pipeline headless (diagnostic)

mod track;
mod view;

use clap::{Parser, Subcommand};

pub use track::TrackCommand;
pub use view::{HandsMode, ViewCommand};

use crate::config::Config;

/// constel - gesture-steered 3D graph visualizer
#[derive(Parser)]
#[command(name = "constel")]
#[command(about = "Gesture-steered 3D graph visualizer")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render a graph JSON file in 3D
    View(ViewCommand),

    /// Run the gesture pipeline headless and print debounced states
    Track(TrackCommand),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        let config = Config::load()?;
        match self.command {
            Command::View(cmd) => cmd.run(config).await,
            Command::Track(cmd) => cmd.run(config).await,
        }
    }
}
