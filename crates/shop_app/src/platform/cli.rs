use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "shopsync",
    version,
    about = "Keep a forum shop thread in sync with your priced items"
)]
pub struct Cli {
    /// Settings file (RON). Created by `configure` when missing.
    #[arg(long, env = "SHOPSYNC_SETTINGS", default_value = "settings.ron")]
    pub settings: PathBuf,

    /// `Cookie` header of a logged-in forum session.
    #[arg(long, env = "SHOPSYNC_SESSION_COOKIE", hide_env_values = true)]
    pub session_cookie: Option<String>,

    /// Also write the log to ./shop_sync.log.
    #[arg(long)]
    pub log_file: bool,

    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the shop text for an item snapshot without contacting the forum.
    Render {
        /// Item snapshot (JSON).
        items: PathBuf,
        /// Print the fingerprint of the rendered text instead of the text.
        #[arg(long)]
        fingerprint: bool,
    },
    /// Push the rendered shop to the forum thread.
    Update {
        /// Item snapshot (JSON).
        items: PathBuf,
    },
    /// Post a bump reply to the shop thread.
    Bump,
    /// Keep running: reload the snapshot on every tick, update and bump as configured.
    Watch {
        /// Item snapshot (JSON), re-read on every tick.
        items: PathBuf,
    },
    /// Change stored settings.
    Configure(ConfigureArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigureArgs {
    /// Forum thread id hosting the shop.
    #[arg(long)]
    pub thread: Option<String>,

    /// File with the shop template; must contain `[items]`.
    #[arg(long, value_name = "FILE")]
    pub template_file: Option<PathBuf>,

    #[arg(long)]
    pub auto_update: Option<bool>,

    #[arg(long)]
    pub auto_bump: Option<bool>,

    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub bump_message: Option<String>,

    #[arg(long, value_name = "MINUTES")]
    pub min_bump_interval: Option<u64>,

    #[arg(long, value_name = "MINUTES")]
    pub tick_interval: Option<u64>,
}
