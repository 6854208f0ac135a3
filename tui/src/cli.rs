use std::path::PathBuf;

use clap::Parser;

use crate::style::ThemeName;

/// Browse a recorded conversation while drafting the next message.
///
/// On exit the draft is written to stdout so the calling program can restore it.
#[derive(Parser, Debug, Clone)]
#[command(name = "history-split", version)]
pub struct Cli {
    /// Conversation to display, one JSON entry per line.
    #[arg(long, value_name = "FILE")]
    pub session: PathBuf,

    /// Config file to use instead of `~/.history-split/config.toml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Text to seed the editor with.
    #[arg(long)]
    pub draft: Option<String>,

    /// Show tool, shell and skill blocks expanded.
    #[arg(long)]
    pub expand_tools: bool,

    #[arg(long)]
    pub hide_thinking: bool,

    /// Do not turn on mouse reporting (disables wheel scrolling).
    #[arg(long)]
    pub no_mouse: bool,

    #[arg(long, value_enum)]
    pub theme: Option<ThemeName>,

    /// Directory tool paths are shown relative to.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}
