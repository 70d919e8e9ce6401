use std::path::PathBuf;

use clap::Parser;

use crate::cli::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Inspect the material tree of a texture project")]
pub struct Cli {
    /// The project root directory to scan
    pub root: PathBuf,

    /// Filter the tree with a search query before printing
    #[clap(long, short)]
    pub query: Option<String>,

    /// Print the command envelope as JSON instead of a text tree
    #[clap(long)]
    pub json: bool,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}
