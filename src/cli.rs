use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect dashboard filters and their URL encoding
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML config file
    #[arg(short, long, global = true, env = "DASH_FILTERS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a dashboard's filters and show the result
    Compile {
        /// Dashboard definition (JSON)
        file: PathBuf,
    },
    /// Encode the current filter selection as a FILTERS parameter value
    Encode {
        file: PathBuf,

        /// Only encode filters affecting this widget
        #[arg(short, long)]
        widget: Option<String>,

        /// Skip filters that target every widget
        #[arg(long)]
        ignore_target_all: bool,
    },
    /// Apply a FILTERS parameter and show the resulting selection
    Decode {
        file: PathBuf,

        /// Parameter value, e.g. "TARGET:*;FILTER:..."
        #[arg(short, long, conflicts_with = "url", required_unless_present = "url")]
        param: Option<String>,

        /// URL carrying a FILTERS query parameter
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Build a share URL carrying the active filters
    ShareUrl {
        file: PathBuf,

        /// Current page URL
        #[arg(short, long)]
        url: String,

        /// FILTERS parameter to apply before sharing
        #[arg(short, long)]
        param: Option<String>,
    },
    /// Show which filters affect, display on and are used by a widget
    Widget {
        file: PathBuf,

        /// Widget id
        widget: String,
    },
    /// Select values of one filter and apply it
    Apply {
        file: PathBuf,

        /// Target property of the filter
        #[arg(short = 'p', long)]
        property: String,

        /// Value paths to select (repeatable); none clears the filter
        #[arg(short, long = "select")]
        select: Vec<String>,

        /// Negate the selection
        #[arg(long)]
        exclude: bool,

        /// Skip widget notifications
        #[arg(long)]
        quiet_widgets: bool,
    },
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
