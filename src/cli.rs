//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Download subtitles and episodes of tracked shows.
///
/// Without arguments the whole subtitle feed is processed. Configuration
/// comes from the environment (ASSED_HOME, FEED_URL, DOWNLOAD_CLIENT, ...).
#[derive(Parser, Debug)]
#[command(name = "assed")]
#[command(author, version, about)]
pub struct Args {
    /// Process a single subtitle release page instead of the feed
    pub url: Option<String>,

    /// Show to use when none of the page's categories is tracked
    #[arg(requires = "url")]
    pub show: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Log level used when RUST_LOG is not set
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }

        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
