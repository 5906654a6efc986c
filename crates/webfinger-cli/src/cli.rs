//! CLI argument definitions.

use clap::Parser;

/// Look up the WebFinger descriptor of an account or URI.
#[derive(Parser, Debug)]
#[command(name = "webfinger")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Example: webfinger -v bob@example.com")]
pub struct Cli {
    /// Resource to look up (e.g., bob@example.com or https://example.com/bob)
    pub resource: String,

    /// Only request links with this relation type (repeatable)
    #[arg(long = "rel", value_name = "REL")]
    pub rels: Vec<String>,

    /// Never fall back to plain HTTP when HTTPS is refused
    #[arg(long)]
    pub https_only: bool,

    /// Print details about the resolution (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}
