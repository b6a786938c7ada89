//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - tools: list available tools
//! - schema: print a tool's input schema
//! - call: validate, route and run a tool
//! - probe: check object store connectivity
//! - ingest: process a log subscription event

use avtools::upstream::Entitlement;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// avtools - validated access to market data APIs
#[derive(Parser, Debug)]
#[command(name = "avtools")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available tools
    Tools,

    /// Print the JSON input schema of a tool
    Schema {
        /// Tool name
        tool: String,
    },

    /// Call a tool
    Call {
        /// Tool name
        tool: String,

        /// Parameters as a JSON object
        #[arg(long)]
        params: Option<String>,

        /// Single parameter as key=value (repeatable, overrides --params)
        #[arg(short = 'p', long = "param")]
        param: Vec<String>,

        /// Data entitlement (realtime, delayed)
        #[arg(short, long, value_parser = parse_entitlement)]
        entitlement: Option<Entitlement>,
    },

    /// Check connectivity to the object store
    Probe,

    /// Ingest a log subscription event from a JSON file
    Ingest {
        /// Path to the event JSON
        file: PathBuf,

        /// Usage marker to match (defaults to config)
        #[arg(short, long)]
        marker: Option<String>,
    },
}

fn parse_entitlement(value: &str) -> Result<Entitlement, String> {
    value.parse()
}
