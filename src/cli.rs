//! Command-line interface: component I.

use clap::Parser;

/// Passively observe PostgreSQL wire traffic and report slow-query latency.
#[derive(Debug, Parser)]
#[command(name = "pgsniffer", disable_help_flag = true)]
pub struct Cli {
    /// Capture interface name.
    #[arg(short = 'i', long = "interface", default_value = "lo0")]
    pub interface: String,

    /// BPF filter expression.
    #[arg(short = 'f', long = "filter", default_value = "tcp port 5432")]
    pub filter: String,

    /// Top-N slowest queries to print on shutdown.
    #[arg(short = 'n', long = "top", default_value_t = 50)]
    pub top_n: usize,

    /// Log every captured query with its latency.
    #[arg(short = 'v', long = "verbose", default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,

    /// List interfaces and exit.
    #[arg(short = 'l', long = "list", default_value_t = false)]
    pub list_devices: bool,

    /// Print usage and list interfaces.
    #[arg(short = 'h', long = "help", default_value_t = false)]
    pub help: bool,
}
