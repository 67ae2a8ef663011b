//! CLI argument definitions for cctest.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use cctest_core::RunRequest;

/// Cross-chain interoperability test runner.
///
/// Connects to the Poly relay chain and every side chain, runs the selected
/// test cases and then waits for SIGINT, SIGTERM or SIGHUP.
#[derive(Parser, Debug)]
#[command(name = "cctest")]
#[command(version, about, long_about = None)]
pub struct RunnerCli {
    /// Path to the configuration file (JSON, or TOML for `.toml` paths).
    #[arg(long = "cfg", default_value = "./config.json")]
    pub config: PathBuf,

    /// Test cases to run, separated by ','. Empty runs every registered case.
    #[arg(short = 't', long = "cases", default_value = "")]
    pub cases: String,

    /// Number of times the whole selection runs.
    #[arg(long = "loop", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub loops: u32,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Exit after the run instead of waiting for a signal.
    ///
    /// The exit status is 1 if any case failed.
    #[arg(long)]
    pub no_wait: bool,

    /// Print the built-in test cases and exit.
    #[arg(long)]
    pub list: bool,
}

impl RunnerCli {
    /// The run request described by `-t` and `--loop`.
    pub fn run_request(&self) -> RunRequest {
        RunRequest::new(RunRequest::parse_case_list(&self.cases), self.loops)
    }
}
