//! Command-line parsing tests.

use std::path::PathBuf;

use clap::Parser;
use cctest_runner::cli::RunnerCli;

#[test]
fn test_defaults() {
    let cli = RunnerCli::try_parse_from(["cctest"]).expect("no arguments should parse");

    assert_eq!(cli.config, PathBuf::from("./config.json"));
    assert_eq!(cli.cases, "");
    assert_eq!(cli.loops, 1);
    assert!(!cli.no_wait);
    assert!(!cli.list);
    assert!(cli.log_level.is_none());

    let request = cli.run_request();
    assert!(request.cases.is_empty(), "empty -t selects every case");
    assert_eq!(request.loops, 1);
}

#[test]
fn test_case_list_and_loop() {
    // Given: a comma separated list with stray whitespace and blanks
    let cli = RunnerCli::try_parse_from([
        "cctest",
        "--cfg",
        "/etc/cctest/config.toml",
        "-t",
        "relay_height, eth_chain_id,,chain_heights",
        "--loop",
        "3",
    ])
    .expect("should parse");

    // When: building the run request
    let request = cli.run_request();

    // Then: names are trimmed and kept in order
    assert_eq!(cli.config, PathBuf::from("/etc/cctest/config.toml"));
    assert_eq!(
        request.cases,
        vec!["relay_height", "eth_chain_id", "chain_heights"]
    );
    assert_eq!(request.loops, 3);
}

#[test]
fn test_loop_must_be_positive() {
    let result = RunnerCli::try_parse_from(["cctest", "--loop", "0"]);
    assert!(result.is_err(), "--loop 0 should be rejected");

    let result = RunnerCli::try_parse_from(["cctest", "--loop", "-2"]);
    assert!(result.is_err(), "negative --loop should be rejected");
}

#[test]
fn test_flags_and_log_overrides() {
    let cli = RunnerCli::try_parse_from([
        "cctest",
        "--no-wait",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ])
    .expect("should parse");

    assert!(cli.no_wait);
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert_eq!(cli.log_format.as_deref(), Some("json"));
}

#[test]
fn test_list_flag() {
    let cli = RunnerCli::try_parse_from(["cctest", "--list"]).expect("should parse");
    assert!(cli.list);
}

#[test]
fn test_unknown_argument_rejected() {
    assert!(RunnerCli::try_parse_from(["cctest", "--bogus"]).is_err());
}
