//! CLI parse tests.

use super::Cli;
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_no_args_serves_form() {
    let cli = parse(&["htwrap"]);
    assert!(cli.url.is_none());
    assert!(cli.output.is_none());
    assert_eq!(cli.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(cli.port, 10069);
    assert_eq!(cli.auth_port, 10070);
}

#[test]
fn cli_parse_url_and_output() {
    let cli = parse(&[
        "htwrap",
        "--url",
        "https://example.com",
        "--output",
        "downloads/example",
    ]);
    assert_eq!(cli.url.as_deref(), Some("https://example.com"));
    assert_eq!(cli.output.as_deref(), Some("downloads/example"));
}

#[test]
fn cli_parse_ports() {
    let cli = parse(&["htwrap", "--port", "8080", "--auth-port", "8081", "--host", "0.0.0.0"]);
    assert_eq!(cli.port, 8080);
    assert_eq!(cli.auth_port, 8081);
    assert_eq!(cli.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
}

#[test]
fn cli_parse_rejects_bad_port() {
    assert!(Cli::try_parse_from(["htwrap", "--port", "70000"]).is_err());
}

#[test]
fn cli_parse_rejects_positional_url() {
    assert!(Cli::try_parse_from(["htwrap", "https://example.com"]).is_err());
}
