use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_policy() {
    match parse(&["hrt", "policy"]) {
        CliCommand::Policy => {}
        _ => panic!("expected Policy"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["hrt", "download", "x"]).is_err());
}
