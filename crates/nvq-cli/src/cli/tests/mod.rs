//! CLI parse tests, split by command.

use super::{Cli, CliCommand, FetchArgs};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

pub(super) fn parse_fetch(args: &[&str]) -> FetchArgs {
    match parse(args) {
        CliCommand::Fetch(fetch) => fetch,
        _ => panic!("expected Fetch"),
    }
}

mod fetch;
