// tests/cli_args.rs

use clap::Parser;

use watch_run::cli::CliArgs;
use watch_run::types::TerminatedOutput;

#[test]
fn test_name_and_trailing_command_are_separate() {
    let args =
        CliArgs::try_parse_from(["watch-run", "-w", "lib", "parser", "--", "make", "check"])
            .unwrap();

    assert_eq!(args.test_name.as_deref(), Some("parser"));
    assert_eq!(args.command, vec!["make", "check"]);
    assert_eq!(args.watch, vec!["lib"]);
}

#[test]
fn once_conflicts_with_no_initial_run() {
    let res = CliArgs::try_parse_from(["watch-run", "--once", "--no-initial-run"]);
    assert!(res.is_err());
}

#[test]
fn unknown_terminated_output_is_rejected_by_the_parser() {
    let res = CliArgs::try_parse_from(["watch-run", "--terminated-output", "keep"]);
    assert!(res.is_err());
}

#[test]
fn overrides_carry_flags() {
    let args = CliArgs::try_parse_from([
        "watch-run",
        "-d",
        "50",
        "--terminated-output",
        "discard",
        "-i",
        "*.log",
        "foo",
    ])
    .unwrap();
    let o = args.overrides();

    assert_eq!(o.debounce_ms, Some(50));
    assert_eq!(o.terminated_output, Some(TerminatedOutput::Discard));
    assert_eq!(o.exclude, vec!["*.log"]);
    assert_eq!(o.filter.as_deref(), Some("foo"));
    assert!(o.command.is_empty());
}
