use campus_cli::CliArgs;
use clap::Parser;
use std::path::PathBuf;

#[test]
fn parses_a_file_argument() {
    let cli = CliArgs::try_parse_from(["campus-cli", "schedule.xlsx"]).expect("parse");
    assert_eq!(cli.file, PathBuf::from("schedule.xlsx"));
    assert!(!cli.pretty);
}

#[test]
fn parses_the_pretty_flag() {
    let cli =
        CliArgs::try_parse_from(["campus-cli", "--pretty", "расписание.csv"]).expect("parse");
    assert_eq!(cli.file, PathBuf::from("расписание.csv"));
    assert!(cli.pretty);
}

#[test]
fn requires_a_file_argument() {
    assert!(CliArgs::try_parse_from(["campus-cli"]).is_err());
}
