use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["asxdb-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["asxdb-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn roster_sync_path_defaults_to_none() {
    let cli = Cli::try_parse_from(["asxdb-cli", "roster", "sync"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Roster {
            command: RosterCommands::Sync { path: None }
        })
    ));
}

#[test]
fn roster_sync_accepts_path() {
    let cli =
        Cli::try_parse_from(["asxdb-cli", "roster", "sync", "--path", "/tmp/roster.yaml"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Roster {
            command: RosterCommands::Sync { path: Some(ref p) }
        }) if p == std::path::Path::new("/tmp/roster.yaml")
    ));
}

#[test]
fn roster_list_all_flag() {
    let cli = Cli::try_parse_from(["asxdb-cli", "roster", "list", "--all"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Roster {
            command: RosterCommands::List { all: true }
        })
    ));

    let cli = Cli::try_parse_from(["asxdb-cli", "roster", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Roster {
            command: RosterCommands::List { all: false }
        })
    ));
}

#[test]
fn parses_scrape_next() {
    let cli = Cli::try_parse_from(["asxdb-cli", "scrape", "next"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            command: ScrapeCommands::Next
        })
    ));
}

#[test]
fn parses_scrape_company_code() {
    let cli = Cli::try_parse_from(["asxdb-cli", "scrape", "company", "bhp"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            command: ScrapeCommands::Company { ref code }
        }) if code == "bhp"
    ));
}

#[test]
fn scrape_company_requires_code() {
    assert!(Cli::try_parse_from(["asxdb-cli", "scrape", "company"]).is_err());
}

#[test]
fn parses_status() {
    let cli = Cli::try_parse_from(["asxdb-cli", "status"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Status)));
}

#[test]
fn fmt_refreshed_shows_never_for_epoch() {
    assert_eq!(roster::fmt_refreshed(asxdb_core::NEVER_REFRESHED), "never");
    let ts = chrono::DateTime::parse_from_rfc3339("2025-03-01T08:30:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    assert_eq!(roster::fmt_refreshed(ts), "2025-03-01 08:30:00");
}
