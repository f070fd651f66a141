mod roster;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use roster::RosterCommands;
use scrape::ScrapeCommands;

#[derive(Debug, Parser)]
#[command(name = "asxdb-cli")]
#[command(about = "ASX financial statement scraper command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage the tracked company roster
    Roster {
        #[command(subcommand)]
        command: RosterCommands,
    },
    /// Run scrape cycles in the foreground
    Scrape {
        #[command(subcommand)]
        command: ScrapeCommands,
    },
    /// Show queue length and the next company due for a refresh
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("asxdb-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = asxdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool =
        asxdb_db::connect_pool(&config.database_url, asxdb_db::PoolConfig::from_app_config(&config))
            .await?;

    match command {
        Commands::Migrate => {
            let applied = asxdb_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
        }
        Commands::Roster { command } => match command {
            RosterCommands::Sync { path } => {
                let path: PathBuf = path.unwrap_or_else(|| config.roster_path.clone());
                roster::run_roster_sync(&pool, &path).await?;
            }
            RosterCommands::List { all } => roster::run_roster_list(&pool, all).await?,
        },
        Commands::Scrape { command } => {
            let scheduler = scrape::build_scheduler(&pool, &config)?;
            match command {
                ScrapeCommands::Next => scrape::run_scrape_next(&scheduler).await?,
                ScrapeCommands::Company { code } => {
                    scrape::run_scrape_company(&scheduler, &code, config.force_rewind_days)
                        .await?;
                }
            }
        }
        Commands::Status => scrape::run_status(&pool).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
