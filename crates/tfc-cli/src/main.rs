use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tfc-cli")]
#[command(about = "Teddy Stadium fixture calendar builder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch both club schedules and write the ICS calendar.
    Sync,
    /// Fetch and print the reconciled fixture list without writing output.
    Preview,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let summary = tfc_sync::run_sync_once_from_env()?;
            println!(
                "sync complete: run_id={} beitar={} hapoel={} unique={} output={}",
                summary.run_id,
                summary.beitar_candidates,
                summary.hapoel_candidates,
                summary.unique_fixtures,
                summary.output_path
            );
        }
        Commands::Preview => {
            let fixtures = tfc_sync::preview_from_env()?;
            println!("{} upcoming fixtures at Teddy:", fixtures.len());
            for fixture in &fixtures {
                println!(
                    "  {}  {} vs {}",
                    fixture.kickoff.format("%a %d/%m/%Y %H:%M"),
                    fixture.home_team,
                    fixture.away_team
                );
            }
        }
    }

    Ok(())
}
