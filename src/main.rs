use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ipamd::server::{self, AppState};
use ipamd::{store, Config, Result};

#[derive(Parser)]
#[command(name = "ipamd")]
#[command(author, version, about = "An IP address management service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Run,
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = Config::load_or_create(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("starting ipamd with config: {:?}", cli.config);
            let backend = store::create_store(&config.store).await?;
            let state = AppState::new(backend);

            tokio::select! {
                result = server::run(config.listen_addr, state) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("received shutdown signal, stopping server");
                    Ok(())
                }
            }
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
