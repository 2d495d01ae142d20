use anyhow::Result;
use clap::Parser;
use docqa_cli::{Cli, Commands, run_chat};
use docqa_server::{ServerConfig, run_server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let assistant = cli.options.assistant()?;

    match cli.command {
        Commands::Chat { file } => run_chat(&assistant, file.as_deref()).await,
        Commands::Serve { host, port } => run_server(ServerConfig { host, port }, assistant).await,
    }
}
