use anyhow::Result;
use clap::Parser;

use recipeforge::config::Config;
use recipeforge::server::Server;

#[derive(Parser)]
#[command(name = "recipeforge")]
#[command(author, version)]
#[command(about = "Recipe generator web front-end backed by a hosted inference API")]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "RECIPEFORGE_CONFIG")]
    config: Option<String>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let server = Server::new(&config)?;
    server.run().await
}
