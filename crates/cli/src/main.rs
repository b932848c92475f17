mod config;
mod console;
mod error;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use runtime::{
    Backend, Catalog, EmptyToolHost, McpServerConfig, McpToolHost, Orchestrator, ToolHost,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

#[derive(Parser)]
#[command(name = "mcp-chat")]
#[command(about = "Chat with a model that can call MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./mcp-chat.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// List the tools offered by the configured server
    Tools,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // A missing .env is fine.
    dotenvy::dotenv().ok();

    let mut config = Config::discover(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat(&config).await,
        Some(Commands::Tools) => cmd_tools(&config).await,
    }
}

async fn cmd_chat(config: &Config) -> Result<()> {
    let backend = config.backend_builder()?.build()?;

    println!("mcp-chat v{}", env!("CARGO_PKG_VERSION"));
    println!("Model: {}", backend.model());

    match &config.server {
        Some(server) => {
            let host = connect(server, config.connect_timeout()).await?;
            let orchestrator =
                chat(Orchestrator::new(backend, host).with_config(config.turn_config())).await?;
            orchestrator.into_tools().shutdown().await?;
        }
        None => {
            println!("No tool server configured, answering without tools.\n");
            chat(Orchestrator::new(backend, EmptyToolHost).with_config(config.turn_config()))
                .await?;
        }
    }

    println!("\nSession ended.");
    Ok(())
}

async fn chat<B: Backend, H: ToolHost>(
    mut orchestrator: Orchestrator<B, H>,
) -> Result<Orchestrator<B, H>> {
    info!(session = %orchestrator.session_id(), "session started");

    let turns = console::run(io::stdin().lock(), io::stdout(), &mut orchestrator).await?;

    info!(
        session = %orchestrator.session_id(),
        turns,
        messages = orchestrator.history().len(),
        "session ended"
    );
    Ok(orchestrator)
}

async fn cmd_tools(config: &Config) -> Result<()> {
    let server = config.server.as_ref().ok_or(Error::NoServer)?;
    let host = connect(server, config.connect_timeout()).await?;

    let catalog = Catalog::fetch(&host).await?;
    if catalog.is_empty() {
        println!("No tools offered.");
    }
    for tool in catalog.tools() {
        println!("{}", tool.name);
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
    }

    host.shutdown().await?;
    Ok(())
}

async fn connect(server: &McpServerConfig, timeout: Duration) -> Result<McpToolHost> {
    println!("Initializing client...");

    let host = tokio::time::timeout(timeout, McpToolHost::connect(server))
        .await
        .map_err(|_| Error::ConnectTimeout(timeout))??;

    match host.server_info() {
        Some(info) => println!("Connected to server: {} {}\n", info.name, info.version),
        None => println!("Connected to server: {}\n", server.command),
    }
    Ok(host)
}

/// Initialize tracing. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("runtime=debug,mcp_chat=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
