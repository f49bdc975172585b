//! prompt-compressor CLI - serve the optimizer API or run one-shot optimizations

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use prompt_compressor::{
    config::Config,
    http::{self, AppState},
    optimizer::PromptOptimizer,
    provider::{GeminiConfig, GeminiExpander},
    store::{MemoryStore, RestConfig, RestStore},
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prompt-compressor")]
#[command(about = "Expand prompts into token-dense formats and track the savings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind (overrides server.bind from the config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Keep history in memory instead of the configured store
        #[arg(long)]
        no_store: bool,
    },

    /// Optimize a single prompt and print the result
    Optimize {
        /// Prompt text
        #[arg(short, long)]
        prompt: String,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve { bind, no_store } => run_serve(bind, no_store).await?,
        Commands::Optimize { prompt } => run_optimize(prompt).await?,
        Commands::Config(cmd) => run_config(cmd)?,
    }

    Ok(())
}

fn build_optimizer(config: &Config) -> PromptOptimizer {
    let gemini = GeminiConfig {
        api_key: config.gemini_api_key().unwrap_or_default(),
        base_url: config.gemini.base_url.clone(),
        model: config.gemini.model.clone(),
    };
    PromptOptimizer::new(Box::new(GeminiExpander::new(gemini)))
}

async fn run_serve(bind: Option<String>, no_store: bool) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let optimizer = Arc::new(build_optimizer(&config));

    let state = if no_store {
        info!("history store disabled, keeping records in memory");
        let store = Arc::new(MemoryStore::new());
        AppState::new(optimizer, store.clone(), store)
    } else {
        if config.store.base_url.is_empty() {
            return Err(anyhow!(
                "store.base_url is not configured (or pass --no-store)"
            ));
        }
        let rest = RestConfig {
            base_url: config.store.base_url.clone(),
            api_key: config
                .store_api_key()
                .ok_or_else(|| anyhow!("store.api_key is not configured"))?,
            table: config.store.table.clone(),
        };
        let store = Arc::new(RestStore::new(rest));
        AppState::new(optimizer, store.clone(), store)
    };

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("listening on {bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn run_optimize(prompt: String) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let optimizer = build_optimizer(&config);
    let optimized = optimizer.optimize(&prompt).await?;

    println!("{}", serde_json::to_string_pretty(&optimized)?);

    let savings = &optimized.savings;
    let best_key = savings.best_format.key();
    println!();
    println!(
        "Best format: {} ({} tokens, {} saved, ${:.7})",
        savings.best_format,
        savings.best_format_tokens,
        savings
            .savings_percentage
            .get(best_key)
            .map(String::as_str)
            .unwrap_or("0%"),
        savings.max_savings_usd
    );

    Ok(())
}

fn run_config(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                return Err(anyhow!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                ));
            }
            Config::default().save()?;
            println!("Wrote {}", path.display());
        }
        ConfigCommands::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => {
            println!("{}", Config::default_path().display());
        }
        ConfigCommands::Validate => {
            let config = Config::load()?;
            config.validate()?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}
