//! Doghouse CLI - terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # List the menu
//! doghouse products
//!
//! # Interactive session: log in, fill the cart, check out
//! doghouse shell
//! ```
//!
//! # Commands
//!
//! - `products` - Print the product list
//! - `shell` - Interactive storefront (type `help` inside for commands)
//!
//! Configuration comes from the environment (see `StorefrontConfig`).

#![cfg_attr(not(test), forbid(unsafe_code))]
// Terminal front end: stdout is the user interface.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use doghouse_storefront::Storefront;
use doghouse_storefront::config::StorefrontConfig;
use doghouse_storefront::error::StorefrontError;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "doghouse")]
#[command(author, version, about = "Doghouse storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Skip the product cache
        #[arg(long)]
        refresh: bool,
    },
    /// Start an interactive storefront session
    Shell,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so they do not interleave with shell output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "doghouse_storefront=info,doghouse_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, config).await {
        e.report();
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), StorefrontError> {
    tracing::debug!(api = %config.api.base_url, "Using remote API");
    let storefront = Storefront::new(config)?;

    match cli.command {
        Commands::Products { refresh } => {
            if refresh {
                storefront.catalog().refresh().await;
            }
            commands::products::list(&storefront).await?;
        }
        Commands::Shell => commands::shell::run(&storefront).await?,
    }
    Ok(())
}
