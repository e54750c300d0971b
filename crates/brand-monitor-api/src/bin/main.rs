//! Brand monitoring dashboard entry point

use brand_monitor_api::handler::{create_router, AppState, SERVICE_NAME, SERVICE_VERSION};
use brand_monitor_api::{check_secrets, load_secrets, render_config};
use brand_monitor_core::config::DEFAULT_CREDENTIALS_FILE;
use brand_monitor_core::RemoteApiFactory;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "brand-monitor")]
#[command(about = "Brand monitoring dashboard - secrets, health checks and monitoring runs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8501", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "HOST")]
        host: String,

        /// Secrets file (TOML); the environment is used when absent
        #[arg(short, long, env = "BRAND_MONITOR_SECRETS_FILE")]
        secrets_file: Option<PathBuf>,

        /// Base URL of the monitoring service
        #[arg(long, default_value = "http://localhost:8000", env = "BRAND_MONITOR_SERVICE_URL")]
        service_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "120", env = "BRAND_MONITOR_TIMEOUT_SECS")]
        timeout_secs: u64,
    },

    /// Report which required secrets are configured
    CheckSecrets {
        /// Secrets file (TOML); the environment is used when absent
        #[arg(short, long, env = "BRAND_MONITOR_SECRETS_FILE")]
        secrets_file: Option<PathBuf>,

        /// Include available key names and value lengths
        #[arg(long)]
        debug: bool,
    },

    /// Compile the secrets and print the rendered config document
    RenderConfig {
        /// Secrets file (TOML); the environment is used when absent
        #[arg(short, long, env = "BRAND_MONITOR_SECRETS_FILE")]
        secrets_file: Option<PathBuf>,

        /// Credentials path written into the document
        #[arg(long, default_value = DEFAULT_CREDENTIALS_FILE)]
        credentials_path: PathBuf,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            secrets_file,
            service_url,
            timeout_secs,
        } => {
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let secrets = load_secrets(secrets_file.as_deref())?;

            let status = secrets.status();
            if !status.all_configured {
                tracing::warn!(
                    missing = ?status.missing_secrets,
                    "Required secrets are missing; initialization will fail until they are set"
                );
            }

            let factory = RemoteApiFactory::new(service_url.clone())
                .with_timeout(Duration::from_secs(timeout_secs));
            let state = Arc::new(AppState::new(secrets, Arc::new(factory)));
            let router = create_router(state);

            tracing::info!("Starting {} {} on {}", SERVICE_NAME, SERVICE_VERSION, addr);
            tracing::info!(service_url = %service_url, "Monitoring service");

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await?;
        }

        Commands::CheckSecrets {
            secrets_file,
            debug,
        } => {
            let secrets = load_secrets(secrets_file.as_deref())?;
            let check = check_secrets(&secrets, debug)?;
            print!("{}", check.report);

            if !check.all_configured {
                std::process::exit(1);
            }
        }

        Commands::RenderConfig {
            secrets_file,
            credentials_path,
            output,
        } => {
            let secrets = load_secrets(secrets_file.as_deref())?;
            let rendered = render_config(&secrets, &credentials_path, output.as_deref())?;

            for line in &rendered.diagnostics {
                eprintln!("{}", line);
            }
            if output.is_none() {
                print!("{}", rendered.document);
            }
        }
    }

    Ok(())
}
