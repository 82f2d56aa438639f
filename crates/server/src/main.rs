use std::io::Read;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vitrine_server::config::VitrineConfig;
use vitrine_server::state_factory::{create_state, resolve_token_secret};

/// Vitrine catalog server.
#[derive(Parser, Debug)]
#[command(name = "vitrine-server", about = "Remote catalog service for Vitrine")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "vitrine.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash a password for use in `[[auth.users]]`. Reads the password from stdin.
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Commands::HashPassword) = cli.command {
        return run_hash_password();
    }

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let (mut config, found) = VitrineConfig::load(Path::new(&cli.config))?;

    vitrine_server::telemetry::init(&config.logging)?;

    if !found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let shutdown = CancellationToken::new();
    let token_secret = resolve_token_secret(&config.auth);
    let state = create_state(&config, &token_secret, shutdown.clone()).await?;
    let app = vitrine_server::api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "vitrine-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM. Open streams are
    // canceled once the signal fires so they end with a terminal status.
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("shutdown signal received, canceling in-flight calls");
            shutdown.cancel();
        }
    });

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let serve = tokio::spawn(async move { server.await });

    let result = tokio::select! {
        result = serve => result?,
        () = async {
            shutdown.cancelled().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "graceful shutdown timed out, exiting"
            );
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!(error = %e, "server error");
    }
    result?;

    info!("vitrine-server stopped");
    Ok(())
}

/// Read a password from stdin and print its argon2 hash.
fn run_hash_password() -> Result<(), Box<dyn std::error::Error>> {
    let mut password = String::new();
    std::io::stdin().read_to_string(&mut password)?;
    let password = password.trim_end_matches(['\n', '\r']);
    if password.is_empty() {
        return Err("no password provided on stdin".into());
    }

    let hash = vitrine_store::identity::hash_password(password)?;
    println!("{hash}");
    Ok(())
}

/// Wait for a SIGINT (Ctrl+C) or SIGTERM signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
