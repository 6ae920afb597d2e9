use std::net::{Ipv4Addr, SocketAddrV4};

use anyhow::Context;
use cors_relay::{RelayState, app, config::Config};
use tokio::{net::TcpListener, signal};
use tracing::{instrument, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        eprintln!("could not load .env: {err}");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env().context("bad configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let state = RelayState::from_config(&config).context("could not build http client")?;
    let ip = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port);

    tracing::info!(
        "running relay at :{} ({:?} bodies)",
        config.port,
        config.body_mode
    );

    let listener = TcpListener::bind(ip)
        .await
        .with_context(|| format!("could not bind {ip}"))?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown())
        .await?;

    Ok(())
}

#[instrument(skip_all)]
async fn shutdown() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
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

    tracing::info!("shutting down..");
}
