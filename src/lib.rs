//! voice-bridge - Twilio Media Streams to OpenAI Realtime bridge
//!
//! Library entry: module tree plus the process bootstrap sequence.

pub mod api;
pub mod audio;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

/// Runtime overrides taken from the command line.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub port_override: Option<u16>,
}

/// Initialize logging and configuration, then serve until a termination
/// signal arrives.
///
/// The sequence is linear with two terminal outcomes: serving
/// indefinitely (returns `Ok` after a signal-driven graceful stop) or a
/// startup failure (`Err`, surfaced by `main` as a non-zero exit). There
/// is no internal retry; the hosting platform owns restart policy.
pub async fn init_and_run_bridge_with_config(runtime: RuntimeConfig) -> anyhow::Result<()> {
    init_tracing();

    let mut config = config::env::load().await?;
    if let Some(port) = runtime.port_override {
        config.port = port;
    }

    let state = Arc::new(AppState::new(config));
    let router = api::router(state.clone());

    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = bind(&addr).await?;

    // The advertised port and the bound port are the same value by
    // construction; log it so the hosting platform contract is auditable.
    info!(
        addr = %addr,
        version = config::env::constants::VERSION,
        "voice-bridge listening"
    );

    let shutdown = state::get_shutdown_token();
    spawn_signal_watcher();

    axum::serve(listener, router)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.cancelled().await }
        })
        .await
        .context("server error")?;

    info!("voice-bridge stopped");
    Ok(())
}

/// Bind the listening socket. A conflict (port already owned by another
/// process) is a fatal startup error.
async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; the default keeps dependency access logs
/// quiet while the bridge itself logs at info.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn,tungstenite=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Cancel the global shutdown token on SIGTERM or ctrl-c.
///
/// SIGTERM is what the hosting platform sends before reclaiming the
/// instance; a signal-driven stop exits zero.
fn spawn_signal_watcher() {
    tokio::spawn(async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }

        info!("Shutdown signal received");
        state::trigger_shutdown();
    });
}
