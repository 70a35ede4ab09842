//! Run the web UI.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::auth::CredentialGate;
use crate::config::secrets::REPLICATE_TOKEN_ENV;
use crate::config::{AppConfig, Secrets};
use crate::session::SessionStore;
use crate::transcription::{self, Transcriber};
use crate::web::{create_router, AppState};

/// Starts the HTTP server and blocks until Ctrl-C.
///
/// # Errors
/// - If the config or secrets file cannot be loaded
/// - If no Replicate API token is configured
/// - If the address cannot be bound
pub async fn handle_serve(
    config_path: &Path,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== transcribe Serve Command ===");

    let config = AppConfig::load_from(config_path)?;
    let secrets_path = config.secrets_path(config_path);
    let secrets = Secrets::load(&secrets_path)?;
    let options = config.transcriber.options()?;

    let api_token = secrets.replicate_token().ok_or_else(|| {
        anyhow::anyhow!(
            "No Replicate API token. Set {REPLICATE_TOKEN_ENV} or add `replicate` under [api_keys] in {}",
            secrets_path.display()
        )
    })?;

    if options.require_auth && secrets.passwords.is_empty() {
        tracing::warn!(
            "Login is required but {} has no [passwords] entries; nobody can log in",
            secrets_path.display()
        );
    }

    let client =
        transcription::replicate_client(&api_token, &options.model_version, &config.replicate.settings())?;

    match client.fetch_version().await {
        Ok(info) => tracing::info!(
            version = %info.id,
            created_at = ?info.created_at,
            "Model version {} is available",
            options.model_version.short()
        ),
        Err(e) => tracing::warn!("Could not verify model version {}: {e}", options.model_version),
    }

    let gate = CredentialGate::new(secrets.passwords);
    tracing::info!(
        preset = %config.transcriber.preset,
        require_auth = options.require_auth,
        translate = options.translate_to_english,
        users = gate.user_count(),
        "Transcriber configured"
    );

    let transcriber: Arc<dyn Transcriber> = client;
    let sessions = SessionStore::new(
        config.server.session_idle_timeout(),
        config.server.max_sessions,
    );
    tokio::spawn(evict_idle_sessions(sessions.clone()));

    let state = AppState::new(transcriber, options, gate).with_sessions(sessions);
    let router = create_router(state, config.server.max_upload_bytes());

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {host}:{port}: {e}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically drops sessions nobody has used for the idle timeout.
async fn evict_idle_sessions(sessions: SessionStore) {
    let mut ticker = tokio::time::interval(Duration::from_secs(60));
    loop {
        ticker.tick().await;
        let evicted = sessions.evict_idle();
        if evicted > 0 {
            tracing::debug!(evicted, live = sessions.len(), "Idle sessions evicted");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
