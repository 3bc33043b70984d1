// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use finance_api_server::api;
use finance_api_server::audit::{spawn_worker, AuditRecorder};
use finance_api_server::auth::{ClaimsConfig, ServiceSecretGate, TokenVerifier};
use finance_api_server::config::AppConfig;
use finance_api_server::state::AppState;
use finance_api_server::storage::{TimedStore, UserDatabase, UserStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let store: Arc<dyn UserStore> = match UserDatabase::open(&config.db_path()) {
        Ok(db) => Arc::new(TimedStore::new(db)),
        Err(e) => {
            eprintln!("failed to open database at {}: {e}", config.db_path().display());
            std::process::exit(1);
        }
    };

    let sync_gate = match ServiceSecretGate::new(config.sync_secret.clone()) {
        Ok(gate) => gate,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let verifier = if config.dev_mode {
        tracing::warn!("AUTH_DEV_MODE enabled: token signatures are NOT verified");
        TokenVerifier::insecure_dev(config.issuer(), config.audience.clone())
    } else {
        TokenVerifier::new(config.jwks_url(), config.issuer(), config.audience.clone())
    };

    // Warm the JWKS cache so the first request does not pay the fetch.
    if let Some(jwks) = verifier.jwks() {
        if let Err(e) = jwks.refresh().await {
            tracing::warn!(error = %e, "initial JWKS fetch failed, will retry on first request");
        }
    }

    let recorder = AuditRecorder::new(&config.audit);
    let shutdown = CancellationToken::new();
    let audit_worker = spawn_worker(
        recorder.clone(),
        store.clone(),
        config.audit.persistence,
        shutdown.clone(),
    );

    let state = AppState {
        store,
        audit: recorder,
        verifier,
        claims_config: Arc::new(ClaimsConfig {
            permissions_claim: config.permissions_claim(),
            roles_claim: config.roles_claim.clone(),
        }),
        sync_gate,
    };

    let app = api::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }

    // Stop the audit worker and flush whatever is still queued.
    shutdown.cancel();
    if let Err(e) = audit_worker.await {
        tracing::warn!(error = %e, "audit worker did not shut down cleanly");
    }

    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
