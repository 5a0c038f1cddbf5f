// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coffee_shop_server::{
    api::router,
    auth::{AuthError, Authenticator, JwksManager, TokenVerifier},
    config::{Config, LogFormat},
    state::AppState,
    storage::DrinkDatabase,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

fn build_authenticator(config: &Config) -> Result<Authenticator, AuthError> {
    let keys = JwksManager::new(config.jwks_url.as_str(), config.jwks_fetch_timeout)?
        .with_cache_ttl(config.jwks_cache_ttl)
        .with_refresh_cooldown(config.jwks_refresh_cooldown);
    let verifier = TokenVerifier::new(
        config.audience.clone(),
        config.issuer.clone(),
        config.algorithms.clone(),
    )
    .with_leeway(config.jwt_leeway_secs);
    Ok(Authenticator::new(keys, verifier))
}

async fn shutdown_signal(handle: Handle<SocketAddr>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

#[tokio::main]
async fn main() -> ExitCode {
    // Install the ring crypto provider for rustls before any TLS operations
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    let addr = match config.bind_addr() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(error = %err, "Invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let db = match DrinkDatabase::open(&config.database_path) {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(
                path = %config.database_path.display(),
                error = %err,
                "Failed to open drinks database"
            );
            return ExitCode::FAILURE;
        }
    };

    if config.reset_database {
        if let Err(err) = db.reset() {
            tracing::error!(error = %err, "Failed to reset drinks database");
            return ExitCode::FAILURE;
        }
    }

    let auth = match build_authenticator(&config) {
        Ok(auth) => auth,
        Err(err) => {
            tracing::error!(error = %err, "Failed to set up token verification");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        jwks_url = %config.jwks_url,
        issuer = %config.issuer,
        audience = %config.audience,
        "Token verification configured"
    );

    let app = router(AppState::new(db, auth));

    let handle = Handle::<SocketAddr>::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    let served = match &config.tls {
        Some(tls) => {
            let tls_config = match RustlsConfig::from_pem_file(&tls.cert, &tls.key).await {
                Ok(tls_config) => tls_config,
                Err(err) => {
                    tracing::error!(error = %err, "Failed to load TLS certificate");
                    return ExitCode::FAILURE;
                }
            };
            tracing::info!("Coffee shop server listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            tracing::info!("Coffee shop server listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    match served {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            ExitCode::FAILURE
        }
    }
}
