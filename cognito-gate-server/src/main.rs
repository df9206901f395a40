use std::sync::Arc;

use cognito_gate_core::{init_tracing, AppConfig};
use cognito_gate_security::{CachePolicy, CognitoGate, JwksCache};
use cognito_gate_server::{router, Settings};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::load("dev")?;
    let settings = Settings::from_config(&config)?;
    let verification = settings.verification_config();

    let cache = Arc::new(JwksCache::new(
        CachePolicy::from_config(&verification),
        verification.fetch_timeout(),
    )?);
    if settings.warm_up {
        let url = verification.jwks_url();
        match cache.refresh_now(&url).await {
            Ok(count) => info!(url = %url, keys = count, "JWKS warmed up"),
            Err(err) => warn!(url = %url, error = %err, "JWKS warm-up failed, keys will be fetched on demand"),
        }
    }

    let issuer = verification.issuer();
    let gate = CognitoGate::with_cache(verification, cache);
    let app = router(&gate);

    let listener = TcpListener::bind(&settings.bind).await?;
    info!(addr = %settings.bind, issuer = %issuer, "Cognito gate server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Cognito gate server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
