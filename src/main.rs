use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use churn_predictor::{
    config::{self, Settings},
    create_router, AppState, ScoringAdapter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var(config::ENV_NAME_VAR).ok();
    let settings = match config::load_settings("config", env.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            // Tracing not initialized yet
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!(
        "Starting {} v{}",
        churn_predictor::http::SERVICE_NAME,
        churn_predictor::http::API_VERSION
    );

    let models = ScoringAdapter::load(&settings.models.churn_path, &settings.models.clv_path);
    if models.is_ready() {
        tracing::info!("models loaded successfully");
    } else {
        tracing::warn!(
            churn_loaded = models.churn_loaded(),
            clv_loaded = models.clv_loaded(),
            "starting degraded; scoring endpoints will return 503"
        );
    }

    let app = create_router(AppState::new(models), &settings.server.cors_origins);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("churn_predictor={},tower_http=info", settings.logging.level).into()
    });

    let fmt_layer = if settings.logging.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
