use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Router;
use parking_lot::RwLock;
use server::api::api_router;
use server::config::{config_path_from_env, load_or_create_config};
use server::library_from_config;
use server::state::AppState;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let library = library_from_config(&config_path, &config);
    if library.root().is_dir() {
        info!("Serving titles for artists under {:?}", library.root());
    } else {
        warn!(
            "Media root {:?} does not exist; every artist lookup will be not found",
            library.root()
        );
    }

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let shutdown = Arc::new(AtomicBool::new(false));
    let state = AppState {
        config: Arc::new(RwLock::new(config)),
        library,
        shutdown: Arc::clone(&shutdown),
    };

    let app = Router::new()
        .nest("/api/v1", api_router(state))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutting down; running scrapes stop after the current code");
            shutdown.store(true, Ordering::Relaxed);
        })
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for ctrl-c: {}", err);
                }
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }
}
