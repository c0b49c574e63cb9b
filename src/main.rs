use std::sync::Arc;

use clap::Parser;
use teatime::accounts::Accounts;
use teatime::config::{Cli, Config, default_config_dir, default_config_path};
use teatime::db::Database;
use teatime::handler::{AppState, router};
use teatime::scripture;
use tokio::{signal, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const SESSION_SWEEP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    let _ = dotenvy::dotenv();

    // With --config, data (the database) lives next to the config file;
    // otherwise both live in ~/.teatime/
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("teatime.svc starting");

    let mut cfg = if config_path.exists() {
        Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
            tracing::error!(error = %e, path = ?config_path, "failed to load config file");
            std::process::exit(1);
        })
    } else {
        tracing::warn!(path = ?config_path, "config file not found, using defaults");
        Config::default()
    };
    if let Some(port) = args.port {
        cfg.app.set_port(port);
    }

    let db = Arc::new(Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }));

    if let Err(e) = scripture::seed_bundled_topics(&db).await {
        tracing::error!(error = %e, "failed to seed topics");
        std::process::exit(1);
    }

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel::<()>(1);

    let sweep_db = db.clone();
    let sweep_token = cancellation_token.clone();
    let sweep_done = shutdown_complete_tx.clone();
    tokio::spawn(async move {
        let _done = sweep_done;
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match Accounts::new(sweep_db.connection()).purge_expired_sessions().await {
                        Ok(0) => {}
                        Ok(purged) => tracing::info!(purged, "purged expired sessions"),
                        Err(e) => tracing::warn!(error = %e, "failed to purge expired sessions"),
                    }
                }
                _ = sweep_token.cancelled() => {
                    tracing::info!("session sweep shutting down");
                    break;
                }
            }
        }
    });

    let app = router(AppState {
        db,
        session: Arc::new(cfg.session.clone()),
    });

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("teatime.svc running on {}", &address);
    let shutdown_token = cancellation_token.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("ctrl+c signal received, preparing to shutdown");
            }
            _ = shutdown_token.cancelled() => {}
        }
        shutdown_token.cancel();
    });

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
        cancellation_token.cancel();
    }

    drop(shutdown_complete_tx);
    shutdown_complete_rx.recv().await;
    tracing::info!("teatime.svc going off, graceful shutdown complete");
}
