//! `motorlogd` — the Motorlog server binary.
//!
//! Usage:
//!   motorlogd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/motorlog/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod auth_middleware;
mod config;
mod rate_limit;
mod routes;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use motorlog_core::Module;
use tracing::info;

use config::ServerConfig;
use rate_limit::RateLimiter;

/// Motorlog server.
#[derive(Parser, Debug)]
#[command(name = "motorlogd", about = "Motorlog server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides default 0.0.0.0:8080).
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    config::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let sql: Arc<dyn motorlog_sql::SQLStore> = Arc::new(
        motorlog_sql::SqliteStore::open(&data_dir.join("motorlog.db"))
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    // ── Initialize modules ──

    let auth_config = auth::service::AuthConfig {
        jwt_secret: server_config.jwt.secret.clone(),
        access_ttl_secs: server_config.jwt.access_ttl_secs,
        refresh_ttl_secs: server_config.jwt.refresh_ttl_secs,
    };
    let auth_module = auth::AuthModule::new(Arc::clone(&sql), auth_config)?;
    info!("Auth module initialized");

    let mut advisor_config = workshop::service::ai::AdvisorConfig {
        api_key: server_config.ai.api_key.clone(),
        ..Default::default()
    };
    if let Some(base_url) = &server_config.ai.base_url {
        advisor_config.base_url = base_url.clone();
    }
    if let Some(model) = &server_config.ai.model {
        advisor_config.model = model.clone();
    }
    if let Some(timeout) = server_config.ai.timeout_secs {
        advisor_config.timeout_secs = timeout;
    }
    let workshop_module = workshop::WorkshopModule::new(Arc::clone(&sql), advisor_config)?;
    info!(
        advisor = if server_config.ai.api_key.is_empty() { "local" } else { "openrouter" },
        "Workshop module initialized"
    );

    // First-start demo data.
    if server_config.seed.enabled {
        seed::run(
            auth_module.service(),
            workshop_module.service(),
            &server_config.seed,
        )?;
    }

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (workshop_module.name(), workshop_module.routes()),
    ];

    // Best-effort per-instance rate limiting.
    let limiter = if server_config.rate_limit.enabled {
        let limiter = RateLimiter::new(
            server_config.rate_limit.max_requests,
            Duration::from_secs(server_config.rate_limit.window_secs),
        );
        limiter.start_sweeper();
        Some(limiter)
    } else {
        None
    };

    // Build router.
    let auth_service = Arc::clone(auth_module.service());
    let app = routes::build_router(auth_service, module_routes, limiter);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Motorlog server listening on {}", cli.listen);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
