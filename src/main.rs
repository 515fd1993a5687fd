//! Ledger connectivity bootstrap (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   APP_ENV, REDIS_URL, IDENTITY_*        ┌──────────────────────────────────────┐
//!   ──────────────────────────────────────▶│ config (file + env, validated)       │
//!                                          └──────────────────┬───────────────────┘
//!                                                             ▼
//!   ┌──────────────────────┐   Option<CacheHandle>   ┌──────────────────────────┐
//!   │ cache::connection    │────────────────────────▶│ environment::resolver    │
//!   │ (PING, heartbeat)    │                         │ local probe → fallback   │
//!   └──────────────────────┘                         └────────────┬─────────────┘
//!                                                                 │ ExecutionTarget
//!                                                                 ▼
//!                                                    ┌──────────────────────────┐
//!                                                    │ identity::loader         │
//!                                                    │ verify / provision       │
//!                                                    └────────────┬─────────────┘
//!                                                                 ▼
//!   GET /health/cache   ┌──────────────────┐          ┌──────────────────────────┐
//!   ───────────────────▶│ admin (axum)     │◀─────────│ Connectivity (immutable) │
//!                       │ cache::probe     │          └──────────────────────────┘
//!                       └──────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

use ledger_bootstrap::admin::setup_admin_router;
use ledger_bootstrap::config::loader::load_effective;
use ledger_bootstrap::config::schema::ObservabilityConfig;
use ledger_bootstrap::environment::DeploymentMode;
use ledger_bootstrap::lifecycle::signals::shutdown_signal;
use ledger_bootstrap::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ledger-bootstrap")]
#[command(about = "Bootstrap ledger connectivity and serve diagnostics", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match load_effective(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if DeploymentMode::from_name(&config.deployment.mode).is_production() {
        config.observability.json_logs = true;
    }
    logging::init_logging(&config.observability);

    tracing::info!("ledger-bootstrap v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let admin = config.admin.clone();
    let connectivity = match ledger_bootstrap::bootstrap(config).await {
        Ok(connectivity) => connectivity,
        Err(e) => {
            tracing::error!(error = %e, "Bootstrap failed, refusing to start");
            return Err(e.into());
        }
    };

    if admin.enabled {
        let listener = TcpListener::bind(&admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Diagnostic endpoints listening");

        let router = setup_admin_router(
            connectivity,
            Duration::from_secs(admin.request_timeout_secs),
        );
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
