use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use workshop_common::traits::LedgerStore;
use workshop_core::auth::SessionStore;
use workshop_core::config::parse_timezone;
use workshop_core::http;
use workshop_core::repositories::{MemoryLedgerStore, PostgresLedgerStore};
use workshop_core::utils::time::SystemClock;
use workshop_core::{Database, Error, WorkshopConfig, WorkshopServices};

use crate::Args;

pub async fn run_server(args: Args) -> Result<(), Error> {
    let mut config = WorkshopConfig::from_env()?;
    if let Some(url) = args.db_url.clone() {
        config.database_url = Some(url);
    }
    if let Some(tz) = args.timezone.as_deref() {
        config.timezone = parse_timezone(tz)?;
    }
    if config.admin_password.is_none() {
        warn!("WORKSHOP_ADMIN_PASSWORD is not set; admin login is disabled");
    }

    let addr: SocketAddr = args
        .server_addr
        .parse()
        .map_err(|e| Error::Parse(format!("invalid --server-addr '{}': {}", args.server_addr, e)))?;

    let store = open_store(&args.store, &config).await?;

    let mut services = WorkshopServices::new(store, Arc::new(SystemClock), config);
    if args.session_file {
        let session = SessionStore::default_location()?;
        info!("Mirroring sign-ins to {}", session.path().display());
        services = services.with_session(session);
    }
    let services = Arc::new(services);

    if args.seed {
        services.seed_defaults().await?;
    }

    http::serve(services, addr, shutdown_signal()).await?;
    info!("Workshop API stopped.");
    Ok(())
}

async fn open_store(kind: &str, config: &WorkshopConfig) -> Result<Arc<dyn LedgerStore>, Error> {
    match kind {
        "memory" => {
            warn!("Using the in-memory ledger; nothing survives a restart");
            Ok(Arc::new(MemoryLedgerStore::new()))
        }
        "postgres" => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| Error::Validation("no database URL; pass --db-url or set WORKSHOP_DATABASE_URL".into()))?;
            let db = Database::new(url).await?;
            db.migrate().await?;
            Ok(Arc::new(PostgresLedgerStore::new(db.pool().clone())))
        }
        other => Err(Error::Validation(format!("unknown store '{}'; use postgres or memory", other))),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("ctrl-c handler failed: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
