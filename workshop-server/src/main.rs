use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "workshop")]
#[command(author, version, about = "Learning workshop rewards ledger")]
pub struct Args {
    /// Address the JSON API binds to
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub server_addr: String,

    /// Ledger backend: "postgres" or "memory"
    #[arg(long, default_value = "postgres")]
    pub store: String,

    /// Postgres connection URL. Overrides WORKSHOP_DATABASE_URL.
    #[arg(long)]
    pub db_url: Option<String>,

    /// IANA zone that decides where a "day" starts. Overrides WORKSHOP_TIMEZONE.
    #[arg(long)]
    pub timezone: Option<String>,

    /// Load the starter catalog into empty collections
    #[arg(long, default_value = "false")]
    pub seed: bool,

    /// Mirror sign-ins to the local session file
    #[arg(long, default_value = "false")]
    pub session_file: bool,
}

fn init_tracing() {
    // sqlx still reports through `log`
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("log bridge not installed: {}", e);
    }
    let filter = EnvFilter::from_default_env()
        .add_directive("workshop=info".parse().unwrap_or_default())
        .add_directive("workshop_core=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("tracing subscriber not installed: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    info!("Workshop starting. store={}, addr={}", args.store, args.server_addr);

    if let Err(e) = server::run_server(args).await {
        error!("Server error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}
