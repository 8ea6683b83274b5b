use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};
use jobboard_backend::{
    config::{get_config, init_config, StorageBackend},
    database::pool::{create_pool, run_migrations},
    routes,
    services::account_service::SuperuserRequest,
    AppState, Collaborators,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jobboard-backend", about = "Job board API server and admin tasks", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve,
    /// Create an active admin account
    CreateSuperuser(SuperuserArgs),
    /// Delete every account that was never activated
    PurgeInactiveUsers,
}

#[derive(Args, Debug)]
struct SuperuserArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "0000000000")]
    phone_number: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into());
    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_state() -> anyhow::Result<AppState> {
    let config = get_config()?;
    let pool = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database_url).await?;
            run_migrations(&pool).await?;
            Some(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            None
        }
    };
    let parts = Collaborators::from_config(config, pool)?;
    Ok(AppState::new(config, parts))
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let config = get_config()?;
    let _scheduler = state
        .maintenance
        .clone()
        .schedule(&config.maintenance_cron)
        .await?;

    let app = routes::router(state);
    let addr: SocketAddr = config.server_address.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let cli = Cli::parse();
    let state = build_state().await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await?,
        Command::CreateSuperuser(args) => {
            let request = SuperuserRequest::new(&args.email, &args.password, &args.phone_number);
            let user = state.accounts.create_superuser(request).await?;
            info!(user_id = %user.id, email = %user.email, "superuser created");
        }
        Command::PurgeInactiveUsers => {
            let removed = state.maintenance.purge_inactive_users().await?;
            info!(removed, "inactive users purged");
        }
    }
    Ok(())
}
