use std::{net::SocketAddr, sync::Arc};

use backend::{create_router, database::Database, database::RouteRepository, store::MemoryStore};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Saved walking routes API")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3500)]
    port: u16,

    /// PostgreSQL connection URL; routes are kept in memory when unset
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    match args.database_url.as_deref() {
        Some(url) => {
            let db = Database::connect(url).await?;
            db.migrate().await?;
            serve(db, addr).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, saved routes will not survive a restart");
            serve(MemoryStore::default(), addr).await
        }
    }
}

async fn serve<R: RouteRepository>(
    repo: R,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(Arc::new(repo));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("starting backend on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
