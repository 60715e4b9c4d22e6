use std::error::Error;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use event_api::config::Config;
use event_api::routes::create_routes;
use event_api::state::AppState;

const DEFAULT_LOG_FILTER: &str = "event_api=info,tower_http=info";

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;
            tracing::info!("Successfully connected to database");

            sqlx::migrate!().run(&pool).await?;
            tracing::info!("Migrations run successfully");

            AppState::postgres(pool, &config)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, keeping all data in memory");
            AppState::in_memory(&config)
        }
    };

    state.accounts.seed(&config.seed).await?;

    let app = create_routes(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
