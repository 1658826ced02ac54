use color_eyre::eyre::Result;
use dotenv::dotenv;
use rebook_db::{create_pool, schema::initialize_database};
use rebook_scheduler::Scheduler;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting standalone scheduler process");

    // Load environment variables
    dotenv().ok();

    // Create database connection pool
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| color_eyre::eyre::eyre!("DATABASE_URL environment variable must be set"))?;
    let db_pool = create_pool(&database_url).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Wire and run the scheduler until the process is stopped
    let (scheduler, _diagnostics_writer) = Scheduler::from_env(db_pool)?;
    scheduler.run().await?;

    Ok(())
}
