use dotenvy::dotenv;
use laptop_store::{
    config::{admin, database, settings},
    errors::Result,
    shell::{self, Shop},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Store settings from ./config.toml, defaults if absent
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Connect and make sure the schema exists
    if std::env::var("DATABASE_URL").is_err() {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Bootstrap the administrator account if configured
    if let Some(credentials) = admin::admin_from_env() {
        admin::ensure_admin(&db, &credentials).await?;
    }

    // 6. Run the shell until quit or end of input
    shell::run(&Shop::new(db, settings)).await
}
