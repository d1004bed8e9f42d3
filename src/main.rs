use grant_portal::{
    Dal, FormManager, Result,
    config::{database, forms as form_access},
    forms::redirect_path,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the form access map
    let access = form_access::load_default_config()
        .inspect_err(|e| error!("Failed to load form access map: {}", e))?;
    info!("Loaded access entries for {} forms.", access.forms.len());

    // 4. Connect and make sure every table exists
    let dal = Dal::connect(&database::get_database_url())
        .await
        .inspect_err(|e| error!("Failed to connect to the store: {}", e))?;
    database::create_tables(dal.connection())
        .await
        .inspect(|_| info!("Store initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Report what each form unlocks
    let manager = FormManager::new(dal, access);
    for (form_id, entry) in &manager.access_map().forms {
        let grant = entry.grant();
        info!(
            "{} grants {}/{} ({} prerequisites), lands on {}",
            form_id,
            grant.product_id,
            grant.feature_id,
            entry.requires.len(),
            redirect_path(&grant.feature_id)
        );
    }

    Ok(())
}
