use autoresponder::{
    bot,
    config::{app, database, templates},
    core::{scheduler::ActivationScheduler, store::ConfigStore},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
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

    // 3. Application configuration
    let app_config = app::load_app_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Database and default settings
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    let store = ConfigStore::new(db);
    if store.ensure_defaults().await? {
        info!("Fresh store, default settings written.");
    }

    // 5. Template seeds
    let seeds = templates::load_config(&app_config.config_path)?;
    let seeded = store.seed_templates(&seeds.templates).await?;
    if seeded > 0 {
        info!("Seeded {} template(s).", seeded);
    }

    // 6. Re-arm scheduled transitions
    let scheduler = Arc::new(ActivationScheduler::new(store.clone()));
    scheduler.restore().await?;

    // 7. Run the bot; the token is read right before use
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, app_config.operator_user_id, store, scheduler).await
}
