use liwa_agent::{ChatOrchestrator, CompletionError, MistralClient};
use liwa_core::config::{AppConfig, ConfigError, LoadOptions};
use liwa_db::repositories::SqlReservationStore;
use liwa_db::{connect_from_config, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub orchestrator: ChatOrchestrator<SqlReservationStore, MistralClient>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("completion client setup failed: {0}")]
    Completion(#[from] CompletionError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "bootstrap_start", "starting application bootstrap");
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "migrations_applied", "database migrations applied");

    let api_key =
        config.completion.api_key.clone().ok_or(CompletionError::MissingApiKey)?;
    let client = MistralClient::new(
        config.completion.base_url.clone(),
        config.completion.model.clone(),
        api_key,
        config.completion.timeout_secs,
    )?;

    let store = SqlReservationStore::new(db_pool.clone());
    let orchestrator = ChatOrchestrator::new(store, client, config.chat.history_window);

    Ok(Application { config, db_pool, orchestrator })
}
