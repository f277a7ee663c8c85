use std::sync::Arc;
use std::time::Duration;

use caliope_agent::{Concierge, HttpLlmClient, LlmClient, ServiceGenerator};
use caliope_core::config::{AppConfig, ConfigError, DataSource};
use caliope_core::import::{BulkImporter, ImportError};
use caliope_core::loyalty::TierTable;
use caliope_db::{connect_with_config, migrations, DbPool, DemoDataset, Repositories, RepositoryError};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::AppState;

pub struct Application {
    pub config: AppConfig,
    pub repositories: Repositories,
    /// `None` in demo mode, where nothing touches SQLite.
    pub db_pool: Option<DbPool>,
    pub llm: Option<Arc<dyn LlmClient>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("demo dataset could not be loaded: {0}")]
    Seed(#[source] RepositoryError),
    #[error("AI client setup failed: {0}")]
    Llm(String),
    #[error(transparent)]
    Import(#[from] ImportError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        data_source = ?config.catalog.data_source,
        "starting application bootstrap"
    );

    let (repositories, db_pool) = match config.catalog.data_source {
        DataSource::Demo => {
            let repositories = DemoDataset::in_memory().await.map_err(BootstrapError::Seed)?;
            info!(
                event_name = "system.bootstrap.demo_data_loaded",
                correlation_id = "bootstrap",
                "in-memory demo repositories ready"
            );
            (repositories, None)
        }
        DataSource::Live => {
            let db_pool = connect_with_config(&config.database)
                .await
                .map_err(BootstrapError::DatabaseConnect)?;
            info!(
                event_name = "system.bootstrap.database_connected",
                correlation_id = "bootstrap",
                "database connection established"
            );

            migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
            info!(
                event_name = "system.bootstrap.migrations_applied",
                correlation_id = "bootstrap",
                "database migrations applied"
            );
            (Repositories::sql(db_pool.clone()), Some(db_pool))
        }
    };

    let llm = match HttpLlmClient::from_config(&config.llm) {
        Ok(Some(client)) => {
            info!(
                event_name = "system.bootstrap.llm_ready",
                correlation_id = "bootstrap",
                provider = ?config.llm.provider,
                model = %config.llm.model,
                "AI collaborator configured"
            );
            Some(Arc::new(client) as Arc<dyn LlmClient>)
        }
        Ok(None) => {
            warn!(
                event_name = "system.bootstrap.llm_unavailable",
                correlation_id = "bootstrap",
                provider = ?config.llm.provider,
                "AI collaborator not configured; recommendations use keyword matching"
            );
            None
        }
        Err(error) => return Err(BootstrapError::Llm(error.to_string())),
    };

    Ok(Application { config, repositories, db_pool, llm })
}

impl Application {
    pub fn state(&self) -> Result<AppState, BootstrapError> {
        let ai_timeout = Duration::from_secs(self.config.recommendations.ai_timeout_secs);
        let concierge =
            Concierge::new(self.llm.clone(), self.config.recommendations.max_results, ai_timeout);
        let generator =
            self.llm.clone().map(|client| Arc::new(ServiceGenerator::new(client, ai_timeout)));

        Ok(AppState {
            repositories: self.repositories.clone(),
            concierge: Arc::new(concierge),
            generator,
            importer: BulkImporter::new(self.config.import.chunk_size)?,
            tiers: Arc::new(TierTable::default()),
            default_page_size: self.config.catalog.default_page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use caliope_core::config::{AppConfig, ConfigOverrides, DataSource, LlmProvider, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn options(data_source: DataSource, database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                data_source: Some(data_source),
                llm_provider: Some(LlmProvider::Disabled),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn demo_mode_serves_fixture_catalog_without_a_database() {
        let app = bootstrap(options(DataSource::Demo, "sqlite::memory:"))
            .await
            .expect("demo bootstrap");

        assert!(app.db_pool.is_none());
        assert!(app.llm.is_none());
        assert!(!app.repositories.services.list_all().await.expect("services").is_empty());
    }

    #[tokio::test]
    async fn live_mode_migrates_an_empty_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("caliope.db").display());
        let app = bootstrap(options(DataSource::Live, &url))
            .await
            .expect("live bootstrap");

        let pool = app.db_pool.clone().expect("live mode keeps a pool");
        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('services', 'products', 'users', 'orders')",
        )
        .fetch_one(&pool)
        .await
        .expect("count tables");
        assert_eq!(table_count, 4);
        assert!(app.repositories.services.list_all().await.expect("services").is_empty());

        let state = app.state().expect("state");
        assert_eq!(state.importer.chunk_size(), 400);
        pool.close().await;
    }

    #[tokio::test]
    async fn gemini_without_key_boots_without_ai() {
        let mut options = options(DataSource::Demo, "sqlite::memory:");
        options.overrides.llm_provider = Some(LlmProvider::Gemini);

        let app = bootstrap(options).await.expect("bootstrap");

        assert!(app.llm.is_none());
        assert!(!app.state().expect("state").concierge.has_ai());
    }
}
