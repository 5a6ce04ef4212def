use crate::{
    config::RuntimeConfiguration,
    data::postgres::PgPersistenceContext,
    error::{GetDatabaseConnectionSnafu, MigrateSnafu, OpenDatabaseSnafu, RollcallResult},
    maud_conveniences::page,
};
use maud::Markup;
use snafu::ResultExt;
use sqlx::{Pool, Postgres, pool::PoolConnection, postgres::PgPoolOptions};

#[derive(Clone, Debug)]
pub struct RollcallState {
    pool: Pool<Postgres>,
    config: RuntimeConfiguration,
}

impl RollcallState {
    pub async fn new(config: RuntimeConfiguration) -> RollcallResult<Self> {
        let db_config = config.db_config();
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections())
            .connect(&db_config.get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        Ok(Self { pool, config })
    }

    #[allow(clippy::unused_self)] //in case self is ever needed :)
    pub fn render(&self, page_title: &str, markup: Markup) -> Markup {
        page(page_title, markup)
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub async fn get_connection(&self) -> RollcallResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)
    }

    pub async fn persistence_context(&self) -> RollcallResult<PgPersistenceContext> {
        let transaction = self.pool.begin().await.context(GetDatabaseConnectionSnafu)?;
        Ok(PgPersistenceContext::new(transaction))
    }

    /// State over a pool that only connects when a query is first made.
    #[cfg(test)]
    pub fn without_database() -> Self {
        let config = RuntimeConfiguration::for_tests();
        let pool = PgPoolOptions::new()
            .max_connections(config.db_config().max_connections())
            .connect_lazy(&config.db_config().get_db_path())
            .unwrap();
        Self { pool, config }
    }

    #[cfg(test)]
    pub fn with_pool(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            config: RuntimeConfiguration::for_tests(),
        }
    }

    pub async fn sensible_shutdown(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}
