pub mod schema;

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use crate::journal::journal_sqlx::SqlxDecisionJournal;

/// Connection pool for the decision journal.
#[derive(Clone)]
pub struct Db {
    pub pool: AnyPool,
}

impl Db {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        schema::migrate(&self.pool).await
    }

    pub fn journal(&self) -> SqlxDecisionJournal {
        SqlxDecisionJournal::new(self.pool.clone())
    }
}
