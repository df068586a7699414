pub mod query;

use async_trait::async_trait;
use deadpool_postgres::Manager;
use deadpool_postgres::ManagerConfig;
use deadpool_postgres::Pool;
use deadpool_postgres::RecyclingMethod;
use futures::TryStreamExt;
use postgres_from_row::FromRow;
use std::time::Duration;
use tokio_postgres::NoTls;

use crate::config::PostgresConfig;
use crate::types::BalanceRecord;
pub use query::BalanceQuery;
pub use query::QueryPlan;
pub use query::DEFAULT_LIMIT;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid postgres configuration")]
    Config(#[source] tokio_postgres::Error),
    #[error("could not create connection pool")]
    Build(#[from] deadpool_postgres::BuildError),
    #[error("could not acquire a database connection")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("balance query failed")]
    Query(#[source] tokio_postgres::Error),
    #[error("could not decode balance record")]
    Decode(#[source] tokio_postgres::Error),
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("storage unavailable")]
    Unavailable,
}

/// Read access to the balance history of the ledger.
#[async_trait]
pub trait BalanceStorage: Send + Sync {
    /// Get balance records matching `query`, ordered by level.
    async fn balance_updates(&self, query: &BalanceQuery)
        -> Result<Vec<BalanceRecord>, StoreError>;
}

/// Postgres backed balance storage.
///
/// Expects `block(hash, level, timestamp)` and
/// `balance(block_hash, contract_address, diff)` relations. Block timestamps
/// may be `timestamptz` or `timestamp`; the latter are read in the session
/// time zone.
///
/// Holds a bounded connection pool shared by all requests. Callers wait
/// for a free connection when all are in use.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a store with a fresh connection pool.
    ///
    /// Connections are opened lazily, on first use.
    pub fn connect(pgconf: &PostgresConfig) -> Result<Self, StoreError> {
        tracing::debug!(
            "creating connection pool (max {} connections)",
            pgconf.max_connections
        );
        let config: tokio_postgres::Config =
            pgconf.connection_uri.parse().map_err(StoreError::Config)?;
        let manager = Manager::from_config(
            config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(pgconf.max_connections)
            .build()?;
        Ok(Self::new(pool))
    }

    /// Run `plan` and decode every row into a balance record.
    ///
    /// Any row failing to decode fails the whole plan.
    pub async fn execute(&self, plan: &QueryPlan) -> Result<Vec<BalanceRecord>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query_raw(plan.sql.as_str(), plan.sql_params())
            .await
            .map_err(StoreError::Query)?;
        futures::pin_mut!(rows);

        let mut records = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(StoreError::Query)? {
            records.push(BalanceRecord::try_from_row(&row).map_err(StoreError::Decode)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl BalanceStorage for PgStore {
    async fn balance_updates(
        &self,
        query: &BalanceQuery,
    ) -> Result<Vec<BalanceRecord>, StoreError> {
        tracing::trace!("balance_updates {query:?}");
        let records = self.execute(&query.plan()).await?;
        tracing::trace!("got {} records for {}", records.len(), query.address);
        Ok(records)
    }
}
