//! In-memory storage for tests and local development.
use async_trait::async_trait;

use crate::store::BalanceQuery;
use crate::store::BalanceStorage;
use crate::store::StoreError;
use crate::types::Address;
use crate::types::Amount;
use crate::types::BalanceRecord;
use crate::types::Level;
use crate::types::Timestamp;

/// A single balance change, as stored in the ledger.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub address: Address,
    pub level: Level,
    pub timestamp: Timestamp,
    pub diff: Amount,
}

impl LedgerEntry {
    pub fn new(address: &str, level: Level, timestamp: Timestamp, diff: Amount) -> Self {
        Self {
            address: address.to_owned(),
            level,
            timestamp,
            diff,
        }
    }
}

/// Balance storage backed by a plain list of ledger entries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<LedgerEntry>,
    failing: bool,
}

impl MemoryStore {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self {
            entries,
            failing: false,
        }
    }

    /// A store failing every query.
    pub fn failing() -> Self {
        Self {
            entries: vec![],
            failing: true,
        }
    }

    pub fn select(&self, query: &BalanceQuery) -> Vec<BalanceRecord> {
        let mut entries: Vec<&LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.address == query.address)
            .filter(|e| query.end.map_or(true, |end| e.timestamp < end))
            .collect();
        entries.sort_by_key(|e| e.level);

        let mut value = 0;
        entries
            .into_iter()
            .map(|e| {
                value += e.diff;
                BalanceRecord::new(e.level, e.timestamp, e.diff, value)
            })
            .filter(|r| query.start.map_or(true, |start| r.timestamp >= start))
            .take(query.get_limit() as usize)
            .collect()
    }
}

#[async_trait]
impl BalanceStorage for MemoryStore {
    async fn balance_updates(
        &self,
        query: &BalanceQuery,
    ) -> Result<Vec<BalanceRecord>, StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable);
        }
        Ok(self.select(query))
    }
}
