use postgres_from_row::FromRow;
use serde::Serialize;
use time::OffsetDateTime;

/// Account identifier (public key hash or contract address).
pub type Address = String;
pub type Level = i64;
pub type Timestamp = OffsetDateTime;
/// Signed balance amount, in the ledger's smallest unit.
pub type Amount = i64;

/// Balance change of an address at some block, along with the running
/// balance after that change.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BalanceRecord {
    pub level: Level,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: Timestamp,
    pub diff: Amount,
    /// Balance after applying `diff`, summed over the full history of the address.
    pub value: Amount,
}

impl BalanceRecord {
    pub fn new(level: Level, timestamp: Timestamp, diff: Amount, value: Amount) -> Self {
        Self {
            level,
            timestamp,
            diff,
            value,
        }
    }
}
