use serde::Serialize;

use crate::types::Amount;
use crate::types::BalanceRecord;
use crate::types::Level;
use crate::types::Timestamp;

/// Balance history as returned to clients.
#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Balances {
    /// One object per record.
    Rows(Vec<BalanceRecord>),
    /// Index aligned arrays, one per field.
    Compact(CompactBalances),
}

impl Balances {
    pub fn new(records: Vec<BalanceRecord>, compact: bool) -> Self {
        match compact {
            true => Self::Compact(CompactBalances::from(records)),
            false => Self::Rows(records),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Rows(records) => records.len(),
            Self::Compact(c) => c.level.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct CompactBalances {
    pub level: Vec<Level>,
    #[serde(with = "rfc3339_vec")]
    pub timestamp: Vec<Timestamp>,
    pub diff: Vec<Amount>,
    pub value: Vec<Amount>,
}

impl From<Vec<BalanceRecord>> for CompactBalances {
    fn from(records: Vec<BalanceRecord>) -> Self {
        let n = records.len();
        let mut compact = Self {
            level: Vec::with_capacity(n),
            timestamp: Vec::with_capacity(n),
            diff: Vec::with_capacity(n),
            value: Vec::with_capacity(n),
        };
        for r in records {
            compact.level.push(r.level);
            compact.timestamp.push(r.timestamp);
            compact.diff.push(r.diff);
            compact.value.push(r.value);
        }
        compact
    }
}

mod rfc3339_vec {
    use serde::ser::SerializeSeq;
    use serde::Serializer;

    use crate::types::Timestamp;

    struct Rfc3339<'a>(&'a Timestamp);

    impl serde::Serialize for Rfc3339<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            time::serde::rfc3339::serialize(self.0, serializer)
        }
    }

    pub fn serialize<S: Serializer>(values: &[Timestamp], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for ts in values {
            seq.serialize_element(&Rfc3339(ts))?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use time::macros::datetime;

    fn records() -> Vec<BalanceRecord> {
        vec![
            BalanceRecord::new(10, datetime!(2019-01-01 00:00 UTC), 10, 10),
            BalanceRecord::new(12, datetime!(2019-01-01 00:02 UTC), 15, 25),
            BalanceRecord::new(15, datetime!(2019-01-01 00:05 UTC), -10, 15),
        ]
    }

    #[test]
    fn test_rows() {
        let balances = Balances::new(records(), false);
        assert_eq!(
            serde_json::to_value(&balances).unwrap(),
            json!([
                {"level": 10, "timestamp": "2019-01-01T00:00:00Z", "diff": 10, "value": 10},
                {"level": 12, "timestamp": "2019-01-01T00:02:00Z", "diff": 15, "value": 25},
                {"level": 15, "timestamp": "2019-01-01T00:05:00Z", "diff": -10, "value": 15},
            ])
        );
    }

    #[test]
    fn test_compact() {
        let balances = Balances::new(records(), true);
        assert_eq!(
            serde_json::to_value(&balances).unwrap(),
            json!({
                "level": [10, 12, 15],
                "timestamp": [
                    "2019-01-01T00:00:00Z",
                    "2019-01-01T00:02:00Z",
                    "2019-01-01T00:05:00Z"
                ],
                "diff": [10, 15, -10],
                "value": [10, 25, 15],
            })
        );
    }

    #[test]
    fn test_compact_is_aligned_with_rows() {
        let rows = records();
        let compact = CompactBalances::from(rows.clone());
        assert_eq!(compact.level.len(), rows.len());
        for (i, r) in rows.iter().enumerate() {
            assert_eq!(compact.level[i], r.level);
            assert_eq!(compact.timestamp[i], r.timestamp);
            assert_eq!(compact.diff[i], r.diff);
            assert_eq!(compact.value[i], r.value);
        }
    }

    #[test]
    fn test_empty() {
        let balances = Balances::new(vec![], true);
        assert!(balances.is_empty());
        assert_eq!(
            serde_json::to_value(&balances).unwrap(),
            json!({"level": [], "timestamp": [], "diff": [], "value": []})
        );
        assert_eq!(
            serde_json::to_value(Balances::new(vec![], false)).unwrap(),
            json!([])
        );
    }
}
