use bytes::BytesMut;
use postgres_types::IsNull;
use postgres_types::ToSql;
use postgres_types::Type;
use std::error::Error;

use crate::types::Address;
use crate::types::Timestamp;

/// Number of records returned when no (or a non-positive) limit is given.
pub const DEFAULT_LIMIT: i64 = 1000;

/// Balance history request for a single address.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceQuery {
    pub address: Address,
    /// Inclusive lower timestamp bound of returned records.
    pub start: Option<Timestamp>,
    /// Exclusive upper timestamp bound of returned *and* summed records.
    pub end: Option<Timestamp>,
    limit: i64,
}

impl BalanceQuery {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_owned(),
            start: None,
            end: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn start(mut self, start: Option<Timestamp>) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: Option<Timestamp>) -> Self {
        self.end = end;
        self
    }

    /// Set max number of records. Non-positive values fall back to `DEFAULT_LIMIT`.
    pub fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = match limit {
            Some(n) if n > 0 => n,
            _ => DEFAULT_LIMIT,
        };
        self
    }

    pub fn get_limit(&self) -> i64 {
        self.limit
    }

    /// Render the query text and its positional parameters.
    ///
    /// The running balance is a window over the whole history of the address
    /// up to `end`. The `start` bound is applied on the output of that window,
    /// never inside it, or earlier diffs would be left out of the sum.
    ///
    /// Block timestamps are read as `timestamptz`. A `timestamp` column is
    /// converted using the session time zone.
    pub fn plan(&self) -> QueryPlan {
        let mut params = Params::default();

        let mut predicates = vec![format!(
            "b.contract_address = {}",
            params.bind(Param::Text(self.address.clone()))
        )];
        if let Some(end) = self.end {
            predicates.push(format!("k.timestamp::timestamptz < {}", params.bind(Param::Timestamp(end))));
        }

        let mut sql = format!(
            "select k.level::bigint as level
                , k.timestamp::timestamptz as timestamp
                , b.diff::bigint as diff
                , (sum(b.diff) over (order by k.level))::bigint as value
            from balance b
            join block k on k.hash = b.block_hash
            where {}
            order by k.level",
            predicates.join(" and ")
        );

        if let Some(start) = self.start {
            sql = format!(
                "select * from ({sql}) as bal where timestamp >= {} order by level",
                params.bind(Param::Timestamp(start))
            );
        }

        sql = format!("{sql} limit {}", params.bind(Param::Int(self.limit)));

        QueryPlan {
            sql,
            params: params.0,
        }
    }
}

/// Query text along with parameters to bind, in placeholder order.
#[derive(Debug)]
pub struct QueryPlan {
    pub sql: String,
    pub params: Vec<Param>,
}

impl QueryPlan {
    pub fn sql_params(&self) -> impl ExactSizeIterator<Item = &(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync))
    }
}

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Timestamp(Timestamp),
    Int(i64),
}

#[derive(Default)]
struct Params(Vec<Param>);

impl Params {
    /// Append a parameter and return its placeholder.
    fn bind(&mut self, param: Param) -> String {
        self.0.push(param);
        format!("${}", self.0.len())
    }
}

impl ToSql for Param {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Param::Text(v) => v.to_sql(ty, out),
            Param::Timestamp(v) => v.to_sql(ty, out),
            Param::Int(v) => v.to_sql(ty, out),
        }
    }

    // Type checks are delegated to the wrapped value, see `to_sql_checked`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Param::Text(v) => v.to_sql_checked(ty, out),
            Param::Timestamp(v) => v.to_sql_checked(ty, out),
            Param::Int(v) => v.to_sql_checked(ty, out),
        }
    }
}
