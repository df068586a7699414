//! Query string decoding.
//!
//! Empty values (`?limit=`) leave a field at its default and booleans
//! accept the usual short forms (`1`, `t`, `FALSE`, ...).
use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use std::fmt::Display;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::types::Timestamp;

#[derive(Debug, PartialEq, Deserialize)]
pub(super) struct BalanceParams {
    #[serde(default, deserialize_with = "timestamp")]
    pub start: Option<Timestamp>,
    #[serde(default, deserialize_with = "timestamp")]
    pub end: Option<Timestamp>,
    #[serde(default, deserialize_with = "non_empty")]
    pub limit: Option<i64>,
    #[serde(default = "default_compact", deserialize_with = "flag")]
    pub compact: bool,
}

fn default_compact() -> bool {
    true
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Ok(None);
    }
    OffsetDateTime::parse(&s, &Rfc3339)
        .map(Some)
        .map_err(de::Error::custom)
}

fn non_empty<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Ok(None);
    }
    s.parse().map(Some).map_err(de::Error::custom)
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.as_str() {
        "" => Ok(default_compact()),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(de::Error::custom(format!("invalid boolean {other:?}"))),
    }
}
