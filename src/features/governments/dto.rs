use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::query::QueryOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernmentDto {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub uid: String,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub term_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub term_end: Option<DateTime<Utc>>,
}

/// Query string accepted by the government routes, e.g.
/// `?lean=true&select=uid,name&populate=author`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQueryDto {
    #[serde(default)]
    pub lean: Option<bool>,
    #[serde(default)]
    pub select: Option<String>,
    #[serde(default)]
    pub populate: Option<String>,
}

impl LookupQueryDto {
    pub fn into_options(self) -> QueryOptions {
        QueryOptions::new()
            .lean(self.lean.unwrap_or(false))
            .select(split_fields(self.select.as_deref()))
            .populate(split_fields(self.populate.as_deref()))
    }
}

fn split_fields(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}
