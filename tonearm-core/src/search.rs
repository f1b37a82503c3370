//! Search criteria and results.
//!
//! A request reduces to one query string: the fuzzy/exact field clauses are
//! OR-joined inside a single parenthesized group, and that group is
//! AND-joined with the raw fragment and the exact identifier clauses. Empty
//! fields never produce a clause.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Release, ReleaseGroup};

/// `field:"value"` with embedded double quotes escaped.
fn query_part(field: &str, value: &str) -> String {
    format!("{}:\"{}\"", field, value.replace('"', "\\\""))
}

fn fuzzy_part(field: &str, value: &str) -> String {
    format!("{}~", query_part(field, value))
}

fn or_group(parts: &[String]) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(format!("({})", parts.join(" OR ")))
    }
}

/// Criteria for a release search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReleaseRequest {
    /// Raw query fragment, AND-combined verbatim.
    pub raw: String,
    pub artist_name: String,
    pub release_name: String,
    pub release_date: String,
    pub format: String,
    pub catalog_number: String,
    /// Track count; ignored unless positive.
    pub tracks: u32,
    /// Exact release id.
    pub reid: String,
    /// Exact release group id.
    pub rgid: String,
}

impl SearchReleaseRequest {
    pub fn query(&self) -> String {
        let mut or_parts = Vec::new();
        if !self.artist_name.is_empty() {
            or_parts.push(fuzzy_part("artistname", &self.artist_name));
        }
        if !self.release_name.is_empty() {
            or_parts.push(fuzzy_part("release", &self.release_name));
        }
        if !self.release_date.is_empty() {
            or_parts.push(query_part("date", &self.release_date));
        }
        if !self.format.is_empty() {
            or_parts.push(query_part("format", &self.format));
        }
        if !self.catalog_number.is_empty() {
            or_parts.push(query_part("catno", &self.catalog_number));
        }
        if self.tracks > 0 {
            or_parts.push(query_part("tracks", &self.tracks.to_string()));
        }

        let mut and_parts = Vec::new();
        and_parts.extend(or_group(&or_parts));
        if !self.raw.is_empty() {
            and_parts.push(self.raw.clone());
        }
        if !self.reid.is_empty() {
            and_parts.push(query_part("reid", &self.reid));
        }
        if !self.rgid.is_empty() {
            and_parts.push(query_part("rgid", &self.rgid));
        }
        and_parts.join(" AND ")
    }
}

/// Criteria for a release group search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReleaseGroupRequest {
    pub raw: String,
    pub artist_name: String,
    pub release_name: String,
    pub first_release_date: String,
    pub rgid: String,
}

impl SearchReleaseGroupRequest {
    pub fn query(&self) -> String {
        let mut or_parts = Vec::new();
        if !self.artist_name.is_empty() {
            or_parts.push(fuzzy_part("artistname", &self.artist_name));
        }
        if !self.release_name.is_empty() {
            or_parts.push(fuzzy_part("release", &self.release_name));
        }
        if !self.first_release_date.is_empty() {
            or_parts.push(query_part("firstreleasedate", &self.first_release_date));
        }

        let mut and_parts = Vec::new();
        if !self.raw.is_empty() {
            and_parts.push(self.raw.clone());
        }
        and_parts.extend(or_group(&or_parts));
        if !self.rgid.is_empty() {
            and_parts.push(query_part("rgid", &self.rgid));
        }
        and_parts.join(" AND ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchReleaseResult {
    pub created: Option<DateTime<Utc>>,
    pub count: i64,
    pub offset: i64,
    pub releases: Vec<Release>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchReleaseGroupResult {
    pub created: Option<DateTime<Utc>>,
    pub count: i64,
    pub offset: i64,
    #[serde(rename = "release-groups")]
    pub release_groups: Vec<ReleaseGroup>,
}
