//! License authority policy
//!
//! The loader is append-only, so one license can be present several times:
//! from the license extract and the application extract, and again from
//! every rerun. Picking the row to show is a read-time choice made here. It
//! is never applied during ingestion.
//!
//! Meant for read-only lookups over [`Store::licenses_by_call_sign`].
//!
//! [`Store::licenses_by_call_sign`]: crate::store::Store::licenses_by_call_sign

use crate::store::StoredLicense;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use uls_common::UlsError;

/// Date format used by ULS extracts.
pub const ULS_DATE_FORMAT: &str = "%m/%d/%Y";

/// Rule for choosing the authoritative row among duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorityPolicy {
    /// Prefer rows with a status and grant date, then the latest expiration
    #[default]
    MostCompleteLatestExpiration,
    /// Latest expiration date wins
    LatestExpiration,
    /// Earliest inserted row wins
    FirstIngested,
    /// Most recently inserted row wins
    LastIngested,
}

impl AuthorityPolicy {
    pub const ALL: [AuthorityPolicy; 4] = [
        AuthorityPolicy::MostCompleteLatestExpiration,
        AuthorityPolicy::LatestExpiration,
        AuthorityPolicy::FirstIngested,
        AuthorityPolicy::LastIngested,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuthorityPolicy::MostCompleteLatestExpiration => "most-complete-latest-expiration",
            AuthorityPolicy::LatestExpiration => "latest-expiration",
            AuthorityPolicy::FirstIngested => "first-ingested",
            AuthorityPolicy::LastIngested => "last-ingested",
        }
    }
}

impl FromStr for AuthorityPolicy {
    type Err = UlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| UlsError::Config(format!("unknown authority policy '{s}'")))
    }
}

impl std::fmt::Display for AuthorityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a ULS `MM/DD/YYYY` date, `None` if absent or malformed.
pub fn parse_uls_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?.trim(), ULS_DATE_FORMAT).ok()
}

fn expiration(license: &StoredLicense) -> Option<NaiveDate> {
    parse_uls_date(license.row.expired_date.as_deref())
}

/// 2 with status and grant date, 1 with status only, 0 otherwise.
fn completeness(license: &StoredLicense) -> u8 {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    match (present(&license.row.license_status), present(&license.row.grant_date)) {
        (true, true) => 2,
        (true, false) => 1,
        _ => 0,
    }
}

/// `Greater` when `a` is the better row under `policy`.
fn compare(policy: AuthorityPolicy, a: &StoredLicense, b: &StoredLicense) -> Ordering {
    match policy {
        AuthorityPolicy::FirstIngested => b.id.cmp(&a.id),
        AuthorityPolicy::LastIngested => a.id.cmp(&b.id),
        AuthorityPolicy::LatestExpiration => expiration(a)
            .cmp(&expiration(b))
            .then_with(|| a.id.cmp(&b.id)),
        AuthorityPolicy::MostCompleteLatestExpiration => completeness(a)
            .cmp(&completeness(b))
            .then_with(|| expiration(a).cmp(&expiration(b)))
            .then_with(|| a.id.cmp(&b.id)),
    }
}

/// Pick the authoritative row from `rows` under `policy`.
///
/// Remaining ties go to the most recently inserted row. Returns `None` only
/// for an empty slice.
pub fn resolve_license(rows: &[StoredLicense], policy: AuthorityPolicy) -> Option<&StoredLicense> {
    rows.iter().max_by(|a, b| compare(policy, a, b))
}

/// Order `rows` best first under `policy`.
pub fn rank_licenses(rows: &mut [StoredLicense], policy: AuthorityPolicy) {
    rows.sort_by(|a, b| compare(policy, b, a));
}
