// 🔎 Query Engine - search, sort and facets over a loaded corpus
//
// Query input comes from low-trust presentation surfaces:
// unknown sort keys and blank filters fall back to defaults, never errors.

use crate::badge::{Badge, Vocabulary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

// ============================================================================
// SORT ORDER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Descending `issued_at`
    #[default]
    Newest,
    /// Ascending vendor name
    Vendor,
    /// Ascending application name
    App,
    /// Descending version, numeric per dot-separated segment
    Version,
}

impl SortOrder {
    /// Lenient parse: anything unrecognized is `Newest`
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("vendor") => SortOrder::Vendor,
            Some("app") => SortOrder::App,
            Some("version") => SortOrder::Version,
            _ => SortOrder::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Vendor => "vendor",
            SortOrder::App => "app",
            SortOrder::Version => "version",
        }
    }
}

// ============================================================================
// SEARCH PARAMS
// ============================================================================

/// Filters are conjunctive. `None`, empty, or whitespace-only means
/// "no filter"; any other value is matched exactly, untrimmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default, rename = "type")]
    pub badge_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: free-text query
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn with_type(mut self, badge_type: impl Into<String>) -> Self {
        self.badge_type = Some(badge_type.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse_lenient(self.sort.as_deref())
    }

    /// True if `badge` passes every provided filter
    pub fn matches(&self, badge: &Badge) -> bool {
        if let Some(query) = active(&self.q).map(|q| q.trim().to_lowercase()) {
            if !badge.haystack().contains(&query) {
                return false;
            }
        }

        exact(&self.vendor, &badge.vendor)
            && exact(&self.app, &badge.application)
            && exact(&self.badge_type, badge.badge_type.as_str())
            && exact(&self.status, badge.status.as_str())
    }
}

/// Whitespace-only counts as unset, same as empty
fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|value| !value.trim().is_empty())
}

fn exact(filter: &Option<String>, value: &str) -> bool {
    match active(filter) {
        Some(expected) => expected == value,
        None => true,
    }
}

/// Matching badges, ordered by the requested sort. Empty when nothing matches.
pub fn search(badges: &[Badge], params: &SearchParams) -> Vec<Badge> {
    let mut results: Vec<Badge> = badges
        .iter()
        .filter(|badge| params.matches(badge))
        .cloned()
        .collect();

    sort_badges(&mut results, params.sort_order());
    results
}

/// Stable sort in place
pub fn sort_badges(badges: &mut [Badge], order: SortOrder) {
    match order {
        SortOrder::Newest => badges.sort_by(|a, b| compare_newest(a.issued_on(), b.issued_on())),
        SortOrder::Vendor => badges.sort_by(|a, b| a.vendor.cmp(&b.vendor)),
        SortOrder::App => badges.sort_by(|a, b| a.application.cmp(&b.application)),
        SortOrder::Version => badges.sort_by(|a, b| compare_versions(&b.version, &a.version)),
    }
}

/// Most recent first; undated records after every dated one
fn compare_newest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending component-wise numeric comparison of dot-separated versions.
///
/// Missing segments count as 0, so `1.2` == `1.2.0`. A segment that is not
/// a number counts as its leading digits (`3rc1` → 3, `beta` → 0).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = version_segments(a);
    let right = version_segments(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

fn version_segments(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|segment| {
            let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

// ============================================================================
// FACETS
// ============================================================================

/// Distinct values present in the corpus, ascending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub vendors: Vec<String>,
    pub apps: Vec<String>,
    pub types: Vec<String>,
    pub statuses: Vec<String>,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
            && self.apps.is_empty()
            && self.types.is_empty()
            && self.statuses.is_empty()
    }
}

/// Only recognized enumeration values become type/status facets;
/// blank values never become facets.
pub fn facets(badges: &[Badge]) -> Facets {
    let mut vendors = BTreeSet::new();
    let mut apps = BTreeSet::new();
    let mut types = BTreeSet::new();
    let mut statuses = BTreeSet::new();

    for badge in badges {
        if !badge.vendor.trim().is_empty() {
            vendors.insert(badge.vendor.clone());
        }
        if !badge.application.trim().is_empty() {
            apps.insert(badge.application.clone());
        }
        if let Some(badge_type) = badge.badge_type.known() {
            types.insert(badge_type.as_str().to_string());
        }
        if let Some(status) = badge.status.known() {
            statuses.insert(status.as_str().to_string());
        }
    }

    Facets {
        vendors: vendors.into_iter().collect(),
        apps: apps.into_iter().collect(),
        types: types.into_iter().collect(),
        statuses: statuses.into_iter().collect(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
