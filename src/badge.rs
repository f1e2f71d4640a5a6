// 🏷️ Badge Entity - Raw record + canonical normalized form
//
// "The slug is IDENTITY, everything else is a VALUE asserted about it"
//
// - RawBadge: exactly what the author wrote in the record file
// - Badge: RawBadge + derived slug/path/revoked (never authored)
// - normalize(): the one canonical RawBadge → Badge conversion

use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Separator between vendor, application and version in a slug
pub const SLUG_SEPARATOR: char = '/';

// ============================================================================
// CLOSED VOCABULARIES
// ============================================================================

/// A closed set of string values with a fixed wire spelling.
pub trait Vocabulary: Sized + Copy + 'static {
    /// Every member, in declaration order
    const ALL: &'static [Self];

    /// Wire spelling as it appears in record files
    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|member| member.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BadgeType {
    /// Product ships a free single sign-on identity provider
    FreeSsoIdp,
    FreeLdapSupport,
    FreeOidcSupport,
    FreeSamlSupport,
    /// Product can federate with several identity providers at once
    MultiIdpReady,
}

impl Vocabulary for BadgeType {
    const ALL: &'static [Self] = &[
        BadgeType::FreeSsoIdp,
        BadgeType::FreeLdapSupport,
        BadgeType::FreeOidcSupport,
        BadgeType::FreeSamlSupport,
        BadgeType::MultiIdpReady,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            BadgeType::FreeSsoIdp => "free-sso-idp",
            BadgeType::FreeLdapSupport => "free-ldap-support",
            BadgeType::FreeOidcSupport => "free-oidc-support",
            BadgeType::FreeSamlSupport => "free-saml-support",
            BadgeType::MultiIdpReady => "multi-idp-ready",
        }
    }
}

impl BadgeType {
    /// Human-readable name for listings
    pub fn label(&self) -> &'static str {
        match self {
            BadgeType::FreeSsoIdp => "Free SSO IdP",
            BadgeType::FreeLdapSupport => "Free LDAP Support",
            BadgeType::FreeOidcSupport => "Free OIDC Support",
            BadgeType::FreeSamlSupport => "Free SAML Support",
            BadgeType::MultiIdpReady => "Multi-IdP Ready",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BadgeStatus {
    Certified,
    Pending,
    Revoked,
    Denied,
}

impl Vocabulary for BadgeStatus {
    const ALL: &'static [Self] = &[
        BadgeStatus::Certified,
        BadgeStatus::Pending,
        BadgeStatus::Revoked,
        BadgeStatus::Denied,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            BadgeStatus::Certified => "certified",
            BadgeStatus::Pending => "pending",
            BadgeStatus::Revoked => "revoked",
            BadgeStatus::Denied => "denied",
        }
    }
}

impl BadgeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BadgeStatus::Certified => "Certified",
            BadgeStatus::Pending => "Pending review",
            BadgeStatus::Revoked => "Revoked",
            BadgeStatus::Denied => "Denied",
        }
    }

    /// Whether this status requires a `revoked_at` timestamp
    pub fn requires_revocation_date(&self) -> bool {
        match self {
            BadgeStatus::Revoked => true,
            BadgeStatus::Certified | BadgeStatus::Pending | BadgeStatus::Denied => false,
        }
    }
}

/// An authored enumeration value: either a recognized member or the raw text.
///
/// Unrecognized values are kept (not rejected at parse time) so that
/// validation can report them with the record's slug and location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Enumerated<T> {
    Known(T),
    Unknown(String),
}

impl<T: Vocabulary> Enumerated<T> {
    pub fn from_raw(value: &str) -> Self {
        match T::parse(value) {
            Some(member) => Enumerated::Known(member),
            None => Enumerated::Unknown(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Enumerated::Known(member) => member.as_str(),
            Enumerated::Unknown(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<T> {
        match self {
            Enumerated::Known(member) => Some(*member),
            Enumerated::Unknown(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl<T> Default for Enumerated<T> {
    fn default() -> Self {
        Enumerated::Unknown(String::new())
    }
}

impl<T> From<T> for Enumerated<T> {
    fn from(member: T) -> Self {
        Enumerated::Known(member)
    }
}

impl<T: Vocabulary> fmt::Display for Enumerated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T: Vocabulary> Serialize for Enumerated<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, T: Vocabulary> Deserialize<'de> for Enumerated<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Enumerated::from_raw(&raw))
    }
}

// ============================================================================
// RAW BADGE (as authored)
// ============================================================================

/// One badge record exactly as stored.
///
/// Required fields read as blank when the key is absent or `null`, so that
/// a missing field is a validation finding, not a parse failure. A key with
/// the wrong JSON type still fails to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBadge {
    #[serde(default, deserialize_with = "null_as_blank")]
    pub vendor: String,

    #[serde(default, deserialize_with = "null_as_blank")]
    pub application: String,

    #[serde(default, deserialize_with = "null_as_blank")]
    pub version: String,

    #[serde(default, deserialize_with = "null_as_blank")]
    pub badge_type: Enumerated<BadgeType>,

    #[serde(default, deserialize_with = "null_as_blank")]
    pub status: Enumerated<BadgeStatus>,

    #[serde(default, deserialize_with = "null_as_blank")]
    pub issued_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_urls: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "null_as_blank")]
    pub digital_signature: String,

    /// Keys this version does not know about. Ignored by validation and
    /// queries, but part of the signed content.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,

    /// The top-level object exactly as read from the store, nulls included.
    /// Set by the loader; `None` for records built in memory.
    #[serde(skip)]
    pub authored: Option<Map<String, Value>>,
}

fn null_as_blank<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// BADGE (canonical)
// ============================================================================

/// Canonical badge: authored fields plus derived identity.
///
/// Built only by [`normalize`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub vendor: String,
    pub application: String,
    pub version: String,
    pub badge_type: Enumerated<BadgeType>,
    pub status: Enumerated<BadgeStatus>,
    pub issued_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub digital_signature: String,

    #[serde(skip)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    pub authored: Option<Map<String, Value>>,

    // Derived
    pub slug: String,
    pub path: String,
    pub revoked: bool,
}

/// Build the canonical badge for one loaded record. Pure; does not validate.
pub fn normalize(raw: RawBadge, path: impl Into<String>) -> Badge {
    let slug = make_slug(&raw.vendor, &raw.application, &raw.version);
    let revoked = matches!(raw.status, Enumerated::Known(BadgeStatus::Revoked));

    Badge {
        vendor: raw.vendor,
        application: raw.application,
        version: raw.version,
        badge_type: raw.badge_type,
        status: raw.status,
        issued_at: raw.issued_at,
        revoked_at: raw.revoked_at,
        evidence_urls: raw.evidence_urls,
        notes: raw.notes,
        digital_signature: raw.digital_signature,
        extra: raw.extra,
        authored: raw.authored,
        slug,
        path: path.into(),
        revoked,
    }
}

pub fn make_slug(vendor: &str, application: &str, version: &str) -> String {
    format!(
        "{vendor}{sep}{application}{sep}{version}",
        sep = SLUG_SEPARATOR
    )
}

/// Split a slug back into (vendor, application, version).
///
/// Returns `None` unless the slug has exactly three parts.
pub fn split_slug(slug: &str) -> Option<(&str, &str, &str)> {
    let mut parts = slug.split(SLUG_SEPARATOR);
    let vendor = parts.next()?;
    let application = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((vendor, application, version))
}

impl Badge {
    pub fn issued_on(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.issued_at)
    }

    pub fn revoked_on(&self) -> Option<NaiveDate> {
        self.revoked_at.as_deref().and_then(parse_calendar_date)
    }

    /// Lowercased text searched by free-text queries
    pub fn haystack(&self) -> String {
        let mut fields = vec![
            self.vendor.as_str(),
            self.application.as_str(),
            self.version.as_str(),
            self.badge_type.as_str(),
            self.status.as_str(),
        ];
        if let Some(notes) = &self.notes {
            fields.push(notes);
        }
        fields.join(" ").to_lowercase()
    }

    /// Authored record without the derived fields
    pub fn to_raw(&self) -> RawBadge {
        RawBadge {
            vendor: self.vendor.clone(),
            application: self.application.clone(),
            version: self.version.clone(),
            badge_type: self.badge_type.clone(),
            status: self.status.clone(),
            issued_at: self.issued_at.clone(),
            revoked_at: self.revoked_at.clone(),
            evidence_urls: self.evidence_urls.clone(),
            notes: self.notes.clone(),
            digital_signature: self.digital_signature.clone(),
            extra: self.extra.clone(),
            authored: self.authored.clone(),
        }
    }

    /// Canonical bytes an external verifier checks `digital_signature` against:
    /// compact JSON, keys sorted, signature field removed.
    ///
    /// Loaded records sign exactly the authored keys (explicit `null`s kept);
    /// in-memory records fall back to their typed fields.
    pub fn signed_content(&self) -> Result<Vec<u8>> {
        let mut map = match &self.authored {
            Some(authored) => authored.clone(),
            None => match serde_json::to_value(self.to_raw())? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        };
        map.remove("digital_signature");
        Ok(serde_json::to_vec(&map)?)
    }
}

// ============================================================================
// DATE HELPERS
// ============================================================================

/// Parse a record date: `YYYY-MM-DD`, RFC 3339, or a naive ISO timestamp.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.date())
}

// ============================================================================
// TESTS
// ============================================================================
