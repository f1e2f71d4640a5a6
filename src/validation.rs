// ✅ Corpus Validation - every invariant, every badge, every violation
//
// Findings are collected, never thrown: the registry still loads and
// answers queries with violations present. A build gate decides whether
// a non-empty list is fatal.

use crate::badge::{Badge, Enumerated, Vocabulary};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateSlug,
    MissingField,
    InvalidValue,
    MissingRevocationDate,
    InvalidDate,
    InvalidUrl,
}

impl ViolationKind {
    pub fn name(&self) -> &'static str {
        match self {
            ViolationKind::DuplicateSlug => "duplicate_slug",
            ViolationKind::MissingField => "missing_field",
            ViolationKind::InvalidValue => "invalid_value",
            ViolationKind::MissingRevocationDate => "missing_revocation_date",
            ViolationKind::InvalidDate => "invalid_date",
            ViolationKind::InvalidUrl => "invalid_url",
        }
    }
}

/// One invariant violation, with enough context to find and fix the record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub slug: String,
    pub path: String,
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl ValidationError {
    fn new(badge: &Badge, field: &str, kind: ViolationKind, message: String) -> Self {
        ValidationError {
            slug: badge.slug.clone(),
            path: badge.path.clone(),
            field: field.to_string(),
            kind,
            message,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.message)
    }
}

// ============================================================================
// CORPUS CHECKS
// ============================================================================

/// Validate the whole corpus.
///
/// Duplicates: the first badge with a slug is the reference; each later
/// one yields a single error naming its own location and the first one.
pub fn validate_corpus(badges: &[Badge]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut first_seen: HashMap<&str, &str> = HashMap::new();

    for badge in badges {
        match first_seen.get(badge.slug.as_str()) {
            Some(first_path) => errors.push(ValidationError::new(
                badge,
                "slug",
                ViolationKind::DuplicateSlug,
                format!(
                    "Duplicate badge found for {} in {} (first defined in {})",
                    badge.slug, badge.path, first_path
                ),
            )),
            None => {
                first_seen.insert(&badge.slug, &badge.path);
            }
        }

        errors.extend(validate_badge(badge));
    }

    errors
}

/// Per-record invariants (everything except uniqueness)
pub fn validate_badge(badge: &Badge) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let required = [
        ("vendor", badge.vendor.as_str()),
        ("application", badge.application.as_str()),
        ("version", badge.version.as_str()),
        ("issued_at", badge.issued_at.as_str()),
        ("digital_signature", badge.digital_signature.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(missing_field(badge, field));
        }
    }

    if let Some(error) = check_enumerated(badge, "badge_type", &badge.badge_type) {
        errors.push(error);
    }

    if let Some(error) = check_enumerated(badge, "status", &badge.status) {
        errors.push(error);
    }

    if let Some(status) = badge.status.known() {
        let has_revoked_at = badge
            .revoked_at
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty());

        if status.requires_revocation_date() && !has_revoked_at {
            errors.push(ValidationError::new(
                badge,
                "revoked_at",
                ViolationKind::MissingRevocationDate,
                format!("Revoked badge {} must include revoked_at", badge.slug),
            ));
        }
    }

    if !badge.issued_at.trim().is_empty() && badge.issued_on().is_none() {
        errors.push(invalid_date(badge, "issued_at", &badge.issued_at));
    }

    if let Some(revoked_at) = badge.revoked_at.as_deref() {
        if !revoked_at.trim().is_empty() && badge.revoked_on().is_none() {
            errors.push(invalid_date(badge, "revoked_at", revoked_at));
        }
    }

    for url in badge.evidence_urls.iter().flatten() {
        if !is_http_url(url) {
            errors.push(ValidationError::new(
                badge,
                "evidence_urls",
                ViolationKind::InvalidUrl,
                format!(
                    "Invalid evidence URL \"{}\" in {} (expected http or https)",
                    url, badge.slug
                ),
            ));
        }
    }

    errors
}

/// Blank → missing field; unrecognized → invalid value. Never both.
fn check_enumerated<T: Vocabulary>(
    badge: &Badge,
    field: &str,
    value: &Enumerated<T>,
) -> Option<ValidationError> {
    if value.is_blank() {
        return Some(missing_field(badge, field));
    }

    match value {
        Enumerated::Known(_) => None,
        Enumerated::Unknown(raw) => Some(ValidationError::new(
            badge,
            field,
            ViolationKind::InvalidValue,
            format!(
                "Invalid {} \"{}\" in {} (expected one of: {})",
                field,
                raw,
                badge.slug,
                T::ALL
                    .iter()
                    .map(|member| member.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
    }
}

fn missing_field(badge: &Badge, field: &str) -> ValidationError {
    ValidationError::new(
        badge,
        field,
        ViolationKind::MissingField,
        format!("Missing required field \"{}\" in {}", field, badge.slug),
    )
}

fn invalid_date(badge: &Badge, field: &str, value: &str) -> ValidationError {
    ValidationError::new(
        badge,
        field,
        ViolationKind::InvalidDate,
        format!(
            "Invalid {} \"{}\" in {} (expected YYYY-MM-DD or RFC 3339)",
            field, value, badge.slug
        ),
    )
}

fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================
