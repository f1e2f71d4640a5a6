// 📂 Loader - Badge record store → (location, RawBadge) pairs
//
// Store layout: <root>/<vendor>/<application>/<version>.json
// One JSON object per file. Read-only.

use crate::badge::RawBadge;
use crate::error::{RegistryError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Vendor directory metadata lives next to badge files but is not a badge
const VENDOR_INDEX_FILE: &str = "vendors.json";

const RECORD_EXTENSION: &str = "json";

/// One stored record and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    /// Location relative to the store root, `/`-separated
    pub path: String,
    pub raw: RawBadge,
}

/// Load every badge record under `root`, sorted by path.
///
/// An empty store yields an empty vector. The first malformed record
/// aborts the whole load.
pub fn load_records(root: &Path) -> Result<Vec<LoadedRecord>> {
    let files = badge_files(root)?;
    info!(root = %root.display(), files = files.len(), "loading badge records");

    let mut records = Vec::with_capacity(files.len());
    for file in files {
        let location = relative_location(root, &file);
        let contents = fs::read_to_string(&file).map_err(|source| RegistryError::Io {
            path: file.clone(),
            source,
        })?;

        let raw = parse_record(&location, &contents)?;
        debug!(path = %location, "loaded badge record");
        records.push(LoadedRecord {
            path: location,
            raw,
        });
    }

    Ok(records)
}

/// Parse one record file's contents.
///
/// The contents must be a JSON object whose known keys have the right
/// JSON types (`null` counts as absent); anything else is `MalformedRecord`.
/// The parsed object is kept on the record for signature checks.
pub fn parse_record(location: &str, contents: &str) -> Result<RawBadge> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| RegistryError::malformed(location, format!("invalid JSON: {}", e)))?;

    let Value::Object(authored) = value else {
        return Err(RegistryError::malformed(
            location,
            "expected a JSON object at the top level",
        ));
    };

    let mut raw: RawBadge = serde_json::from_value(Value::Object(authored.clone()))
        .map_err(|e| RegistryError::malformed(location, e))?;
    raw.authored = Some(authored);
    Ok(raw)
}

/// Candidate badge files under `root`, sorted
fn badge_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
            RegistryError::Io { path, source }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_badge_file(path) {
            debug!(path = %path.display(), "skipping non-badge file");
            continue;
        }

        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}

fn is_badge_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext == RECORD_EXTENSION);
    let is_vendor_index = path
        .file_name()
        .is_some_and(|name| name == VENDOR_INDEX_FILE);

    has_extension && !is_vendor_index
}

fn relative_location(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{normalize, BadgeStatus};
    use crate::validation::{validate_corpus, ViolationKind};
    use serde_json::json;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn badge_json(vendor: &str, app: &str, version: &str) -> String {
        json!({
            "vendor": vendor,
            "application": app,
            "version": version,
            "badge_type": "free-saml-support",
            "status": "certified",
            "issued_at": "2024-01-15",
            "digital_signature": "sig"
        })
        .to_string()
    }

    #[test]
    fn test_load_empty_store() {
        let dir = tempfile::tempdir().unwrap();

        let records = load_records(dir.path()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_nested_records_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "zeta/app/1.0.0.json", &badge_json("zeta", "app", "1.0.0"));
        write(dir.path(), "acme/portal/2.0.0.json", &badge_json("acme", "portal", "2.0.0"));

        let records = load_records(dir.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "acme/portal/2.0.0.json");
        assert_eq!(records[1].path, "zeta/app/1.0.0.json");
        assert_eq!(records[0].raw.status.known(), Some(BadgeStatus::Certified));
    }

    #[test]
    fn test_load_skips_vendor_index_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "vendors.json", "[\"acme\"]");
        write(dir.path(), "acme/vendors.json", "not even json");
        write(dir.path(), "README.md", "# Registry");
        write(dir.path(), "acme/portal/1.0.0.json", &badge_json("acme", "portal", "1.0.0"));

        let records = load_records(dir.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw.vendor, "acme");
    }

    #[test]
    fn test_load_malformed_json_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "acme/portal/1.0.0.json", &badge_json("acme", "portal", "1.0.0"));
        write(dir.path(), "broken/app/1.0.0.json", "{ \"vendor\": ");

        let err = load_records(dir.path()).unwrap_err();

        assert!(err.is_malformed());
        match err {
            RegistryError::MalformedRecord { path, .. } => {
                assert_eq!(path, "broken/app/1.0.0.json");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_record_rejects_non_object() {
        let err = parse_record("list.json", "[1, 2, 3]").unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("list.json"));
    }

    #[test]
    fn test_parse_record_rejects_wrong_field_type() {
        let err = parse_record("x.json", r#"{"vendor": "acme", "evidence_urls": "https://a"}"#)
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_null_vendor_loads_as_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut record: Value = serde_json::from_str(&badge_json("acme", "portal", "1.0.0")).unwrap();
        record["vendor"] = Value::Null;
        write(dir.path(), "acme/portal/1.0.0.json", &record.to_string());

        let records = load_records(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].raw.vendor.is_empty());

        let badges: Vec<_> = records
            .into_iter()
            .map(|record| normalize(record.raw, record.path))
            .collect();
        let errors = validate_corpus(&badges);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ViolationKind::MissingField);
        assert_eq!(errors[0].field, "vendor");
    }

    #[test]
    fn test_signed_content_uses_record_as_written() {
        let contents = r#"{
            "vendor": "Acme",
            "application": "Portal",
            "version": "1.0.0",
            "badge_type": "free-sso-idp",
            "status": "certified",
            "issued_at": "2024-01-01",
            "revoked_at": null,
            "evidence_urls": null,
            "notes": null,
            "digital_signature": "c2ln"
        }"#;

        let raw = parse_record("Acme/Portal/1.0.0.json", contents).unwrap();
        let badge = normalize(raw, "Acme/Portal/1.0.0.json");
        let content = String::from_utf8(badge.signed_content().unwrap()).unwrap();

        let mut expected: serde_json::Map<String, Value> = serde_json::from_str(contents).unwrap();
        expected.remove("digital_signature");
        assert_eq!(content, serde_json::to_string(&expected).unwrap());
        assert!(content.contains("\"notes\":null"));
        assert!(!content.contains("digital_signature"));
    }

    #[test]
    fn test_load_missing_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = load_records(&missing).unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }
}
