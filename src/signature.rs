// 🔏 Signature boundary
//
// The registry never checks signature content. This module only hands an
// external verifier the canonical bytes and the opaque signature, then
// collects what it rejects.

use crate::registry::Registry;
use serde::Serialize;

/// An external check of (content, signature) against a published key
pub trait SignatureVerifier {
    fn verify(&self, content: &[u8], signature: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureFailure {
    pub slug: String,
    pub path: String,
    pub reason: String,
}

/// Run `verifier` over every badge in the snapshot
pub fn verify_corpus(registry: &Registry, verifier: &dyn SignatureVerifier) -> Vec<SignatureFailure> {
    let mut failures = Vec::new();

    for badge in registry.badges() {
        let reason = match badge.signed_content() {
            Ok(content) if verifier.verify(&content, &badge.digital_signature) => continue,
            Ok(_) => "signature rejected by verifier".to_string(),
            Err(e) => format!("could not build signed content: {}", e),
        };

        failures.push(SignatureFailure {
            slug: badge.slug.clone(),
            path: badge.path.clone(),
            reason,
        });
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{normalize, RawBadge};
    use serde_json::json;

    /// Accepts a signature equal to the content length, as text
    struct LengthVerifier;

    impl SignatureVerifier for LengthVerifier {
        fn verify(&self, content: &[u8], signature: &str) -> bool {
            signature == content.len().to_string()
        }
    }

    fn badge(vendor: &str) -> crate::badge::Badge {
        let raw: RawBadge = serde_json::from_value(json!({
            "vendor": vendor,
            "application": "Portal",
            "version": "1.0.0",
            "badge_type": "free-sso-idp",
            "status": "certified",
            "issued_at": "2024-01-01"
        }))
        .unwrap();
        normalize(raw, format!("{}.json", vendor))
    }

    #[test]
    fn test_verify_corpus_reports_rejections_only() {
        let mut good = badge("Good");
        good.digital_signature = good.signed_content().unwrap().len().to_string();
        let mut bad = badge("Bad");
        bad.digital_signature = "0".to_string();

        let registry = Registry::from_badges(vec![good, bad]);
        let failures = verify_corpus(&registry, &LengthVerifier);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].slug, "Bad/Portal/1.0.0");
    }
}
