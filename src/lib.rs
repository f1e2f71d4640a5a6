// OpenAuthCert Badge Registry - Core Library
// Loader → Normalizer → Registry, plus the build gate and query surfaces

pub mod error;
pub mod badge;      // RawBadge, Badge, normalize()
pub mod loader;     // Record store → raw records
pub mod validation; // Corpus invariants
pub mod query;      // Search, sort, facets
pub mod registry;   // Registry snapshot + RegistryHandle
pub mod gate;       // Build gate entry point
pub mod signature;  // External verifier boundary
pub mod config;

// Re-export commonly used types
pub use error::{RegistryError, Result};
pub use badge::{
    normalize, split_slug, make_slug, parse_calendar_date,
    Badge, BadgeStatus, BadgeType, Enumerated, RawBadge, Vocabulary,
    SLUG_SEPARATOR,
};
pub use loader::{load_records, parse_record, LoadedRecord};
pub use validation::{validate_badge, validate_corpus, ValidationError, ViolationKind};
pub use query::{compare_versions, Facets, SearchParams, SortOrder};
pub use registry::{Registry, RegistryHandle};
pub use gate::GateOutcome;
pub use signature::{verify_corpus, SignatureFailure, SignatureVerifier};
pub use config::RegistryConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
