//! Constants used by the HTTP resource client.
//!
//! Path segments are kept here so every endpoint is built the same way.

/// Base URL used when no API URL is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound accepted for the per-request timeout.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_USER_AGENT: &str = concat!("vetrec/", env!("CARGO_PKG_VERSION"));

/// Collection of animals (the subjects of procedures and vaccinations).
pub const PETS_SEGMENT: &str = "pets";

pub const PROCEDURES_SEGMENT: &str = "procedures";

pub const VACCINES_SEGMENT: &str = "vaccines";

pub const MEDICAL_DATA_SEGMENT: &str = "medical-data";

pub const CONSENTS_SEGMENT: &str = "consents";

pub const LEGAL_TEXTS_SEGMENT: &str = "legal-texts";
