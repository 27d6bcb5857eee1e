//! API key authentication
//!
//! Validates the `api-key` request header against a shared secret
//! loaded from a JSON key file (`{"apiKey": "..."}`). When no key file
//! is configured, authentication is disabled.

use anyhow::Context;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::info;

/// The header carrying the API key
pub const API_KEY_HEADER: &str = "api-key";

/// On-disk shape of the key file
#[derive(Debug, Deserialize)]
struct ApiKeyFile {
    #[serde(rename = "apiKey")]
    api_key: String,
}

// == Api Key Provider ==
/// Holds the configured API key, if any, and validates request headers
/// against it.
#[derive(Debug, Clone)]
pub struct ApiKeyProvider {
    /// The expected key; None disables authentication
    api_key: Option<String>,
}

impl ApiKeyProvider {
    /// Creates a provider that accepts every request.
    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    /// Creates a provider enforcing the given key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }

    /// Loads the key from a JSON file of the form `{"apiKey": "..."}`.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read API key file {}", path))?;
        let parsed: ApiKeyFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse API key file {}", path))?;

        info!("API key loaded from {}", path);
        Ok(Self::with_key(parsed.api_key))
    }

    /// Checks a provided key against the configured one.
    ///
    /// Always true when authentication is disabled; otherwise the key
    /// must be present and match in constant time.
    pub fn is_valid(&self, provided: Option<&str>) -> bool {
        let Some(expected) = &self.api_key else {
            return true;
        };

        match provided {
            Some(provided) => constant_time_compare(provided, expected),
            None => false,
        }
    }
}

/// Compares two keys in constant time.
///
/// The length check short-circuits, which is acceptable: the expected
/// key length is not secret.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() != b_bytes.len() {
        return false;
    }

    a_bytes.ct_eq(b_bytes).into()
}
