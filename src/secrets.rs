//! API key sources
//!
//! The key is looked up on every call rather than captured once, so a
//! provider backed by the environment (or a keychain) picks up rotations.

use crate::{Error, Result};

/// Values that ship in sample configs and are never real keys.
const PLACEHOLDER_KEYS: &[&str] = &[
    "your_api_key",
    "your_gemini_api_key",
    "<your-api-key>",
    "changeme",
];

pub trait SecretProvider: Send + Sync {
    fn api_key(&self) -> Result<String>;
}

/// A key fixed at construction time.
pub struct StaticSecret(String);

impl StaticSecret {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl SecretProvider for StaticSecret {
    fn api_key(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads the key from an environment variable at call time.
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSecret {
    fn default() -> Self {
        Self::new("GEMINI_API_KEY")
    }
}

impl SecretProvider for EnvSecret {
    fn api_key(&self) -> Result<String> {
        std::env::var(&self.var).map_err(|_| Error::MissingApiKey(format!("{} not set", self.var)))
    }
}

pub fn is_placeholder(key: &str) -> bool {
    let key = key.trim();
    key.is_empty()
        || PLACEHOLDER_KEYS
            .iter()
            .any(|placeholder| key.eq_ignore_ascii_case(placeholder))
}

/// Fetches a key from `provider`, rejecting empty and placeholder values.
pub fn resolve_api_key(provider: &dyn SecretProvider) -> Result<String> {
    let key = provider.api_key()?;
    if is_placeholder(&key) {
        return Err(Error::MissingApiKey(
            "replace the placeholder API key with a real Gemini key".to_string(),
        ));
    }
    Ok(key.trim().to_string())
}
