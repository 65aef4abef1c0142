//! Secure credential handling for generation providers.
//!
//! API keys are wrapped in [`ApiCredential`] immediately on load so they
//! cannot leak through `Debug` output or error messages. Exposure is always
//! explicit via [`ApiCredential::expose`] at the point of use.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::GeneratorError;

/// A securely-stored API credential.
///
/// - `Debug` shows `[REDACTED]` instead of the value
/// - the underlying memory is zeroed on drop via the `secrecy` crate
/// - the value is only readable through an explicit `.expose()` call
pub struct ApiCredential {
    value: SecretString,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value.
    ///
    /// `name` is a human-readable label used in error messages, never the
    /// value itself.
    pub fn new(value: impl Into<String>, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            name,
        }
    }

    /// Load a credential from an environment variable.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, GeneratorError> {
        std::env::var(env_var)
            .map(|value| Self::new(value, name))
            .map_err(|_| {
                GeneratorError::NotConfigured(format!(
                    "{name} not set: configure the '{env_var}' environment variable"
                ))
            })
    }

    /// Expose the credential value. Call this only at the point of use,
    /// typically when building an HTTP header.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// True when the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// The human-readable label of this credential.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
