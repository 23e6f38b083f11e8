//! Data model shared by the coordinators and the remote coordination
//! service.
//!
//! Share values are carried as hex strings; only the party indices and roles
//! are interpreted outside of the [`crate::crypto`] providers.

pub mod intent;
pub mod key_share;
pub mod keychain;
pub mod party;
pub mod signing;
pub mod tx_request;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string holding secret material (a hex-encoded scalar or a serialized
/// private share).
///
/// The contents are zeroized on drop and never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Expose the secret. Callers must not log the returned value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("REDACTED")
    }
}

impl From<String> for SecretString {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}
