//! # Core Types
//!
//! Identifiers and the account address newtype shared by every ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::NULL_ADDRESS;

/// Id of an identity credential.
pub type CredentialId = u64;
/// Id of a fee receipt.
pub type ReceiptId = u64;
/// Id of a course in the catalog.
pub type CourseId = u64;
/// Id of an enrollment or completion credential.
pub type EnrollmentId = u64;
/// Id of a reward token.
pub type TokenId = u64;
/// Handle of an identity ledger instance inside a campus.
pub type LedgerRef = u64;

/// Opaque content-addressed reference to an off-ledger metadata document.
/// The ledger stores it verbatim and never dereferences it.
pub type MetadataRef = String;

/// An account on the campus ledger.
///
/// Addresses are opaque strings. Comparison is exact (no checksum
/// normalization), so callers must present addresses consistently.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps a raw account string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The null account.
    pub fn null() -> Self {
        Self(NULL_ADDRESS.to_string())
    }

    /// True for the null account and for the empty string, which wallets
    /// send when no account is connected.
    pub fn is_null(&self) -> bool {
        self.0.is_empty() || self.0 == NULL_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
