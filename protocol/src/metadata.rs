//! # Metadata Resolution
//!
//! Credentials carry an opaque `MetadataRef`. The ledger never dereferences
//! it; the amenity access check and UIs do, through a [`MetadataResolver`].
//!
//! Two resolvers ship with the crate:
//!
//! - [`InMemoryResolver`] — content-addressed map, used by tests and demos.
//!   References look like `cas://<blake3-hex>`.
//! - [`DirectoryResolver`] — reads `<root>/<name>.json` for a reference
//!   `<scheme>://<name>`, which is how a node serves pinned IPFS documents
//!   exported to disk.
//!
//! Resolution is async and always runs outside the ledger lock.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::MetadataRef;

/// Scheme used by [`InMemoryResolver::put`].
pub const CONTENT_SCHEME: &str = "cas://";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from resolving a metadata reference.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Nothing is stored under the reference.
    #[error("metadata not found: {0}")]
    NotFound(String),

    /// The reference cannot be mapped to a document location.
    #[error("invalid metadata reference: {0}")]
    InvalidReference(String),

    /// The document exists but is not valid metadata JSON.
    #[error("malformed metadata document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Filesystem failure while reading the document.
    #[error("metadata io error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One `{trait_type, value}` pair from an ERC-721 style metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

/// The subset of an ERC-721 metadata document the ledger tooling reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Vec<MetadataAttribute>,
}

impl MetadataDocument {
    /// Builder-style helper for assembling documents in code.
    pub fn with_attribute(mut self, trait_type: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.push(MetadataAttribute {
            trait_type: trait_type.to_string(),
            value: value.into(),
        });
        self
    }

    /// Value of the first attribute whose `trait_type` matches, ignoring
    /// ASCII case. Strings are returned as-is, other JSON values rendered.
    pub fn attribute(&self, trait_type: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|a| a.trait_type.eq_ignore_ascii_case(trait_type))
            .map(|a| match &a.value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Resolver Trait
// ---------------------------------------------------------------------------

/// Dereferences a [`MetadataRef`] into a document.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<MetadataDocument, MetadataError>;
}

// ---------------------------------------------------------------------------
// In-Memory Resolver
// ---------------------------------------------------------------------------

/// Content-addressed in-memory document store.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    documents: RwLock<HashMap<String, MetadataDocument>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `doc` and returns its content address. Storing the same
    /// document twice yields the same reference.
    pub fn put(&self, doc: MetadataDocument) -> Result<MetadataRef, MetadataError> {
        let bytes = serde_json::to_vec(&doc)?;
        let reference = format!("{}{}", CONTENT_SCHEME, hex::encode(blake3::hash(&bytes).as_bytes()));
        self.documents.write().insert(reference.clone(), doc);
        Ok(reference)
    }

    /// Stores `doc` under a caller-chosen reference.
    pub fn insert(&self, reference: impl Into<String>, doc: MetadataDocument) {
        self.documents.write().insert(reference.into(), doc);
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl MetadataResolver for InMemoryResolver {
    async fn resolve(&self, reference: &str) -> Result<MetadataDocument, MetadataError> {
        self.documents
            .read()
            .get(reference)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(reference.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Directory Resolver
// ---------------------------------------------------------------------------

/// Resolves `<scheme>://<name>` to `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a reference to a file path under the root.
    ///
    /// Only a single path segment of `[A-Za-z0-9._-]` is accepted, so a
    /// reference can never escape the root directory.
    pub fn path_for(&self, reference: &str) -> Result<PathBuf, MetadataError> {
        let name = match reference.split_once("://") {
            Some((_, rest)) => rest,
            None => reference,
        };
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(MetadataError::InvalidReference(reference.to_string()));
        }
        let file = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{name}.json")
        };
        Ok(self.root.join(file))
    }
}

#[async_trait]
impl MetadataResolver for DirectoryResolver {
    async fn resolve(&self, reference: &str) -> Result<MetadataDocument, MetadataError> {
        let path = self.path_for(reference)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MetadataError::NotFound(reference.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(reference, path = %path.display(), "metadata resolved from disk");
        Ok(serde_json::from_slice(&bytes)?)
    }
}
