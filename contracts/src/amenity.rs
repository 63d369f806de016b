//! # Amenity Access
//!
//! Decides whether a holder may use a campus amenity (library, gym, ...)
//! based on the metadata of their active fee receipt. The receipt document
//! lists one attribute per amenity; a value of `"0"` means that amenity was
//! not paid for.
//!
//! The check is split in two so that no I/O happens under the ledger lock:
//! [`Campus::amenity_eligibility`](crate::campus::Campus::amenity_eligibility)
//! runs against a read snapshot, then [`check_amenity_access`] resolves the
//! receipt metadata with the lock released.

use serde::{Deserialize, Serialize};

use campus_protocol::error::{LedgerError, LedgerResult};
use campus_protocol::metadata::MetadataResolver;

use crate::campus::AmenityEligibility;

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NoIdentity,
    NoActiveFeeReceipt,
    FeeNotPaid,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NoIdentity => "no identity",
            DenialReason::NoActiveFeeReceipt => "no active fee receipt",
            DenialReason::FeeNotPaid => "fee not paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub amenity: String,
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
    /// The attribute value recorded on the receipt, when granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<String>,
}

impl AccessDecision {
    fn denied(amenity: &str, reason: DenialReason) -> Self {
        Self {
            amenity: amenity.to_string(),
            granted: false,
            reason: Some(reason),
            paid_amount: None,
        }
    }

    fn granted(amenity: &str, paid_amount: String) -> Self {
        Self {
            amenity: amenity.to_string(),
            granted: true,
            reason: None,
            paid_amount: Some(paid_amount),
        }
    }
}

/// Resolves the receipt metadata captured in `eligibility` and decides
/// access to `amenity`.
///
/// Resolver failures surface as [`LedgerError::MetadataUnavailable`]; they
/// never touch ledger state.
pub async fn check_amenity_access(
    eligibility: AmenityEligibility,
    amenity: &str,
    resolver: &dyn MetadataResolver,
) -> LedgerResult<AccessDecision> {
    let metadata_ref = match eligibility {
        AmenityEligibility::NoIdentity => {
            return Ok(AccessDecision::denied(amenity, DenialReason::NoIdentity))
        }
        AmenityEligibility::NoFeeReceipt => {
            return Ok(AccessDecision::denied(
                amenity,
                DenialReason::NoActiveFeeReceipt,
            ))
        }
        AmenityEligibility::Eligible { metadata_ref, .. } => metadata_ref,
    };

    let document = resolver.resolve(&metadata_ref).await.map_err(|e| {
        tracing::warn!(reference = %metadata_ref, error = %e, "receipt metadata unavailable");
        LedgerError::MetadataUnavailable(metadata_ref.clone())
    })?;

    Ok(match document.attribute(amenity) {
        Some(value) if value.trim() != "0" => AccessDecision::granted(amenity, value),
        _ => AccessDecision::denied(amenity, DenialReason::FeeNotPaid),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
