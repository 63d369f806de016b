//! # Identity Ledger
//!
//! Issues and revokes the soulbound identity credential that gates every
//! other campus ledger. A holder owns at most one live credential at a time.
//! Burning removes the credential outright, so lookups by a burned id fail
//! with `NotFound` instead of reporting an inactive record.
//!
//! ## Storage
//!
//! - `credentials` — id → credential, the arena.
//! - `holders` — holder → id, the uniqueness index. Kept in lockstep with
//!   the arena by `mint_identity` and `burn_identity`, the only writers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use campus_protocol::config::{DEFAULT_ROLE, FIRST_CREDENTIAL_ID};
use campus_protocol::error::{LedgerError, LedgerResult};
use campus_protocol::types::{Address, CredentialId, MetadataRef};

use crate::capability::IdentityView;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A non-transferable campus identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCredential {
    pub id: CredentialId,
    pub holder: Address,
    /// Free-form role label. Defaults to `"student"`.
    pub role: String,
    pub active: bool,
    pub metadata_ref: MetadataRef,
    pub issued_at: DateTime<Utc>,
}

/// One identity ledger instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityLedger {
    credentials: BTreeMap<CredentialId, IdentityCredential>,
    holders: BTreeMap<Address, CredentialId>,
    next_id: CredentialId,
}

impl IdentityLedger {
    /// Creates an empty ledger whose first credential will be id 1.
    pub fn new() -> Self {
        Self {
            credentials: BTreeMap::new(),
            holders: BTreeMap::new(),
            next_id: FIRST_CREDENTIAL_ID,
        }
    }

    // -- Mutations ----------------------------------------------------------

    /// Issues a credential to `holder`.
    ///
    /// An empty `role` is stored as the default role.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAddress`] for the null address.
    /// - [`LedgerError::DuplicateIdentity`] if the holder already has one.
    pub fn mint_identity(
        &mut self,
        holder: &Address,
        role: &str,
        metadata_ref: MetadataRef,
    ) -> LedgerResult<CredentialId> {
        if holder.is_null() {
            return Err(LedgerError::InvalidAddress("holder"));
        }
        if self.holders.contains_key(holder) {
            return Err(LedgerError::DuplicateIdentity(holder.clone()));
        }

        let id = self.next_id;
        let role = if role.trim().is_empty() {
            DEFAULT_ROLE.to_string()
        } else {
            role.to_string()
        };

        self.credentials.insert(
            id,
            IdentityCredential {
                id,
                holder: holder.clone(),
                role,
                active: true,
                metadata_ref,
                issued_at: Utc::now(),
            },
        );
        self.holders.insert(holder.clone(), id);
        self.next_id += 1;

        tracing::debug!(id, holder = %holder, "identity credential minted");
        Ok(id)
    }

    /// Destroys credential `id` and frees its holder for a future mint.
    /// Returns the removed credential.
    pub fn burn_identity(&mut self, id: CredentialId) -> LedgerResult<IdentityCredential> {
        let credential = self
            .credentials
            .remove(&id)
            .ok_or_else(|| LedgerError::not_found("identity credential", id))?;
        self.holders.remove(&credential.holder);

        tracing::debug!(id, holder = %credential.holder, "identity credential burned");
        Ok(credential)
    }

    /// Identity credentials never move.
    pub fn transfer(&self, _from: &Address, _to: &Address, id: CredentialId) -> LedgerResult<()> {
        Err(LedgerError::SoulboundTransferDisallowed {
            credential: "identity",
            id,
        })
    }

    // -- Reads --------------------------------------------------------------

    pub fn credential(&self, id: CredentialId) -> LedgerResult<&IdentityCredential> {
        self.credentials
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("identity credential", id))
    }

    pub fn is_active(&self, id: CredentialId) -> LedgerResult<bool> {
        Ok(self.credential(id)?.active)
    }

    pub fn role_of(&self, id: CredentialId) -> LedgerResult<&str> {
        Ok(&self.credential(id)?.role)
    }

    pub fn owner_of(&self, id: CredentialId) -> LedgerResult<&Address> {
        Ok(&self.credential(id)?.holder)
    }

    pub fn token_uri(&self, id: CredentialId) -> LedgerResult<&MetadataRef> {
        Ok(&self.credential(id)?.metadata_ref)
    }

    /// The holder's credential id, if they have one.
    pub fn identity_of(&self, holder: &Address) -> Option<CredentialId> {
        self.holders.get(holder).copied()
    }

    /// ERC-721 style balance: 0 or 1.
    pub fn balance_of(&self, holder: &Address) -> u64 {
        u64::from(self.holders.contains_key(holder))
    }

    pub fn total_identities(&self) -> usize {
        self.credentials.len()
    }

    /// Id the next successful mint will receive.
    pub fn next_id(&self) -> CredentialId {
        self.next_id
    }
}

impl Default for IdentityLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityView for IdentityLedger {
    fn has_live_identity(&self, holder: &Address) -> bool {
        self.identity_of(holder)
            .and_then(|id| self.credentials.get(&id))
            .map(|c| c.active)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use campus_protocol::error::ErrorKind;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let mut ledger = IdentityLedger::new();
        let a = ledger.mint_identity(&addr("0xa"), "student", "ipfs://a".into()).unwrap();
        let b = ledger.mint_identity(&addr("0xb"), "student", "ipfs://b".into()).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(ledger.total_identities(), 2);
    }

    #[test]
    fn new_credential_is_active_with_role() {
        let mut ledger = IdentityLedger::new();
        let id = ledger.mint_identity(&addr("0xa"), "student", "ipfs://a".into()).unwrap();
        assert!(ledger.is_active(id).unwrap());
        assert_eq!(ledger.role_of(id).unwrap(), "student");
        assert_eq!(ledger.owner_of(id).unwrap(), &addr("0xa"));
        assert_eq!(ledger.token_uri(id).unwrap(), "ipfs://a");
    }

    #[test]
    fn empty_role_falls_back_to_default() {
        let mut ledger = IdentityLedger::new();
        let id = ledger.mint_identity(&addr("0xa"), "  ", "ipfs://a".into()).unwrap();
        assert_eq!(ledger.role_of(id).unwrap(), DEFAULT_ROLE);
    }

    #[test]
    fn second_mint_for_holder_rejected() {
        let mut ledger = IdentityLedger::new();
        ledger.mint_identity(&addr("0xa"), "student", "ipfs://a".into()).unwrap();
        let err = ledger
            .mint_identity(&addr("0xa"), "staff", "ipfs://a2".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateIdentity);
        assert_eq!(ledger.total_identities(), 1);
        assert_eq!(ledger.next_id(), 2);
    }

    #[test]
    fn null_holder_rejected() {
        let mut ledger = IdentityLedger::new();
        let err = ledger
            .mint_identity(&Address::null(), "student", "ipfs://x".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    }

    #[test]
    fn burn_removes_credential_entirely() {
        let mut ledger = IdentityLedger::new();
        let id = ledger.mint_identity(&addr("0xa"), "student", "ipfs://a".into()).unwrap();
        let burned = ledger.burn_identity(id).unwrap();
        assert_eq!(burned.holder, addr("0xa"));

        assert_eq!(ledger.owner_of(id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(ledger.role_of(id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(ledger.is_active(id).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!ledger.has_live_identity(&addr("0xa")));
        assert_eq!(ledger.balance_of(&addr("0xa")), 0);
    }

    #[test]
    fn burn_unknown_id_fails() {
        let mut ledger = IdentityLedger::new();
        assert_eq!(ledger.burn_identity(9).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn holder_can_be_reissued_after_burn_with_fresh_id() {
        let mut ledger = IdentityLedger::new();
        let first = ledger.mint_identity(&addr("0xa"), "student", "ipfs://a".into()).unwrap();
        ledger.burn_identity(first).unwrap();
        let second = ledger.mint_identity(&addr("0xa"), "student", "ipfs://a".into()).unwrap();
        assert_ne!(first, second);
        assert_eq!(ledger.identity_of(&addr("0xa")), Some(second));
    }

    #[test]
    fn transfers_always_rejected() {
        let mut ledger = IdentityLedger::new();
        let id = ledger.mint_identity(&addr("0xa"), "student", "ipfs://a".into()).unwrap();
        let err = ledger.transfer(&addr("0xa"), &addr("0xb"), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SoulboundTransferDisallowed);
        assert_eq!(ledger.owner_of(id).unwrap(), &addr("0xa"));
    }

    #[test]
    fn at_most_one_live_credential_per_holder_after_churn() {
        let mut ledger = IdentityLedger::new();
        let holders = ["0xa", "0xb", "0xc"];
        for round in 0..4 {
            for h in holders {
                let _ = ledger.mint_identity(&addr(h), "student", format!("ipfs://{h}/{round}"));
            }
            if let Some(id) = ledger.identity_of(&addr("0xb")) {
                ledger.burn_identity(id).unwrap();
            }
        }
        for h in holders {
            let owned = ledger
                .credentials
                .values()
                .filter(|c| c.holder == addr(h))
                .count();
            assert!(owned <= 1, "{h} owns {owned} credentials");
        }
    }
}
