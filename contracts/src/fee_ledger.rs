//! # Fee Ledger
//!
//! Records semester fee payments as soulbound receipts. Each holder has at
//! most one live receipt, tracked by the `active` pointer (absent = 0 =
//! never paid). Paying again burns the previous receipt, mints a new one,
//! moves the pointer and credits the treasury, all in one step.
//!
//! Eligibility: the payer must own a live identity credential. The ledger
//! asks through an [`IdentityView`] and never holds a reference to the
//! identity ledger itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use campus_protocol::config::FIRST_CREDENTIAL_ID;
use campus_protocol::error::{LedgerError, LedgerResult};
use campus_protocol::types::{Address, MetadataRef, ReceiptId};

use crate::capability::{FeeView, IdentityView};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Proof that a holder paid the fee for a semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeReceipt {
    pub id: ReceiptId,
    pub holder: Address,
    pub semester: String,
    pub metadata_ref: MetadataRef,
    /// Amount forwarded to the treasury with this payment.
    pub amount: u64,
    pub paid_at: DateTime<Utc>,
}

/// The fixed sink that receives every fee payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    pub address: Address,
    /// Total value forwarded so far.
    pub collected: u64,
}

/// Outcome of a successful [`FeeLedger::pay_fee`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePayment {
    /// The newly minted receipt, now the holder's active one.
    pub receipt_id: ReceiptId,
    /// The receipt that was active before and has been burned.
    pub burned: Option<ReceiptId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeLedger {
    receipts: BTreeMap<ReceiptId, FeeReceipt>,
    active: BTreeMap<Address, ReceiptId>,
    next_id: ReceiptId,
    treasury: Treasury,
}

impl FeeLedger {
    /// Creates an empty ledger forwarding payments to `treasury`.
    pub fn new(treasury: Address) -> Self {
        Self {
            receipts: BTreeMap::new(),
            active: BTreeMap::new(),
            next_id: FIRST_CREDENTIAL_ID,
            treasury: Treasury {
                address: treasury,
                collected: 0,
            },
        }
    }

    /// Records a fee payment by `holder`.
    ///
    /// Every check runs before the first write:
    /// 1. `holder` is not null ([`LedgerError::InvalidAddress`]).
    /// 2. `holder` owns a live identity ([`LedgerError::MissingIdentity`]).
    /// 3. `amount > 0` ([`LedgerError::ZeroFee`]).
    /// 4. The treasury can absorb `amount` ([`LedgerError::AmountOverflow`]).
    pub fn pay_fee(
        &mut self,
        identity: &impl IdentityView,
        holder: &Address,
        semester: &str,
        metadata_ref: MetadataRef,
        amount: u64,
    ) -> LedgerResult<FeePayment> {
        if holder.is_null() {
            return Err(LedgerError::InvalidAddress("holder"));
        }
        if !identity.has_live_identity(holder) {
            return Err(LedgerError::MissingIdentity(holder.clone()));
        }
        if amount == 0 {
            return Err(LedgerError::ZeroFee);
        }
        let collected = self
            .treasury
            .collected
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        let burned = self.active.remove(holder);
        if let Some(old) = burned {
            self.receipts.remove(&old);
        }

        let receipt_id = self.next_id;
        self.receipts.insert(
            receipt_id,
            FeeReceipt {
                id: receipt_id,
                holder: holder.clone(),
                semester: semester.to_string(),
                metadata_ref,
                amount,
                paid_at: Utc::now(),
            },
        );
        self.active.insert(holder.clone(), receipt_id);
        self.next_id += 1;
        self.treasury.collected = collected;

        tracing::debug!(
            receipt_id,
            burned = ?burned,
            holder = %holder,
            amount,
            "fee receipt swapped"
        );
        Ok(FeePayment { receipt_id, burned })
    }

    /// Fee receipts never move.
    pub fn transfer(&self, _from: &Address, _to: &Address, id: ReceiptId) -> LedgerResult<()> {
        Err(LedgerError::SoulboundTransferDisallowed {
            credential: "fee receipt",
            id,
        })
    }

    // -- Reads --------------------------------------------------------------

    /// Active receipt id for `holder`, or 0 when they have never paid.
    pub fn active_receipt_of(&self, holder: &Address) -> ReceiptId {
        self.active.get(holder).copied().unwrap_or(0)
    }

    /// The holder's active receipt.
    pub fn active_receipt(&self, holder: &Address) -> Option<&FeeReceipt> {
        self.active.get(holder).and_then(|id| self.receipts.get(id))
    }

    pub fn receipt(&self, id: ReceiptId) -> LedgerResult<&FeeReceipt> {
        self.receipts
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("fee receipt", id))
    }

    pub fn owner_of(&self, id: ReceiptId) -> LedgerResult<&Address> {
        Ok(&self.receipt(id)?.holder)
    }

    pub fn token_uri(&self, id: ReceiptId) -> LedgerResult<&MetadataRef> {
        Ok(&self.receipt(id)?.metadata_ref)
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Number of live (unburned) receipts.
    pub fn live_receipts(&self) -> usize {
        self.receipts.len()
    }
}

impl FeeView for FeeLedger {
    fn verify_fee_paid(&self, holder: &Address) -> bool {
        self.active_receipt_of(holder) != 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
