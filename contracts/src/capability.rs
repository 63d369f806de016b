//! # Eligibility Capabilities
//!
//! Read-only views that the enrollment ledger and reward pool consult during
//! a call. They expose only the two questions those ledgers may ask, so a
//! consumer can never mutate identity or fee state through them.

use campus_protocol::types::Address;

/// "Does this account currently own a live identity credential?"
pub trait IdentityView {
    fn has_live_identity(&self, holder: &Address) -> bool;
}

/// "Has this account paid a fee (does it hold an active receipt)?"
pub trait FeeView {
    fn verify_fee_paid(&self, holder: &Address) -> bool;
}

impl<T: IdentityView + ?Sized> IdentityView for &T {
    fn has_live_identity(&self, holder: &Address) -> bool {
        (**self).has_live_identity(holder)
    }
}

impl<T: FeeView + ?Sized> FeeView for &T {
    fn verify_fee_paid(&self, holder: &Address) -> bool {
        (**self).verify_fee_paid(holder)
    }
}
