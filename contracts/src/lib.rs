//! # Campus Ledgers
//!
//! The state machines behind the campus credential-and-reward system:
//!
//! - **Identity Ledger** — soulbound identity credentials, one per holder,
//!   gating everything else.
//! - **Fee Ledger** — soulbound semester fee receipts. Paying again burns
//!   the previous receipt and forwards value to the treasury.
//! - **Enrollment Ledger** — the course catalog plus soulbound enrollment
//!   and completion credentials.
//! - **Reward Pool** — transferable reward tokens whose ids are recycled
//!   through a FIFO queue when students spend them.
//!
//! [`campus::Campus`] owns one of each (and any extra identity ledger
//! instances) and is the only writer.
//!
//! ## Design Principles
//!
//! 1. Every mutation validates all of its preconditions before the first
//!    write. A rejected call leaves the store byte-for-byte unchanged.
//! 2. Ledgers never reference each other. Cross-ledger checks go through
//!    the narrow [`capability`] traits, wired by `Campus`.
//! 3. Value arithmetic is checked; overflow is an error, not a wrap.
//! 4. Every public type is serializable (serde) for the wire and for
//!    snapshots.

pub mod amenity;
pub mod campus;
pub mod capability;
pub mod enrollment_ledger;
pub mod fee_ledger;
pub mod identity_ledger;
pub mod reward_pool;

pub use campus::Campus;
