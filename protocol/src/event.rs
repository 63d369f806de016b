//! # Ledger Events
//!
//! Every successful mutation emits one or more [`LedgerEvent`]s. The ledger
//! keeps no history of its own; events are handed to the node, which
//! broadcasts them to WebSocket subscribers. Anyone who needs an audit trail
//! indexes this stream externally.

use serde::{Deserialize, Serialize};

use crate::types::{
    Address, CourseId, CredentialId, EnrollmentId, LedgerRef, ReceiptId, TokenId,
};

/// A state change that has already been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    // -- Identity -----------------------------------------------------------
    IdentityMinted {
        ledger: LedgerRef,
        holder: Address,
        id: CredentialId,
        role: String,
    },
    IdentityBurned {
        ledger: LedgerRef,
        holder: Address,
        id: CredentialId,
    },
    IdentityLedgerDeployed {
        ledger: LedgerRef,
    },

    // -- Fees ---------------------------------------------------------------
    FeePaid {
        holder: Address,
        id: ReceiptId,
        amount: u64,
        semester: String,
    },
    FeeReceiptBurned {
        holder: Address,
        id: ReceiptId,
    },

    // -- Courses ------------------------------------------------------------
    CourseAdded {
        course_id: CourseId,
        name: String,
    },
    CourseUpdated {
        course_id: CourseId,
    },
    CourseActivated {
        course_id: CourseId,
    },
    CourseDeactivated {
        course_id: CourseId,
    },
    StudentRegistered {
        student: Address,
        course_id: CourseId,
        enrollment_id: EnrollmentId,
    },
    GradeSubmitted {
        student: Address,
        course_id: CourseId,
        completion_id: EnrollmentId,
        grade: u8,
    },

    // -- Rewards ------------------------------------------------------------
    RewardMinted {
        holder: Address,
        token_id: TokenId,
    },
    RewardReused {
        holder: Address,
        token_id: TokenId,
    },
    RewardUsed {
        holder: Address,
        token_id: TokenId,
    },
    RewardTransferred {
        from: Address,
        to: Address,
        token_id: TokenId,
    },
    Approval {
        owner: Address,
        approved: Address,
        token_id: TokenId,
    },
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
    IdentityLedgerChanged {
        ledger: LedgerRef,
    },

    // -- Access points ------------------------------------------------------
    AccessPointAdded {
        location: String,
        account: Address,
        cost: u64,
    },
    AccessPointUpdated {
        location: String,
        account: Address,
        cost: u64,
    },
    AccessPointDeactivated {
        location: String,
    },
}

impl LedgerEvent {
    /// Snake-case name of the event, as it appears in the `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::IdentityMinted { .. } => "identity_minted",
            LedgerEvent::IdentityBurned { .. } => "identity_burned",
            LedgerEvent::IdentityLedgerDeployed { .. } => "identity_ledger_deployed",
            LedgerEvent::FeePaid { .. } => "fee_paid",
            LedgerEvent::FeeReceiptBurned { .. } => "fee_receipt_burned",
            LedgerEvent::CourseAdded { .. } => "course_added",
            LedgerEvent::CourseUpdated { .. } => "course_updated",
            LedgerEvent::CourseActivated { .. } => "course_activated",
            LedgerEvent::CourseDeactivated { .. } => "course_deactivated",
            LedgerEvent::StudentRegistered { .. } => "student_registered",
            LedgerEvent::GradeSubmitted { .. } => "grade_submitted",
            LedgerEvent::RewardMinted { .. } => "reward_minted",
            LedgerEvent::RewardReused { .. } => "reward_reused",
            LedgerEvent::RewardUsed { .. } => "reward_used",
            LedgerEvent::RewardTransferred { .. } => "reward_transferred",
            LedgerEvent::Approval { .. } => "approval",
            LedgerEvent::ApprovalForAll { .. } => "approval_for_all",
            LedgerEvent::IdentityLedgerChanged { .. } => "identity_ledger_changed",
            LedgerEvent::AccessPointAdded { .. } => "access_point_added",
            LedgerEvent::AccessPointUpdated { .. } => "access_point_updated",
            LedgerEvent::AccessPointDeactivated { .. } => "access_point_deactivated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_tagged_with_snake_case_type() {
        let ev = LedgerEvent::RewardReused {
            holder: Address::from("0xc"),
            token_id: 3,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "reward_reused");
        assert_eq!(json["token_id"], 3);
        assert_eq!(json["type"], ev.name());
    }

    #[test]
    fn fee_paid_round_trips_through_json() {
        let ev = LedgerEvent::FeePaid {
            holder: Address::from("0xs"),
            id: 2,
            amount: 1,
            semester: "Spring 2025".into(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: LedgerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
