//! # Campus Store
//!
//! The single writer that owns every ledger. All state changes go through a
//! `&mut Campus` method, and each method validates every precondition
//! before its first write, so an error leaves the store exactly as it was.
//!
//! Cross-ledger checks are wired here: the fee and enrollment ledgers are
//! handed read-only views of the primary identity ledger and the fee ledger;
//! the reward pool is handed whichever identity ledger it currently points
//! at. No ledger holds a reference to another.
//!
//! Successful mutations push [`LedgerEvent`]s into an in-memory buffer that
//! the host drains after each call. The buffer is not part of the persisted
//! state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use campus_protocol::config::PRIMARY_IDENTITY_LEDGER;
use campus_protocol::error::{LedgerError, LedgerResult};
use campus_protocol::event::LedgerEvent;
use campus_protocol::rpc::CredentialFamily;
use campus_protocol::types::{
    Address, CourseId, CredentialId, EnrollmentId, LedgerRef, MetadataRef, ReceiptId, TokenId,
};

use crate::enrollment_ledger::{EnrollmentLedger, Graded};
use crate::fee_ledger::{FeeLedger, FeePayment};
use crate::identity_ledger::IdentityLedger;
use crate::reward_pool::{GrantKind, RewardGrant, RewardPool};

/// What the amenity check needs from the ledger, captured under a read
/// snapshot so that metadata resolution can happen after the lock is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AmenityEligibility {
    NoIdentity,
    NoFeeReceipt,
    Eligible {
        receipt_id: ReceiptId,
        metadata_ref: MetadataRef,
    },
}

/// Counters surfaced by `/status` and the metrics gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusStats {
    pub identity_ledgers: usize,
    pub live_identities: usize,
    pub live_fee_receipts: usize,
    pub fees_collected: u64,
    pub courses: usize,
    pub live_enrollments: usize,
    pub completions: usize,
    pub reward_supply: usize,
    pub pooled_rewards: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campus {
    admin: Address,
    identity_ledgers: BTreeMap<LedgerRef, IdentityLedger>,
    fees: FeeLedger,
    enrollment: EnrollmentLedger,
    rewards: RewardPool,
    #[serde(skip)]
    events: Vec<LedgerEvent>,
}

impl Campus {
    /// Genesis: one empty identity ledger (the primary), empty fee,
    /// enrollment and reward ledgers.
    pub fn new(admin: Address, treasury: Address) -> LedgerResult<Self> {
        if admin.is_null() {
            return Err(LedgerError::InvalidAddress("administrator"));
        }
        if treasury.is_null() {
            return Err(LedgerError::InvalidAddress("treasury"));
        }
        let mut identity_ledgers = BTreeMap::new();
        identity_ledgers.insert(PRIMARY_IDENTITY_LEDGER, IdentityLedger::new());

        Ok(Self {
            rewards: RewardPool::new(admin.clone()),
            admin,
            identity_ledgers,
            fees: FeeLedger::new(treasury),
            enrollment: EnrollmentLedger::new(),
            events: Vec::new(),
        })
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    fn ensure_admin(&self, caller: &Address) -> LedgerResult<()> {
        if caller != &self.admin {
            return Err(LedgerError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    /// Logs the outcome of a mutation and passes it through.
    fn audit<T>(&self, op: &'static str, result: LedgerResult<T>) -> LedgerResult<T> {
        match &result {
            Ok(_) => tracing::info!(op, "ledger mutation applied"),
            Err(e) => tracing::warn!(op, kind = %e.kind(), error = %e, "ledger mutation rejected"),
        }
        result
    }

    // -- Identity -----------------------------------------------------------

    /// The identity ledger instance `ledger`, or the primary when `None`.
    pub fn identity(&self, ledger: Option<LedgerRef>) -> LedgerResult<&IdentityLedger> {
        lookup(
            &self.identity_ledgers,
            ledger.unwrap_or(PRIMARY_IDENTITY_LEDGER),
        )
    }

    pub fn primary_identity(&self) -> LedgerResult<&IdentityLedger> {
        self.identity(None)
    }

    pub fn identity_ledger_refs(&self) -> Vec<LedgerRef> {
        self.identity_ledgers.keys().copied().collect()
    }

    /// Creates a fresh, empty identity ledger instance.
    pub fn deploy_identity_ledger(&mut self, caller: &Address) -> LedgerResult<LedgerRef> {
        let result = self.ensure_admin(caller).map(|()| {
            let next = self
                .identity_ledgers
                .keys()
                .next_back()
                .map_or(PRIMARY_IDENTITY_LEDGER, |last| last + 1);
            self.identity_ledgers.insert(next, IdentityLedger::new());
            self.events
                .push(LedgerEvent::IdentityLedgerDeployed { ledger: next });
            next
        });
        self.audit("deploy_identity_ledger", result)
    }

    pub fn mint_identity(
        &mut self,
        caller: &Address,
        holder: &Address,
        role: &str,
        metadata_ref: MetadataRef,
    ) -> LedgerResult<CredentialId> {
        self.mint_identity_in(None, caller, holder, role, metadata_ref)
    }

    pub fn mint_identity_in(
        &mut self,
        ledger: Option<LedgerRef>,
        caller: &Address,
        holder: &Address,
        role: &str,
        metadata_ref: MetadataRef,
    ) -> LedgerResult<CredentialId> {
        let ledger = ledger.unwrap_or(PRIMARY_IDENTITY_LEDGER);
        let result = self.ensure_admin(caller).and_then(|()| {
            let ids = lookup_mut(&mut self.identity_ledgers, ledger)?;
            let id = ids.mint_identity(holder, role, metadata_ref)?;
            let role = ids.role_of(id)?.to_string();
            self.events.push(LedgerEvent::IdentityMinted {
                ledger,
                holder: holder.clone(),
                id,
                role,
            });
            Ok(id)
        });
        self.audit("mint_identity", result)
    }

    pub fn burn_identity(&mut self, caller: &Address, id: CredentialId) -> LedgerResult<()> {
        self.burn_identity_in(None, caller, id)
    }

    pub fn burn_identity_in(
        &mut self,
        ledger: Option<LedgerRef>,
        caller: &Address,
        id: CredentialId,
    ) -> LedgerResult<()> {
        let ledger = ledger.unwrap_or(PRIMARY_IDENTITY_LEDGER);
        let result = self.ensure_admin(caller).and_then(|()| {
            let burned = lookup_mut(&mut self.identity_ledgers, ledger)?.burn_identity(id)?;
            self.events.push(LedgerEvent::IdentityBurned {
                ledger,
                holder: burned.holder,
                id,
            });
            Ok(())
        });
        self.audit("burn_identity", result)
    }

    // -- Fees ---------------------------------------------------------------

    pub fn fees(&self) -> &FeeLedger {
        &self.fees
    }

    /// `holder` pays `amount` for `semester`.
    pub fn pay_fee(
        &mut self,
        holder: &Address,
        semester: &str,
        metadata_ref: MetadataRef,
        amount: u64,
    ) -> LedgerResult<FeePayment> {
        let result = lookup(&self.identity_ledgers, PRIMARY_IDENTITY_LEDGER).and_then(|ids| {
            let paid = self
                .fees
                .pay_fee(ids, holder, semester, metadata_ref, amount)?;
            if let Some(old) = paid.burned {
                self.events.push(LedgerEvent::FeeReceiptBurned {
                    holder: holder.clone(),
                    id: old,
                });
            }
            self.events.push(LedgerEvent::FeePaid {
                holder: holder.clone(),
                id: paid.receipt_id,
                amount,
                semester: semester.to_string(),
            });
            Ok(paid)
        });
        self.audit("pay_fee", result)
    }

    // -- Courses ------------------------------------------------------------

    pub fn enrollment(&self) -> &EnrollmentLedger {
        &self.enrollment
    }

    pub fn add_course(
        &mut self,
        caller: &Address,
        name: &str,
        instructor: &str,
        duration_weeks: u32,
        credits: u32,
    ) -> LedgerResult<CourseId> {
        let result = self.ensure_admin(caller).and_then(|()| {
            let course_id = self
                .enrollment
                .add_course(name, instructor, duration_weeks, credits)?;
            self.events.push(LedgerEvent::CourseAdded {
                course_id,
                name: name.to_string(),
            });
            Ok(course_id)
        });
        self.audit("add_course", result)
    }

    pub fn update_course(
        &mut self,
        caller: &Address,
        course_id: CourseId,
        name: &str,
        instructor: &str,
        duration_weeks: u32,
        credits: u32,
    ) -> LedgerResult<()> {
        let result = self.ensure_admin(caller).and_then(|()| {
            self.enrollment
                .update_course(course_id, name, instructor, duration_weeks, credits)?;
            self.events.push(LedgerEvent::CourseUpdated { course_id });
            Ok(())
        });
        self.audit("update_course", result)
    }

    pub fn activate_course(&mut self, caller: &Address, course_id: CourseId) -> LedgerResult<()> {
        let result = self.ensure_admin(caller).and_then(|()| {
            self.enrollment.activate_course(course_id)?;
            self.events.push(LedgerEvent::CourseActivated { course_id });
            Ok(())
        });
        self.audit("activate_course", result)
    }

    pub fn deactivate_course(&mut self, caller: &Address, course_id: CourseId) -> LedgerResult<()> {
        let result = self.ensure_admin(caller).and_then(|()| {
            self.enrollment.deactivate_course(course_id)?;
            self.events.push(LedgerEvent::CourseDeactivated { course_id });
            Ok(())
        });
        self.audit("deactivate_course", result)
    }

    /// Returns the ids that were deactivated by this call.
    pub fn deactivate_all_courses(&mut self, caller: &Address) -> LedgerResult<Vec<CourseId>> {
        let result = self.ensure_admin(caller).map(|()| {
            let changed = self.enrollment.deactivate_all_courses();
            self.events.extend(
                changed
                    .iter()
                    .map(|&course_id| LedgerEvent::CourseDeactivated { course_id }),
            );
            changed
        });
        self.audit("deactivate_all_courses", result)
    }

    // -- Enrollment ---------------------------------------------------------

    /// `student` enrolls in `course_id`.
    pub fn register(
        &mut self,
        student: &Address,
        course_id: CourseId,
        metadata_ref: MetadataRef,
    ) -> LedgerResult<EnrollmentId> {
        let result = lookup(&self.identity_ledgers, PRIMARY_IDENTITY_LEDGER).and_then(|ids| {
            let enrollment_id =
                self.enrollment
                    .register(ids, &self.fees, student, course_id, metadata_ref)?;
            self.events.push(LedgerEvent::StudentRegistered {
                student: student.clone(),
                course_id,
                enrollment_id,
            });
            Ok(enrollment_id)
        });
        self.audit("register", result)
    }

    pub fn submit_grade(
        &mut self,
        caller: &Address,
        student: &Address,
        course_id: CourseId,
        grade: i64,
        metadata_ref: MetadataRef,
    ) -> LedgerResult<Graded> {
        let result = self.ensure_admin(caller).and_then(|()| {
            let graded = self
                .enrollment
                .submit_grade(student, course_id, grade, metadata_ref)?;
            self.events.push(LedgerEvent::GradeSubmitted {
                student: student.clone(),
                course_id,
                completion_id: graded.completion_id,
                grade: graded.grade,
            });
            Ok(graded)
        });
        self.audit("submit_grade", result)
    }

    // -- Rewards ------------------------------------------------------------

    pub fn rewards(&self) -> &RewardPool {
        &self.rewards
    }

    pub fn mint_reward(&mut self, caller: &Address, holder: &Address) -> LedgerResult<RewardGrant> {
        let result = self.ensure_admin(caller).and_then(|()| {
            let ids = lookup(&self.identity_ledgers, self.rewards.identity_ledger())?;
            let grant = self.rewards.mint_reward(ids, holder)?;
            self.events.push(grant_event(holder, grant));
            Ok(grant)
        });
        self.audit("mint_reward", result)
    }

    pub fn mint_multiple_rewards(
        &mut self,
        caller: &Address,
        holder: &Address,
        count: u32,
    ) -> LedgerResult<Vec<RewardGrant>> {
        let result = self.ensure_admin(caller).and_then(|()| {
            let ids = lookup(&self.identity_ledgers, self.rewards.identity_ledger())?;
            let grants = self.rewards.mint_multiple_rewards(ids, holder, count)?;
            self.events
                .extend(grants.iter().map(|g| grant_event(holder, *g)));
            Ok(grants)
        });
        self.audit("mint_multiple_rewards", result)
    }

    pub fn use_reward(&mut self, caller: &Address, token_id: TokenId) -> LedgerResult<()> {
        let result = self.rewards.use_reward(caller, token_id).map(|()| {
            self.events.push(LedgerEvent::RewardUsed {
                holder: caller.clone(),
                token_id,
            });
        });
        self.audit("use_reward", result)
    }

    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> LedgerResult<()> {
        let result = lookup(&self.identity_ledgers, self.rewards.identity_ledger()).and_then(|ids| {
            self.rewards.transfer_from(ids, caller, from, to, token_id)?;
            self.events.push(LedgerEvent::RewardTransferred {
                from: from.clone(),
                to: to.clone(),
                token_id,
            });
            Ok(())
        });
        self.audit("transfer_from", result)
    }

    pub fn approve(
        &mut self,
        caller: &Address,
        approved: &Address,
        token_id: TokenId,
    ) -> LedgerResult<()> {
        let result = self.rewards.approve(caller, approved, token_id).and_then(|()| {
            let owner = self.rewards.owner_of(token_id)?.clone();
            self.events.push(LedgerEvent::Approval {
                owner,
                approved: approved.clone(),
                token_id,
            });
            Ok(())
        });
        self.audit("approve", result)
    }

    pub fn set_approval_for_all(
        &mut self,
        caller: &Address,
        operator: &Address,
        approved: bool,
    ) -> LedgerResult<()> {
        let result = self
            .rewards
            .set_approval_for_all(caller, operator, approved)
            .map(|()| {
                self.events.push(LedgerEvent::ApprovalForAll {
                    owner: caller.clone(),
                    operator: operator.clone(),
                    approved,
                });
            });
        self.audit("set_approval_for_all", result)
    }

    /// Points the reward pool at another identity ledger instance.
    pub fn set_id_ledger(&mut self, caller: &Address, ledger: LedgerRef) -> LedgerResult<()> {
        let result = self.ensure_admin(caller).and_then(|()| {
            lookup(&self.identity_ledgers, ledger)?;
            self.rewards.set_identity_ledger(ledger);
            self.events.push(LedgerEvent::IdentityLedgerChanged { ledger });
            Ok(())
        });
        self.audit("set_id_ledger", result)
    }

    // -- Access points ------------------------------------------------------

    pub fn add_access_point(
        &mut self,
        caller: &Address,
        location: &str,
        account: &Address,
        cost: u64,
    ) -> LedgerResult<()> {
        let result = self.ensure_admin(caller).and_then(|()| {
            self.rewards.add_access_point(location, account, cost)?;
            self.events.push(LedgerEvent::AccessPointAdded {
                location: location.to_string(),
                account: account.clone(),
                cost,
            });
            Ok(())
        });
        self.audit("add_access_point", result)
    }

    pub fn update_access_point(
        &mut self,
        caller: &Address,
        location: &str,
        account: &Address,
        cost: u64,
    ) -> LedgerResult<()> {
        let result = self.ensure_admin(caller).and_then(|()| {
            self.rewards.update_access_point(location, account, cost)?;
            self.events.push(LedgerEvent::AccessPointUpdated {
                location: location.to_string(),
                account: account.clone(),
                cost,
            });
            Ok(())
        });
        self.audit("update_access_point", result)
    }

    pub fn deactivate_access_point(&mut self, caller: &Address, location: &str) -> LedgerResult<()> {
        let result = self.ensure_admin(caller).and_then(|()| {
            self.rewards.deactivate_access_point(location)?;
            self.events.push(LedgerEvent::AccessPointDeactivated {
                location: location.to_string(),
            });
            Ok(())
        });
        self.audit("deactivate_access_point", result)
    }

    // -- Soulbound credentials ----------------------------------------------

    /// Identity, fee, enrollment and completion credentials reject every
    /// transfer, whoever asks.
    pub fn transfer_credential(
        &self,
        family: CredentialFamily,
        from: &Address,
        to: &Address,
        id: u64,
    ) -> LedgerResult<()> {
        let result = match family {
            CredentialFamily::Identity => self.primary_identity()?.transfer(from, to, id),
            CredentialFamily::FeeReceipt => self.fees.transfer(from, to, id),
            CredentialFamily::Enrollment => self.enrollment.transfer_enrollment(id),
            CredentialFamily::Completion => self.enrollment.transfer_completion(id),
        };
        self.audit("transfer_credential", result)
    }

    // -- Reads & host plumbing ----------------------------------------------

    /// Snapshot of what the amenity check needs for `holder`.
    pub fn amenity_eligibility(&self, holder: &Address) -> LedgerResult<AmenityEligibility> {
        if self.primary_identity()?.balance_of(holder) == 0 {
            return Ok(AmenityEligibility::NoIdentity);
        }
        Ok(match self.fees.active_receipt(holder) {
            Some(receipt) => AmenityEligibility::Eligible {
                receipt_id: receipt.id,
                metadata_ref: receipt.metadata_ref.clone(),
            },
            None => AmenityEligibility::NoFeeReceipt,
        })
    }

    pub fn stats(&self) -> CampusStats {
        CampusStats {
            identity_ledgers: self.identity_ledgers.len(),
            live_identities: self
                .identity_ledgers
                .get(&PRIMARY_IDENTITY_LEDGER)
                .map_or(0, IdentityLedger::total_identities),
            live_fee_receipts: self.fees.live_receipts(),
            fees_collected: self.fees.treasury().collected,
            courses: self.enrollment.course_count(),
            live_enrollments: self.enrollment.live_enrollments(),
            completions: self.enrollment.total_completions(),
            reward_supply: self.rewards.total_supply(),
            pooled_rewards: self.rewards.pooled_count(),
        }
    }

    /// Takes the events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    /// BLAKE3 of the bincode encoding of the persisted state, hex encoded.
    /// Two stores with equal digests are byte-identical.
    pub fn state_digest(&self) -> bincode::Result<String> {
        let bytes = bincode::serialize(self)?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}

fn lookup(
    ledgers: &BTreeMap<LedgerRef, IdentityLedger>,
    ledger: LedgerRef,
) -> LedgerResult<&IdentityLedger> {
    ledgers
        .get(&ledger)
        .ok_or_else(|| LedgerError::not_found("identity ledger", ledger))
}

fn lookup_mut(
    ledgers: &mut BTreeMap<LedgerRef, IdentityLedger>,
    ledger: LedgerRef,
) -> LedgerResult<&mut IdentityLedger> {
    ledgers
        .get_mut(&ledger)
        .ok_or_else(|| LedgerError::not_found("identity ledger", ledger))
}

fn grant_event(holder: &Address, grant: RewardGrant) -> LedgerEvent {
    match grant.kind {
        GrantKind::Minted => LedgerEvent::RewardMinted {
            holder: holder.clone(),
            token_id: grant.token_id,
        },
        GrantKind::Reused => LedgerEvent::RewardReused {
            holder: holder.clone(),
            token_id: grant.token_id,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
