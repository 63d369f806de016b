//! # Reward Pool
//!
//! Transferable reward tokens with a recycling queue.
//!
//! Spent rewards are not burned. `use_reward` hands the token back to the
//! administrator and appends its id to the recycle queue; the next mint pops
//! the oldest queued id before any new id is minted. Fresh ids come from a
//! monotonic counter, so an id is never issued twice and never lost.
//!
//! ## Queue Invariant
//!
//! Every queued id is owned by the administrator and appears once, in the
//! order it was deposited. Only `use_reward` enqueues. A plain
//! `transfer_from` to the administrator changes ownership without queueing,
//! and a queued token the administrator transfers out leaves the queue in
//! the same step.
//!
//! ## Access Points
//!
//! The pool also keeps the administrator-managed list of campus locations
//! (mess, gymkhana, library, ...) where rewards are spent, each with the
//! receiving account and the cost in tokens.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use campus_protocol::config::{MAX_BATCH_MINT, PRIMARY_IDENTITY_LEDGER};
use campus_protocol::error::{LedgerError, LedgerResult};
use campus_protocol::types::{Address, LedgerRef, TokenId};

use crate::capability::IdentityView;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a minted reward was sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    /// A new sequential id.
    Minted,
    /// An id popped from the recycle queue.
    Reused,
}

/// One token handed out by `mint_reward` / `mint_multiple_rewards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardGrant {
    pub token_id: TokenId,
    pub kind: GrantKind,
}

/// A campus location that accepts reward tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub location: String,
    /// Account that receives tokens spent here.
    pub account: Address,
    /// Tokens charged per access.
    pub cost: u64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPool {
    admin: Address,
    owners: BTreeMap<TokenId, Address>,
    balances: BTreeMap<Address, u64>,
    /// Recycle queue, oldest deposit at the front.
    pool: VecDeque<TokenId>,
    /// Highest id minted so far; 0 before the first mint.
    current_token_id: TokenId,
    token_approvals: BTreeMap<TokenId, Address>,
    operators: BTreeMap<Address, BTreeSet<Address>>,
    /// Identity ledger instance consulted for eligibility.
    identity_ledger: LedgerRef,
    access_points: BTreeMap<String, AccessPoint>,
}

impl RewardPool {
    /// Creates an empty pool owned by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            owners: BTreeMap::new(),
            balances: BTreeMap::new(),
            pool: VecDeque::new(),
            current_token_id: 0,
            token_approvals: BTreeMap::new(),
            operators: BTreeMap::new(),
            identity_ledger: PRIMARY_IDENTITY_LEDGER,
            access_points: BTreeMap::new(),
        }
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    // -- Minting ------------------------------------------------------------

    /// Gives `holder` one reward, reusing the oldest pooled id if any.
    pub fn mint_reward(
        &mut self,
        identity: &impl IdentityView,
        holder: &Address,
    ) -> LedgerResult<RewardGrant> {
        self.check_mint(identity, holder, 1)?;
        Ok(self.grant_one(holder))
    }

    /// Gives `holder` `count` rewards, `1..=MAX_BATCH_MINT`. Pooled ids are
    /// used first, oldest first, then new sequential ids cover the remainder.
    pub fn mint_multiple_rewards(
        &mut self,
        identity: &impl IdentityView,
        holder: &Address,
        count: u32,
    ) -> LedgerResult<Vec<RewardGrant>> {
        self.check_mint(identity, holder, count)?;
        Ok((0..count).map(|_| self.grant_one(holder)).collect())
    }

    fn check_mint(
        &self,
        identity: &impl IdentityView,
        holder: &Address,
        count: u32,
    ) -> LedgerResult<()> {
        if holder.is_null() {
            return Err(LedgerError::InvalidAddress("student"));
        }
        if count == 0 || count > MAX_BATCH_MINT {
            return Err(LedgerError::InvalidCount);
        }
        if !identity.has_live_identity(holder) {
            return Err(LedgerError::MissingIdentity(holder.clone()));
        }
        Ok(())
    }

    fn grant_one(&mut self, holder: &Address) -> RewardGrant {
        match self.pool.pop_front() {
            Some(token_id) => {
                self.move_token(token_id, holder);
                RewardGrant {
                    token_id,
                    kind: GrantKind::Reused,
                }
            }
            None => {
                self.current_token_id += 1;
                let token_id = self.current_token_id;
                self.owners.insert(token_id, holder.clone());
                *self.balances.entry(holder.clone()).or_insert(0) += 1;
                RewardGrant {
                    token_id,
                    kind: GrantKind::Minted,
                }
            }
        }
    }

    // -- Spending & transfers -----------------------------------------------

    /// Spends `token_id`: ownership returns to the administrator and the id
    /// joins the tail of the recycle queue.
    ///
    /// The administrator may deposit a token it already owns (for example
    /// one it received by plain transfer), but not one that is queued.
    pub fn use_reward(&mut self, caller: &Address, token_id: TokenId) -> LedgerResult<()> {
        let owner = self.owner_of(token_id)?;
        if owner != caller {
            return Err(LedgerError::NotOwner {
                caller: caller.clone(),
                token_id,
            });
        }
        if self.pool.contains(&token_id) {
            return Err(LedgerError::AlreadyPooled(token_id));
        }

        let admin = self.admin.clone();
        self.move_token(token_id, &admin);
        self.pool.push_back(token_id);
        Ok(())
    }

    /// Moves `token_id` from `from` to `to` on behalf of `caller`.
    ///
    /// `caller` must be the owner, the token's approved account, or an
    /// operator for the owner. Any recipient other than the administrator
    /// must own a live identity. Transfers never enqueue; a queued token
    /// leaving the administrator is dropped from the queue.
    pub fn transfer_from(
        &mut self,
        identity: &impl IdentityView,
        caller: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> LedgerResult<()> {
        let owner = self.owner_of(token_id)?.clone();
        if to.is_null() {
            return Err(LedgerError::InvalidAddress("recipient"));
        }
        if &owner != from {
            return Err(LedgerError::NotOwner {
                caller: from.clone(),
                token_id,
            });
        }
        if !self.is_approved_or_owner(caller, &owner, token_id) {
            return Err(LedgerError::NotOwner {
                caller: caller.clone(),
                token_id,
            });
        }
        if to != &self.admin && !identity.has_live_identity(to) {
            return Err(LedgerError::RecipientMissingIdentity(to.clone()));
        }

        if owner == self.admin {
            self.pool.retain(|id| *id != token_id);
        }
        self.move_token(token_id, to);
        Ok(())
    }

    /// Approves `approved` to transfer `token_id`. The null address clears
    /// the approval.
    pub fn approve(
        &mut self,
        caller: &Address,
        approved: &Address,
        token_id: TokenId,
    ) -> LedgerResult<()> {
        let owner = self.owner_of(token_id)?.clone();
        if caller != &owner && !self.is_approved_for_all(&owner, caller) {
            return Err(LedgerError::NotOwner {
                caller: caller.clone(),
                token_id,
            });
        }
        if approved.is_null() {
            self.token_approvals.remove(&token_id);
        } else {
            self.token_approvals.insert(token_id, approved.clone());
        }
        Ok(())
    }

    /// Grants or revokes `operator` over all of `caller`'s tokens.
    pub fn set_approval_for_all(
        &mut self,
        caller: &Address,
        operator: &Address,
        approved: bool,
    ) -> LedgerResult<()> {
        if operator.is_null() || operator == caller {
            return Err(LedgerError::InvalidAddress("operator"));
        }
        if approved {
            self.operators
                .entry(caller.clone())
                .or_default()
                .insert(operator.clone());
        } else if let Some(set) = self.operators.get_mut(caller) {
            set.remove(operator);
            if set.is_empty() {
                self.operators.remove(caller);
            }
        }
        Ok(())
    }

    /// Switches the identity ledger instance used for eligibility.
    /// Existing ownership is untouched.
    pub fn set_identity_ledger(&mut self, ledger: LedgerRef) {
        self.identity_ledger = ledger;
    }

    fn is_approved_or_owner(&self, caller: &Address, owner: &Address, token_id: TokenId) -> bool {
        caller == owner
            || self.token_approvals.get(&token_id) == Some(caller)
            || self.is_approved_for_all(owner, caller)
    }

    /// Reassigns ownership and clears the token's approval. Caller has
    /// already validated everything.
    fn move_token(&mut self, token_id: TokenId, to: &Address) {
        if let Some(previous) = self.owners.insert(token_id, to.clone()) {
            if let Some(balance) = self.balances.get_mut(&previous) {
                *balance = balance.saturating_sub(1);
                if *balance == 0 {
                    self.balances.remove(&previous);
                }
            }
        }
        *self.balances.entry(to.clone()).or_insert(0) += 1;
        self.token_approvals.remove(&token_id);
    }

    // -- Reads --------------------------------------------------------------

    pub fn owner_of(&self, token_id: TokenId) -> LedgerResult<&Address> {
        self.owners
            .get(&token_id)
            .ok_or_else(|| LedgerError::not_found("reward token", token_id))
    }

    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn get_approved(&self, token_id: TokenId) -> LedgerResult<Option<&Address>> {
        self.owner_of(token_id)?;
        Ok(self.token_approvals.get(&token_id))
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operators
            .get(owner)
            .map(|set| set.contains(operator))
            .unwrap_or(false)
    }

    /// Recycle queue contents in deposit order.
    pub fn admin_tokens(&self) -> Vec<TokenId> {
        self.pool.iter().copied().collect()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// Highest id ever minted. Reuse does not move it.
    pub fn current_token_id(&self) -> TokenId {
        self.current_token_id
    }

    pub fn total_supply(&self) -> usize {
        self.owners.len()
    }

    pub fn identity_ledger(&self) -> LedgerRef {
        self.identity_ledger
    }

    /// True when every queued id is admin-owned and queued once.
    pub fn pool_is_consistent(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.pool
            .iter()
            .all(|id| seen.insert(*id) && self.owners.get(id) == Some(&self.admin))
    }

    // -- Access points ------------------------------------------------------

    pub fn add_access_point(
        &mut self,
        location: &str,
        account: &Address,
        cost: u64,
    ) -> LedgerResult<()> {
        validate_access_point(location, account, cost)?;
        if self.access_points.contains_key(location) {
            return Err(LedgerError::DuplicateAccessPoint(location.to_string()));
        }
        self.access_points.insert(
            location.to_string(),
            AccessPoint {
                location: location.to_string(),
                account: account.clone(),
                cost,
                active: true,
            },
        );
        Ok(())
    }

    /// Replaces account and cost and reactivates the point.
    pub fn update_access_point(
        &mut self,
        location: &str,
        account: &Address,
        cost: u64,
    ) -> LedgerResult<()> {
        self.access_point(location)?;
        validate_access_point(location, account, cost)?;
        if let Some(point) = self.access_points.get_mut(location) {
            point.account = account.clone();
            point.cost = cost;
            point.active = true;
        }
        Ok(())
    }

    pub fn deactivate_access_point(&mut self, location: &str) -> LedgerResult<()> {
        self.access_points
            .get_mut(location)
            .ok_or_else(|| LedgerError::not_found("access point", location))?
            .active = false;
        Ok(())
    }

    pub fn access_point(&self, location: &str) -> LedgerResult<&AccessPoint> {
        self.access_points
            .get(location)
            .ok_or_else(|| LedgerError::not_found("access point", location))
    }

    pub fn access_points(&self) -> impl Iterator<Item = &AccessPoint> {
        self.access_points.values()
    }
}

fn validate_access_point(location: &str, account: &Address, cost: u64) -> LedgerResult<()> {
    let reason = if location.trim().is_empty() {
        "location cannot be empty"
    } else if account.is_null() {
        "account cannot be the null address"
    } else if cost == 0 {
        "cost must be greater than 0"
    } else {
        return Ok(());
    };
    Err(LedgerError::InvalidAccessPoint {
        reason: reason.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::fixtures::Allow;
    use campus_protocol::error::ErrorKind;

    const ADMIN: &str = "0xadmin";

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn pool() -> RewardPool {
        RewardPool::new(addr(ADMIN))
    }

    fn students() -> Allow {
        Allow::of(&["0xa", "0xb", "0xc"])
    }

    #[test]
    fn fresh_mints_are_sequential() {
        let ids = students();
        let mut rewards = pool();
        let first = rewards.mint_reward(&ids, &addr("0xa")).unwrap();
        let second = rewards.mint_reward(&ids, &addr("0xb")).unwrap();
        assert_eq!(first, RewardGrant { token_id: 1, kind: GrantKind::Minted });
        assert_eq!(second, RewardGrant { token_id: 2, kind: GrantKind::Minted });
        assert_eq!(rewards.current_token_id(), 2);
        assert_eq!(rewards.balance_of(&addr("0xa")), 1);
    }

    #[test]
    fn mint_requires_identity_and_positive_count() {
        let ids = students();
        let mut rewards = pool();
        assert_eq!(
            rewards.mint_reward(&ids, &addr("0xz")).unwrap_err().kind(),
            ErrorKind::MissingIdentity
        );
        assert_eq!(
            rewards.mint_reward(&ids, &Address::null()).unwrap_err().kind(),
            ErrorKind::InvalidAddress
        );
        assert_eq!(
            rewards
                .mint_multiple_rewards(&ids, &addr("0xa"), 0)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidCount
        );
        assert_eq!(rewards.current_token_id(), 0);
    }

    #[test]
    fn batch_size_is_capped() {
        let ids = students();
        let mut rewards = pool();
        let granted = rewards
            .mint_multiple_rewards(&ids, &addr("0xa"), MAX_BATCH_MINT)
            .unwrap();
        assert_eq!(granted.len(), MAX_BATCH_MINT as usize);

        let err = rewards
            .mint_multiple_rewards(&ids, &addr("0xa"), MAX_BATCH_MINT + 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCount);
        assert_eq!(
            rewards
                .mint_multiple_rewards(&ids, &addr("0xa"), u32::MAX)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidCount
        );
        assert_eq!(rewards.current_token_id(), u64::from(MAX_BATCH_MINT));
        assert_eq!(rewards.balance_of(&addr("0xa")), u64::from(MAX_BATCH_MINT));
    }

    #[test]
    fn use_then_mint_reuses_same_id() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards.use_reward(&addr("0xa"), t).unwrap();
        assert_eq!(rewards.owner_of(t).unwrap(), &addr(ADMIN));
        assert_eq!(rewards.admin_tokens(), vec![t]);

        let before = rewards.current_token_id();
        let grant = rewards.mint_reward(&ids, &addr("0xb")).unwrap();
        assert_eq!(grant, RewardGrant { token_id: t, kind: GrantKind::Reused });
        assert_eq!(rewards.owner_of(t).unwrap(), &addr("0xb"));
        assert!(rewards.admin_tokens().is_empty());
        assert_eq!(rewards.current_token_id(), before);
    }

    #[test]
    fn recycle_queue_is_fifo() {
        let ids = students();
        let mut rewards = pool();
        let x = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        let y = rewards.mint_reward(&ids, &addr("0xb")).unwrap().token_id;
        rewards.use_reward(&addr("0xa"), x).unwrap();
        rewards.use_reward(&addr("0xb"), y).unwrap();
        assert_eq!(rewards.admin_tokens(), vec![x, y]);

        assert_eq!(rewards.mint_reward(&ids, &addr("0xc")).unwrap().token_id, x);
        assert_eq!(rewards.mint_reward(&ids, &addr("0xc")).unwrap().token_id, y);
        let fresh = rewards.mint_reward(&ids, &addr("0xc")).unwrap();
        assert_eq!(fresh.kind, GrantKind::Minted);
        assert_eq!(fresh.token_id, 3);
    }

    #[test]
    fn batch_mint_uses_pool_before_new_ids() {
        let ids = students();
        let mut rewards = pool();
        let pooled = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards.mint_reward(&ids, &addr("0xa")).unwrap();
        rewards.use_reward(&addr("0xa"), pooled).unwrap();
        let next = rewards.current_token_id() + 1;

        let grants = rewards.mint_multiple_rewards(&ids, &addr("0xc"), 3).unwrap();
        assert_eq!(
            grants,
            vec![
                RewardGrant { token_id: pooled, kind: GrantKind::Reused },
                RewardGrant { token_id: next, kind: GrantKind::Minted },
                RewardGrant { token_id: next + 1, kind: GrantKind::Minted },
            ]
        );
        assert_eq!(rewards.balance_of(&addr("0xc")), 3);
    }

    #[test]
    fn only_owner_can_use_reward() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        let err = rewards.use_reward(&addr("0xb"), t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotOwner);
        assert_eq!(
            rewards.use_reward(&addr("0xa"), 99).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn admin_cannot_deposit_a_queued_token_twice() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards.use_reward(&addr("0xa"), t).unwrap();
        let err = rewards.use_reward(&addr(ADMIN), t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyPooled);
        assert_eq!(rewards.admin_tokens(), vec![t]);
    }

    #[test]
    fn direct_transfer_to_admin_is_not_recycled() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards
            .transfer_from(&ids, &addr("0xa"), &addr("0xa"), &addr(ADMIN), t)
            .unwrap();
        assert_eq!(rewards.owner_of(t).unwrap(), &addr(ADMIN));
        assert!(rewards.admin_tokens().is_empty());

        // Depositing it explicitly queues it.
        rewards.use_reward(&addr(ADMIN), t).unwrap();
        assert_eq!(rewards.admin_tokens(), vec![t]);
        assert!(rewards.pool_is_consistent());
    }

    #[test]
    fn admin_transfer_out_removes_from_queue() {
        let ids = students();
        let mut rewards = pool();
        let x = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        let y = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards.use_reward(&addr("0xa"), x).unwrap();
        rewards.use_reward(&addr("0xa"), y).unwrap();

        rewards
            .transfer_from(&ids, &addr(ADMIN), &addr(ADMIN), &addr("0xb"), x)
            .unwrap();
        assert_eq!(rewards.admin_tokens(), vec![y]);
        assert!(rewards.pool_is_consistent());
        assert_eq!(rewards.mint_reward(&ids, &addr("0xc")).unwrap().token_id, y);
    }

    #[test]
    fn transfer_to_non_identity_rejected() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        let err = rewards
            .transfer_from(&ids, &addr("0xa"), &addr("0xa"), &addr("0xz"), t)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecipientMissingIdentity);
        assert_eq!(rewards.owner_of(t).unwrap(), &addr("0xa"));
    }

    #[test]
    fn stranger_cannot_transfer() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        let err = rewards
            .transfer_from(&ids, &addr("0xb"), &addr("0xa"), &addr("0xb"), t)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotOwner);

        let err = rewards
            .transfer_from(&ids, &addr("0xb"), &addr("0xb"), &addr("0xc"), t)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotOwner);
    }

    #[test]
    fn approved_account_can_transfer_once() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards.approve(&addr("0xa"), &addr("0xb"), t).unwrap();
        assert_eq!(rewards.get_approved(t).unwrap(), Some(&addr("0xb")));

        rewards
            .transfer_from(&ids, &addr("0xb"), &addr("0xa"), &addr("0xc"), t)
            .unwrap();
        assert_eq!(rewards.owner_of(t).unwrap(), &addr("0xc"));
        assert_eq!(rewards.get_approved(t).unwrap(), None);
    }

    #[test]
    fn operator_can_transfer_and_approve() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards.set_approval_for_all(&addr("0xa"), &addr("0xm"), true).unwrap();
        assert!(rewards.is_approved_for_all(&addr("0xa"), &addr("0xm")));

        rewards.approve(&addr("0xm"), &addr("0xb"), t).unwrap();
        rewards
            .transfer_from(&ids, &addr("0xm"), &addr("0xa"), &addr("0xb"), t)
            .unwrap();
        assert_eq!(rewards.owner_of(t).unwrap(), &addr("0xb"));

        rewards.set_approval_for_all(&addr("0xa"), &addr("0xm"), false).unwrap();
        assert!(!rewards.is_approved_for_all(&addr("0xa"), &addr("0xm")));
    }

    #[test]
    fn self_operator_rejected() {
        let mut rewards = pool();
        let err = rewards
            .set_approval_for_all(&addr("0xa"), &addr("0xa"), true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    }

    #[test]
    fn identity_ledger_switch_keeps_ownership() {
        let ids = students();
        let mut rewards = pool();
        let t = rewards.mint_reward(&ids, &addr("0xa")).unwrap().token_id;
        rewards.set_identity_ledger(2);
        assert_eq!(rewards.identity_ledger(), 2);
        assert_eq!(rewards.owner_of(t).unwrap(), &addr("0xa"));
    }

    #[test]
    fn access_point_lifecycle() {
        let mut rewards = pool();
        rewards.add_access_point("Mess", &addr("0xmess"), 2).unwrap();
        assert_eq!(
            rewards
                .add_access_point("Mess", &addr("0xmess"), 2)
                .unwrap_err()
                .kind(),
            ErrorKind::DuplicateAccessPoint
        );

        rewards.deactivate_access_point("Mess").unwrap();
        assert!(!rewards.access_point("Mess").unwrap().active);

        rewards.update_access_point("Mess", &addr("0xmess2"), 3).unwrap();
        let point = rewards.access_point("Mess").unwrap();
        assert!(point.active);
        assert_eq!(point.cost, 3);
        assert_eq!(point.account, addr("0xmess2"));
        assert_eq!(rewards.access_points().count(), 1);
    }

    #[test]
    fn invalid_access_points_rejected() {
        let mut rewards = pool();
        for (loc, account, cost) in [("", "0xm", 1), ("Gym", "", 1), ("Gym", "0xm", 0)] {
            let err = rewards
                .add_access_point(loc, &addr(account), cost)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAccessPoint);
        }
        assert_eq!(
            rewards
                .update_access_point("Library", &addr("0xl"), 1)
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            rewards.deactivate_access_point("Library").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
