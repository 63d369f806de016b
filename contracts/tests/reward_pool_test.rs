//! Integration tests for reward minting, recycling and transfers through
//! the composed store.

use campus_contracts::reward_pool::{GrantKind, RewardGrant};
use campus_contracts::Campus;
use campus_protocol::error::ErrorKind;
use campus_protocol::types::Address;

const ADMIN: &str = "0xadmin";

fn addr(s: &str) -> Address {
    Address::from(s)
}

/// Campus where every listed holder owns an identity.
fn campus_with(holders: &[&str]) -> Campus {
    let mut c = Campus::new(addr(ADMIN), addr("0xtreasury")).unwrap();
    for h in holders {
        c.mint_identity(&addr(ADMIN), &addr(h), "student", format!("ipfs://{h}"))
            .unwrap();
    }
    c
}

fn minted(token_id: u64) -> RewardGrant {
    RewardGrant {
        token_id,
        kind: GrantKind::Minted,
    }
}

fn reused(token_id: u64) -> RewardGrant {
    RewardGrant {
        token_id,
        kind: GrantKind::Reused,
    }
}

// ---------------------------------------------------------------------------
// Recycling
// ---------------------------------------------------------------------------

#[test]
fn used_token_is_reissued_without_advancing_counter() {
    let mut c = campus_with(&["0xa", "0xb"]);
    let admin = addr(ADMIN);

    let t = c.mint_reward(&admin, &addr("0xa")).unwrap().token_id;
    c.use_reward(&addr("0xa"), t).unwrap();
    assert_eq!(c.rewards().admin_tokens(), vec![t]);
    let counter = c.rewards().current_token_id();

    let grant = c.mint_reward(&admin, &addr("0xb")).unwrap();
    assert_eq!(grant, reused(t));
    assert_eq!(c.rewards().owner_of(t).unwrap(), &addr("0xb"));
    assert!(c.rewards().admin_tokens().is_empty());
    assert_eq!(c.rewards().current_token_id(), counter);
}

#[test]
fn pooled_tokens_are_reused_in_fifo_order() {
    let mut c = campus_with(&["0xa", "0xb"]);
    let admin = addr(ADMIN);
    let x = c.mint_reward(&admin, &addr("0xa")).unwrap().token_id;
    let y = c.mint_reward(&admin, &addr("0xa")).unwrap().token_id;

    c.use_reward(&addr("0xa"), x).unwrap();
    c.use_reward(&addr("0xa"), y).unwrap();

    assert_eq!(c.mint_reward(&admin, &addr("0xb")).unwrap(), reused(x));
    assert_eq!(c.mint_reward(&admin, &addr("0xb")).unwrap(), reused(y));
    assert_eq!(c.mint_reward(&admin, &addr("0xb")).unwrap(), minted(y + 1));
}

#[test]
fn batch_mint_drains_pool_before_minting() {
    let mut c = campus_with(&["0xa", "0xc"]);
    let admin = addr(ADMIN);
    let pooled = c.mint_reward(&admin, &addr("0xa")).unwrap().token_id;
    c.mint_reward(&admin, &addr("0xa")).unwrap();
    c.use_reward(&addr("0xa"), pooled).unwrap();
    let next_seq = c.rewards().current_token_id() + 1;

    let grants = c.mint_multiple_rewards(&admin, &addr("0xc"), 3).unwrap();
    assert_eq!(
        grants,
        vec![reused(pooled), minted(next_seq), minted(next_seq + 1)]
    );
    assert_eq!(c.rewards().balance_of(&addr("0xc")), 3);

    let names: Vec<_> = c
        .drain_events()
        .iter()
        .rev()
        .take(3)
        .map(|e| e.name())
        .collect();
    assert_eq!(names, vec!["reward_minted", "reward_minted", "reward_reused"]);
}

#[test]
fn batch_mint_of_zero_is_invalid_count() {
    let mut c = campus_with(&["0xa"]);
    let err = c
        .mint_multiple_rewards(&addr(ADMIN), &addr("0xa"), 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCount);
}

#[test]
fn mint_requires_recipient_identity() {
    let mut c = campus_with(&[]);
    let err = c.mint_reward(&addr(ADMIN), &addr("0xa")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingIdentity);
    assert_eq!(c.rewards().current_token_id(), 0);
}

#[test]
fn using_someone_elses_token_is_not_owner() {
    let mut c = campus_with(&["0xa", "0xb"]);
    let t = c.mint_reward(&addr(ADMIN), &addr("0xa")).unwrap().token_id;
    let err = c.use_reward(&addr("0xb"), t).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotOwner);
    assert!(c.rewards().admin_tokens().is_empty());
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[test]
fn transfer_to_student_without_identity_rejected() {
    let mut c = campus_with(&["0xa"]);
    let a = addr("0xa");
    let t = c.mint_reward(&addr(ADMIN), &a).unwrap().token_id;
    let err = c.transfer_from(&a, &a, &addr("0xnobody"), t).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecipientMissingIdentity);
    assert_eq!(c.rewards().owner_of(t).unwrap(), &a);
}

#[test]
fn approved_operator_can_move_tokens() {
    let mut c = campus_with(&["0xa", "0xb"]);
    let a = addr("0xa");
    let market = addr("0xmarket");
    let t = c.mint_reward(&addr(ADMIN), &a).unwrap().token_id;

    c.set_approval_for_all(&a, &market, true).unwrap();
    assert!(c.rewards().is_approved_for_all(&a, &market));
    c.transfer_from(&market, &a, &addr("0xb"), t).unwrap();
    assert_eq!(c.rewards().owner_of(t).unwrap(), &addr("0xb"));
}

#[test]
fn single_token_approval_cleared_after_transfer() {
    let mut c = campus_with(&["0xa", "0xb"]);
    let a = addr("0xa");
    let b = addr("0xb");
    let t = c.mint_reward(&addr(ADMIN), &a).unwrap().token_id;

    c.approve(&a, &b, t).unwrap();
    assert_eq!(c.rewards().get_approved(t).unwrap(), Some(&b));
    c.transfer_from(&b, &a, &b, t).unwrap();
    assert_eq!(c.rewards().get_approved(t).unwrap(), None);
}

/// Only `use_reward` feeds the recycle queue. A plain transfer to the
/// administrator leaves the token out of the pool.
#[test]
fn direct_transfer_to_admin_does_not_enqueue() {
    let mut c = campus_with(&["0xa", "0xb"]);
    let admin = addr(ADMIN);
    let a = addr("0xa");
    let t = c.mint_reward(&admin, &a).unwrap().token_id;

    c.transfer_from(&a, &a, &admin, t).unwrap();
    assert_eq!(c.rewards().owner_of(t).unwrap(), &admin);
    assert!(c.rewards().admin_tokens().is_empty());

    let next = c.mint_reward(&admin, &addr("0xb")).unwrap();
    assert_eq!(next, minted(t + 1));
}

#[test]
fn recycle_queue_only_holds_admin_owned_ids() {
    let mut c = campus_with(&["0xa", "0xb"]);
    let admin = addr(ADMIN);
    let a = addr("0xa");
    let grants = c.mint_multiple_rewards(&admin, &a, 4).unwrap();
    for g in &grants[..3] {
        c.use_reward(&a, g.token_id).unwrap();
    }
    // The administrator hands a pooled token out directly.
    c.transfer_from(&admin, &admin, &addr("0xb"), grants[1].token_id)
        .unwrap();

    assert_eq!(
        c.rewards().admin_tokens(),
        vec![grants[0].token_id, grants[2].token_id]
    );
    for id in c.rewards().admin_tokens() {
        assert_eq!(c.rewards().owner_of(id).unwrap(), &admin);
    }
    assert!(c.rewards().pool_is_consistent());
}

#[test]
fn rejected_reward_calls_leave_state_unchanged() {
    let mut c = campus_with(&["0xa"]);
    let a = addr("0xa");
    let t = c.mint_reward(&addr(ADMIN), &a).unwrap().token_id;
    c.drain_events();
    let before = c.state_digest().unwrap();

    assert!(c.use_reward(&addr("0xb"), t).is_err());
    assert!(c.transfer_from(&a, &a, &addr("0xnobody"), t).is_err());
    assert!(c.mint_reward(&a, &a).is_err());
    assert!(c.use_reward(&a, 99).is_err());

    assert_eq!(c.state_digest().unwrap(), before);
    assert!(c.drain_events().is_empty());
}
