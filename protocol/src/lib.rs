// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Campus Protocol — Shared Library
//!
//! The vocabulary every part of the campus ledger speaks: addresses and ids,
//! the error taxonomy, emitted events, the JSON-RPC wire types, the metadata
//! resolver seam and the snapshot store.
//!
//! The ledgers themselves live in `campus-contracts`; the process that serves
//! them lives in `campus-node`. Nothing in this crate holds ledger state.
//!
//! ## Modules
//!
//! - **config** — Grade bounds, sequence starts, default ports.
//! - **types** — `Address` and the id aliases.
//! - **error** — `LedgerError` and its wire-stable `ErrorKind`.
//! - **event** — `LedgerEvent`, emitted by every successful mutation.
//! - **rpc** — JSON-RPC method names, envelopes and typed params.
//! - **metadata** — Async resolution of opaque metadata references.
//! - **storage** — sled-backed snapshot persistence.

pub mod config;
pub mod error;
pub mod event;
pub mod metadata;
pub mod rpc;
pub mod storage;
pub mod types;

pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use event::LedgerEvent;
pub use types::Address;
