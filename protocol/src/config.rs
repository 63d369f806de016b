//! # Ledger Constants
//!
//! Every fixed number the campus ledger depends on lives here. Grade bounds,
//! sequence starts, default ports. If a ledger module hardcodes one of these
//! inline, move it here.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Version of the ledger rules. Bump when an operation's observable
/// behavior changes (check order, error kind, event shape).
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Prefix of every JSON-RPC method name served by a campus node.
pub const RPC_METHOD_PREFIX: &str = "campus_";

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// The null account. Never a valid holder, recipient or administrator.
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// First id issued by every credential sequence. Id 0 is reserved to mean
/// "none" (see the fee ledger's active receipt pointer).
pub const FIRST_CREDENTIAL_ID: u64 = 1;

/// Role stamped on identity credentials minted without an explicit role.
pub const DEFAULT_ROLE: &str = "student";

/// Lowest grade accepted by `submit_grade`.
pub const MIN_GRADE: u8 = 0;

/// Highest grade accepted by `submit_grade`. Grades are whole numbers.
pub const MAX_GRADE: u8 = 10;

/// Most reward tokens a single `mint_multiple_rewards` call may grant.
pub const MAX_BATCH_MINT: u32 = 100;

/// Id of the identity ledger instance created at genesis.
pub const PRIMARY_IDENTITY_LEDGER: u64 = 1;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the JSON-RPC / REST / WebSocket gateway.
pub const DEFAULT_RPC_PORT: u16 = 8645;

/// Default port for the Prometheus exporter.
pub const DEFAULT_METRICS_PORT: u16 = 8646;

/// Capacity of the event broadcast channel feeding WebSocket subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Name of the sled tree holding ledger snapshots.
pub const SNAPSHOT_TREE: &str = "snapshots";

/// Key under which the current ledger snapshot is stored.
pub const SNAPSHOT_KEY: &[u8] = b"campus";
