//! # JSON-RPC, REST and WebSocket API
//!
//! Builds the axum router that exposes the campus ledger. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                 | Description                          |
//! |--------|----------------------|--------------------------------------|
//! | GET    | `/health`            | Liveness probe                       |
//! | GET    | `/status`            | Admin, counters and state digest     |
//! | POST   | `/rpc`               | JSON-RPC 2.0 gateway (`campus_*`)    |
//! | GET    | `/ws`                | WebSocket stream of ledger events    |
//! | GET    | `/courses`           | Course catalog                       |
//! | GET    | `/courses/:id`       | One course                           |
//! | GET    | `/holders/:address`  | Identity, fee and reward summary     |
//! | GET    | `/rewards/pool`      | Recycle queue and token counter      |
//!
//! ## Concurrency
//!
//! The [`Campus`] sits behind one `tokio::sync::RwLock`. A mutating call
//! holds the write guard for the whole operation: it applies the change to
//! a copy, persists the copy, swaps it in and fans the drained events out.
//! If persistence fails the live state is left untouched. Reads share the
//! read guard. The amenity check resolves metadata after its read guard is
//! released.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use campus_contracts::amenity::check_amenity_access;
use campus_contracts::campus::{Campus, CampusStats};
use campus_contracts::capability::FeeView;
use campus_contracts::fee_ledger::FeeReceipt;
use campus_protocol::error::{ErrorKind, LedgerError};
use campus_protocol::event::LedgerEvent;
use campus_protocol::metadata::MetadataResolver;
use campus_protocol::rpc::*;
use campus_protocol::storage::LedgerStore;
use campus_protocol::types::{Address, CourseId, CredentialId, TokenId};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything is behind `Arc` or is a handle.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The ledger. Single writer, many readers.
    pub campus: Arc<RwLock<Campus>>,
    /// Snapshot store written after every applied mutation.
    pub store: LedgerStore,
    /// Broadcast channel for live ledger events.
    pub event_tx: broadcast::Sender<LedgerEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Resolves receipt metadata for the amenity check.
    pub resolver: Arc<dyn MetadataResolver>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .route("/courses", get(courses_handler))
        .route("/courses/:id", get(course_handler))
        .route("/holders/:address", get(holder_handler))
        .route("/rewards/pool", get(reward_pool_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: String,
    pub admin: Address,
    /// BLAKE3 digest of the persisted ledger state.
    pub state_digest: String,
    pub stats: CampusStats,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /holders/:address`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderSummary {
    pub address: Address,
    pub identity_id: Option<CredentialId>,
    pub role: Option<String>,
    pub fee_receipt: Option<FeeReceipt>,
    pub enrolled_courses: u64,
    pub reward_balance: u64,
}

/// Response payload for `GET /rewards/pool`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardPoolResponse {
    pub admin_tokens: Vec<TokenId>,
    pub current_token_id: TokenId,
    pub total_supply: usize,
    pub identity_ledger: u64,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

fn ledger_error_response(err: &LedgerError) -> Response {
    let status = match err.kind() {
        ErrorKind::NotFound | ErrorKind::CourseNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    let body = ErrorResponse {
        error: err.to_string(),
        kind: Some(err.kind()),
    };
    (status, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// REST Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — ledger summary and state digest.
async fn status_handler(State(state): State<AppState>) -> Response {
    let campus = state.campus.read().await;
    let state_digest = match campus.state_digest() {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("failed to compute state digest: {}", e);
            let body = ErrorResponse {
                error: format!("state digest unavailable: {e}"),
                kind: None,
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };
    Json(StatusResponse {
        version: state.version.clone(),
        admin: campus.admin().clone(),
        state_digest,
        stats: campus.stats(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
    .into_response()
}

/// `GET /courses` — the whole catalog, in id order.
async fn courses_handler(State(state): State<AppState>) -> impl IntoResponse {
    let campus = state.campus.read().await;
    Json(campus.enrollment().courses().to_vec())
}

/// `GET /courses/:id` — one course, 404 if unknown.
async fn course_handler(Path(id): Path<CourseId>, State(state): State<AppState>) -> Response {
    let campus = state.campus.read().await;
    match campus.enrollment().course(id) {
        Ok(course) => Json(course.clone()).into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

/// `GET /holders/:address` — what the ledgers know about one address.
/// Unknown addresses get an empty summary.
async fn holder_handler(Path(address): Path<String>, State(state): State<AppState>) -> Response {
    let address = Address::new(address);
    let campus = state.campus.read().await;
    let identity = match campus.primary_identity() {
        Ok(ids) => ids,
        Err(e) => return ledger_error_response(&e),
    };
    let identity_id = identity.identity_of(&address);
    let role = identity_id
        .and_then(|id| identity.role_of(id).ok())
        .map(str::to_string);

    Json(HolderSummary {
        identity_id,
        role,
        fee_receipt: campus.fees().active_receipt(&address).cloned(),
        enrolled_courses: campus.enrollment().student_course_count(&address),
        reward_balance: campus.rewards().balance_of(&address),
        address,
    })
    .into_response()
}

/// `GET /rewards/pool` — recycle queue in deposit order.
async fn reward_pool_handler(State(state): State<AppState>) -> impl IntoResponse {
    let campus = state.campus.read().await;
    let rewards = campus.rewards();
    Json(RewardPoolResponse {
        admin_tokens: rewards.admin_tokens(),
        current_token_id: rewards.current_token_id(),
        total_supply: rewards.total_supply(),
        identity_ledger: rewards.identity_ledger(),
    })
}

// ---------------------------------------------------------------------------
// JSON-RPC Gateway
// ---------------------------------------------------------------------------

/// `POST /rpc` — JSON-RPC 2.0 gateway.
///
/// Unknown methods return `-32601`, malformed params `-32602`, ledger
/// rejections their per-kind code with `data.kind` set.
async fn rpc_handler(State(state): State<AppState>, Json(req): Json<RpcRequest>) -> Json<RpcResponse> {
    state.metrics.rpc_requests_total.inc();
    let _timer = state.metrics.rpc_latency_seconds.start_timer();

    if req.jsonrpc != "2.0" {
        state.metrics.rpc_errors_total.inc();
        return Json(RpcResponse::error(
            req.id,
            RpcError::invalid_request("Invalid Request: jsonrpc must be \"2.0\""),
        ));
    }

    let outcome = match RpcMethod::from_name(&req.method) {
        Some(method) => dispatch(&state, method, req.params).await,
        None => Err(RpcError::method_not_found(&req.method)),
    };

    match outcome {
        Ok(result) => Json(RpcResponse::success(req.id, result)),
        Err(error) => {
            state.metrics.rpc_errors_total.inc();
            tracing::debug!(method = %req.method, code = error.code, "rpc error: {}", error.message);
            Json(RpcResponse::error(req.id, error))
        }
    }
}

type RpcResult = Result<serde_json::Value, RpcError>;

async fn dispatch(state: &AppState, method: RpcMethod, params: serde_json::Value) -> RpcResult {
    if method.mutates() {
        return mutate(state, method, params).await;
    }
    if method == RpcMethod::CheckAmenityAccess {
        let p: AmenityParams = parse(params)?;
        let eligibility = state.campus.read().await.amenity_eligibility(&p.holder)?;
        let decision = check_amenity_access(eligibility, &p.amenity, state.resolver.as_ref()).await?;
        return to_json(decision);
    }
    let campus = state.campus.read().await;
    query(&campus, method, params)
}

/// Runs one mutation under the write guard. The change is applied to a
/// copy and only becomes live once the copy has been persisted.
///
/// Each write costs a full clone plus a full snapshot encode; the growth
/// any single call can add is bounded by `MAX_BATCH_MINT`.
// TODO: keep one sled tree per ledger so a write re-encodes only the
// ledgers it touched, and replace the clone with a per-ledger undo copy.
async fn mutate(state: &AppState, method: RpcMethod, params: serde_json::Value) -> RpcResult {
    let mut live = state.campus.write().await;
    let mut next = live.clone();
    let result = apply(&mut next, method, params)?;

    state.store.save(&next).map_err(|e| {
        tracing::error!(?method, "failed to persist ledger snapshot: {}", e);
        RpcError::internal_error(format!("snapshot write failed: {e}"))
    })?;

    let events = next.drain_events();
    *live = next;
    state.metrics.mutations_total.inc();
    state.metrics.observe(&live.stats());

    for event in events {
        tracing::debug!(event = event.name(), "ledger event");
        // No subscribers is not an error.
        let _ = state.event_tx.send(event);
    }
    Ok(result)
}

fn parse<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(format!("invalid params: {e}")))
}

fn to_json<T: Serialize>(value: T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(e.to_string()))
}

fn applied() -> RpcResult {
    Ok(serde_json::Value::Bool(true))
}

fn apply(campus: &mut Campus, method: RpcMethod, params: serde_json::Value) -> RpcResult {
    match method {
        // -- Identity -------------------------------------------------------
        RpcMethod::MintIdentity => {
            let p: MintIdentityParams = parse(params)?;
            let role = p.role.as_deref().unwrap_or("");
            to_json(campus.mint_identity_in(p.ledger, &p.caller, &p.holder, role, p.metadata_ref)?)
        }
        RpcMethod::BurnIdentity => {
            let p: BurnIdentityParams = parse(params)?;
            campus.burn_identity_in(p.ledger, &p.caller, p.id)?;
            applied()
        }
        RpcMethod::DeployIdentityLedger => {
            let p: CallerParams = parse(params)?;
            to_json(campus.deploy_identity_ledger(&p.caller)?)
        }

        // -- Fees -----------------------------------------------------------
        RpcMethod::PayFee => {
            let p: PayFeeParams = parse(params)?;
            to_json(campus.pay_fee(&p.holder, &p.semester, p.metadata_ref, p.amount)?)
        }

        // -- Courses --------------------------------------------------------
        RpcMethod::AddCourse => {
            let p: AddCourseParams = parse(params)?;
            to_json(campus.add_course(
                &p.caller,
                &p.name,
                &p.instructor,
                p.duration_weeks,
                p.credits,
            )?)
        }
        RpcMethod::UpdateCourse => {
            let p: UpdateCourseParams = parse(params)?;
            campus.update_course(
                &p.caller,
                p.course_id,
                &p.name,
                &p.instructor,
                p.duration_weeks,
                p.credits,
            )?;
            applied()
        }
        RpcMethod::ActivateCourse => {
            let p: CourseAdminParams = parse(params)?;
            campus.activate_course(&p.caller, p.course_id)?;
            applied()
        }
        RpcMethod::DeactivateCourse => {
            let p: CourseAdminParams = parse(params)?;
            campus.deactivate_course(&p.caller, p.course_id)?;
            applied()
        }
        RpcMethod::DeactivateAllCourses => {
            let p: CallerParams = parse(params)?;
            to_json(campus.deactivate_all_courses(&p.caller)?)
        }

        // -- Enrollment -----------------------------------------------------
        RpcMethod::Register => {
            let p: RegisterParams = parse(params)?;
            to_json(campus.register(&p.student, p.course_id, p.metadata_ref)?)
        }
        RpcMethod::SubmitGrade => {
            let p: SubmitGradeParams = parse(params)?;
            to_json(campus.submit_grade(&p.caller, &p.student, p.course_id, p.grade, p.metadata_ref)?)
        }

        // -- Rewards --------------------------------------------------------
        RpcMethod::MintReward => {
            let p: MintRewardParams = parse(params)?;
            to_json(campus.mint_reward(&p.caller, &p.holder)?)
        }
        RpcMethod::MintMultipleRewards => {
            let p: MintMultipleRewardsParams = parse(params)?;
            to_json(campus.mint_multiple_rewards(&p.caller, &p.holder, p.count)?)
        }
        RpcMethod::UseReward => {
            let p: UseRewardParams = parse(params)?;
            campus.use_reward(&p.caller, p.token_id)?;
            applied()
        }
        RpcMethod::TransferFrom => {
            let p: TransferFromParams = parse(params)?;
            campus.transfer_from(&p.caller, &p.from, &p.to, p.token_id)?;
            applied()
        }
        RpcMethod::Approve => {
            let p: ApproveParams = parse(params)?;
            campus.approve(&p.caller, &p.approved, p.token_id)?;
            applied()
        }
        RpcMethod::SetApprovalForAll => {
            let p: SetApprovalForAllParams = parse(params)?;
            campus.set_approval_for_all(&p.caller, &p.operator, p.approved)?;
            applied()
        }
        RpcMethod::SetIdNftContract => {
            let p: SetIdLedgerParams = parse(params)?;
            campus.set_id_ledger(&p.caller, p.ledger)?;
            applied()
        }

        // -- Access points --------------------------------------------------
        RpcMethod::AddAccessPoint => {
            let p: AccessPointParams = parse(params)?;
            campus.add_access_point(&p.caller, &p.location, &p.account, p.cost)?;
            applied()
        }
        RpcMethod::UpdateAccessPoint => {
            let p: AccessPointParams = parse(params)?;
            campus.update_access_point(&p.caller, &p.location, &p.account, p.cost)?;
            applied()
        }
        RpcMethod::DeactivateAccessPoint => {
            let p: LocationAdminParams = parse(params)?;
            campus.deactivate_access_point(&p.caller, &p.location)?;
            applied()
        }

        // -- Soulbound ------------------------------------------------------
        RpcMethod::TransferCredential => {
            let p: TransferCredentialParams = parse(params)?;
            campus.transfer_credential(p.family, &p.from, &p.to, p.id)?;
            applied()
        }

        other => Err(RpcError::internal_error(format!(
            "{other:?} is not a mutating method"
        ))),
    }
}

fn query(campus: &Campus, method: RpcMethod, params: serde_json::Value) -> RpcResult {
    match method {
        // -- Identity -------------------------------------------------------
        RpcMethod::IsActive => {
            let p: IdentityIdParams = parse(params)?;
            to_json(campus.identity(p.ledger)?.is_active(p.id)?)
        }
        RpcMethod::RoleOf => {
            let p: IdentityIdParams = parse(params)?;
            to_json(campus.identity(p.ledger)?.role_of(p.id)?)
        }
        RpcMethod::OwnerOf => {
            let p: IdentityIdParams = parse(params)?;
            to_json(campus.identity(p.ledger)?.owner_of(p.id)?)
        }
        RpcMethod::IdentityTokenUri => {
            let p: IdentityIdParams = parse(params)?;
            to_json(campus.identity(p.ledger)?.token_uri(p.id)?)
        }
        RpcMethod::IdentityOf => {
            let p: IdentityHolderParams = parse(params)?;
            to_json(campus.identity(p.ledger)?.identity_of(&p.holder))
        }
        RpcMethod::IdentityBalanceOf => {
            let p: IdentityHolderParams = parse(params)?;
            to_json(campus.identity(p.ledger)?.balance_of(&p.holder))
        }
        RpcMethod::TotalIdentities => {
            let p: IdentityLedgerParams = if params.is_null() {
                IdentityLedgerParams::default()
            } else {
                parse(params)?
            };
            to_json(campus.identity(p.ledger)?.total_identities())
        }

        // -- Fees -----------------------------------------------------------
        RpcMethod::VerifyFeePaid => {
            let p: HolderParams = parse(params)?;
            to_json(campus.fees().verify_fee_paid(&p.holder))
        }
        RpcMethod::ActiveReceiptOf => {
            let p: HolderParams = parse(params)?;
            to_json(campus.fees().active_receipt_of(&p.holder))
        }
        RpcMethod::GetReceipt => {
            let p: IdParams = parse(params)?;
            to_json(campus.fees().receipt(p.id)?)
        }
        RpcMethod::GetTreasury => to_json(campus.fees().treasury()),

        // -- Courses --------------------------------------------------------
        RpcMethod::GetCourseDetails => {
            let p: CourseParams = parse(params)?;
            to_json(campus.enrollment().course(p.course_id)?)
        }
        RpcMethod::GetAllCourses => to_json(campus.enrollment().courses()),
        RpcMethod::GetCourseCount => to_json(campus.enrollment().course_count()),

        // -- Enrollment -----------------------------------------------------
        RpcMethod::IsStudentRegistered => {
            let p: StudentCourseParams = parse(params)?;
            to_json(campus.enrollment().is_student_registered(&p.student, p.course_id))
        }
        RpcMethod::GetCourseStudents => {
            let p: CourseParams = parse(params)?;
            to_json(campus.enrollment().course_students(p.course_id)?)
        }
        RpcMethod::StudentCourseCount => {
            let p: HolderParams = parse(params)?;
            to_json(campus.enrollment().student_course_count(&p.holder))
        }
        RpcMethod::StandingOf => {
            let p: StudentCourseParams = parse(params)?;
            to_json(campus.enrollment().standing_of(&p.student, p.course_id))
        }
        RpcMethod::GetEnrollment => {
            let p: IdParams = parse(params)?;
            to_json(campus.enrollment().enrollment(p.id)?)
        }
        RpcMethod::GetCompletion => {
            let p: IdParams = parse(params)?;
            to_json(campus.enrollment().completion(p.id)?)
        }

        // -- Rewards --------------------------------------------------------
        RpcMethod::GetApproved => {
            let p: TokenParams = parse(params)?;
            to_json(campus.rewards().get_approved(p.token_id)?)
        }
        RpcMethod::IsApprovedForAll => {
            let p: OperatorQueryParams = parse(params)?;
            to_json(campus.rewards().is_approved_for_all(&p.owner, &p.operator))
        }
        RpcMethod::GetAdminTokens => to_json(campus.rewards().admin_tokens()),
        RpcMethod::GetCurrentTokenId => to_json(campus.rewards().current_token_id()),
        RpcMethod::RewardOwnerOf => {
            let p: TokenParams = parse(params)?;
            to_json(campus.rewards().owner_of(p.token_id)?)
        }
        RpcMethod::RewardBalanceOf => {
            let p: HolderParams = parse(params)?;
            to_json(campus.rewards().balance_of(&p.holder))
        }

        // -- Access points --------------------------------------------------
        RpcMethod::GetAccessPoint => {
            let p: LocationParams = parse(params)?;
            to_json(campus.rewards().access_point(&p.location)?)
        }
        RpcMethod::GetAccessPoints => {
            to_json(campus.rewards().access_points().collect::<Vec<_>>())
        }

        other => Err(RpcError::internal_error(format!(
            "{other:?} is not a read method"
        ))),
    }
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `GET /ws` — WebSocket upgrade for live event streaming.
///
/// Clients receive one JSON-encoded [`LedgerEvent`] per message. The
/// connection is push-only; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
