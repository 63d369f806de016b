//! # JSON-RPC API Definitions
//!
//! Type-safe definitions for the campus ledger JSON-RPC API. This module
//! owns the method enumeration, the request/response envelopes and the
//! typed parameter objects. The HTTP server that dispatches them lives in
//! the node binary (axum).
//!
//! Method names are prefixed with `campus_`. Parameters are always a named
//! JSON object with camelCase keys. Mutating methods carry a `caller`
//! address; signing that address is the wallet's job, not the ledger's.
//!
//! ## Method Index
//!
//! | Group      | Methods                                                           |
//! |------------|-------------------------------------------------------------------|
//! | Identity   | `mintIdentity`, `burnIdentity`, `isActive`, `roleOf`, `ownerOf`, `identityTokenUri`, `identityOf`, `identityBalanceOf`, `totalIdentities`, `deployIdentityLedger` |
//! | Fees       | `payFee`, `verifyFeePaid`, `activeReceiptOf`, `getReceipt`, `getTreasury` |
//! | Courses    | `addCourse`, `updateCourse`, `activateCourse`, `deactivateCourse`, `deactivateAllCourses`, `getCourseDetails`, `getAllCourses`, `getCourseCount` |
//! | Enrollment | `register`, `submitGrade`, `isStudentRegistered`, `getCourseStudents`, `studentCourseCount`, `standingOf`, `getEnrollment`, `getCompletion` |
//! | Rewards    | `mintReward`, `mintMultipleRewards`, `useReward`, `transferFrom`, `approve`, `setApprovalForAll`, `getApproved`, `isApprovedForAll`, `getAdminTokens`, `getCurrentTokenId`, `setIdNFTContract`, `rewardOwnerOf`, `rewardBalanceOf` |
//! | Access     | `addAccessPoint`, `updateAccessPoint`, `deactivateAccessPoint`, `getAccessPoint`, `getAccessPoints`, `checkAmenityAccess` |
//! | Soulbound  | `transferCredential` (always rejected)                            |

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{Address, CourseId, CredentialId, LedgerRef, MetadataRef, TokenId};

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Supported JSON-RPC methods.
///
/// The wire name of each variant is its `serde` rename, e.g.
/// `"campus_mintIdentity"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    // -- Identity -----------------------------------------------------------
    #[serde(rename = "campus_mintIdentity")]
    MintIdentity,
    #[serde(rename = "campus_burnIdentity")]
    BurnIdentity,
    #[serde(rename = "campus_isActive")]
    IsActive,
    #[serde(rename = "campus_roleOf")]
    RoleOf,
    #[serde(rename = "campus_ownerOf")]
    OwnerOf,
    #[serde(rename = "campus_identityTokenUri")]
    IdentityTokenUri,
    #[serde(rename = "campus_identityOf")]
    IdentityOf,
    #[serde(rename = "campus_identityBalanceOf")]
    IdentityBalanceOf,
    #[serde(rename = "campus_totalIdentities")]
    TotalIdentities,
    #[serde(rename = "campus_deployIdentityLedger")]
    DeployIdentityLedger,

    // -- Fees ---------------------------------------------------------------
    #[serde(rename = "campus_payFee")]
    PayFee,
    #[serde(rename = "campus_verifyFeePaid")]
    VerifyFeePaid,
    #[serde(rename = "campus_activeReceiptOf")]
    ActiveReceiptOf,
    #[serde(rename = "campus_getReceipt")]
    GetReceipt,
    #[serde(rename = "campus_getTreasury")]
    GetTreasury,

    // -- Courses ------------------------------------------------------------
    #[serde(rename = "campus_addCourse")]
    AddCourse,
    #[serde(rename = "campus_updateCourse")]
    UpdateCourse,
    #[serde(rename = "campus_activateCourse")]
    ActivateCourse,
    #[serde(rename = "campus_deactivateCourse")]
    DeactivateCourse,
    #[serde(rename = "campus_deactivateAllCourses")]
    DeactivateAllCourses,
    #[serde(rename = "campus_getCourseDetails")]
    GetCourseDetails,
    #[serde(rename = "campus_getAllCourses")]
    GetAllCourses,
    #[serde(rename = "campus_getCourseCount")]
    GetCourseCount,

    // -- Enrollment ---------------------------------------------------------
    #[serde(rename = "campus_register")]
    Register,
    #[serde(rename = "campus_submitGrade")]
    SubmitGrade,
    #[serde(rename = "campus_isStudentRegistered")]
    IsStudentRegistered,
    #[serde(rename = "campus_getCourseStudents")]
    GetCourseStudents,
    #[serde(rename = "campus_studentCourseCount")]
    StudentCourseCount,
    #[serde(rename = "campus_standingOf")]
    StandingOf,
    #[serde(rename = "campus_getEnrollment")]
    GetEnrollment,
    #[serde(rename = "campus_getCompletion")]
    GetCompletion,

    // -- Rewards ------------------------------------------------------------
    #[serde(rename = "campus_mintReward")]
    MintReward,
    #[serde(rename = "campus_mintMultipleRewards")]
    MintMultipleRewards,
    #[serde(rename = "campus_useReward")]
    UseReward,
    #[serde(rename = "campus_transferFrom")]
    TransferFrom,
    #[serde(rename = "campus_approve")]
    Approve,
    #[serde(rename = "campus_setApprovalForAll")]
    SetApprovalForAll,
    #[serde(rename = "campus_getApproved")]
    GetApproved,
    #[serde(rename = "campus_isApprovedForAll")]
    IsApprovedForAll,
    #[serde(rename = "campus_getAdminTokens")]
    GetAdminTokens,
    #[serde(rename = "campus_getCurrentTokenId")]
    GetCurrentTokenId,
    #[serde(rename = "campus_setIdNFTContract")]
    SetIdNftContract,
    #[serde(rename = "campus_rewardOwnerOf")]
    RewardOwnerOf,
    #[serde(rename = "campus_rewardBalanceOf")]
    RewardBalanceOf,

    // -- Access points ------------------------------------------------------
    #[serde(rename = "campus_addAccessPoint")]
    AddAccessPoint,
    #[serde(rename = "campus_updateAccessPoint")]
    UpdateAccessPoint,
    #[serde(rename = "campus_deactivateAccessPoint")]
    DeactivateAccessPoint,
    #[serde(rename = "campus_getAccessPoint")]
    GetAccessPoint,
    #[serde(rename = "campus_getAccessPoints")]
    GetAccessPoints,
    #[serde(rename = "campus_checkAmenityAccess")]
    CheckAmenityAccess,

    // -- Soulbound ----------------------------------------------------------
    #[serde(rename = "campus_transferCredential")]
    TransferCredential,
}

impl RpcMethod {
    /// Resolves a wire name. Returns `None` for unknown methods.
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    /// True if the method changes ledger state (and therefore needs the
    /// write lock, a snapshot flush and event fan-out).
    pub fn mutates(self) -> bool {
        matches!(
            self,
            RpcMethod::MintIdentity
                | RpcMethod::BurnIdentity
                | RpcMethod::DeployIdentityLedger
                | RpcMethod::PayFee
                | RpcMethod::AddCourse
                | RpcMethod::UpdateCourse
                | RpcMethod::ActivateCourse
                | RpcMethod::DeactivateCourse
                | RpcMethod::DeactivateAllCourses
                | RpcMethod::Register
                | RpcMethod::SubmitGrade
                | RpcMethod::MintReward
                | RpcMethod::MintMultipleRewards
                | RpcMethod::UseReward
                | RpcMethod::TransferFrom
                | RpcMethod::Approve
                | RpcMethod::SetApprovalForAll
                | RpcMethod::SetIdNftContract
                | RpcMethod::AddAccessPoint
                | RpcMethod::UpdateAccessPoint
                | RpcMethod::DeactivateAccessPoint
                | RpcMethod::TransferCredential
        )
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
///
/// `method` is kept as a raw string so that an unknown method can be
/// answered with `-32601` instead of failing envelope deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version. Must be "2.0".
    pub jsonrpc: String,
    /// Request identifier. Echoed back in the response.
    #[serde(default)]
    pub id: serde_json::Value,
    /// The method to invoke.
    pub method: String,
    /// Method-specific parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    /// Creates a new RPC request with the given method and parameters.
    pub fn new(id: serde_json::Value, method: RpcMethod, params: serde_json::Value) -> Self {
        let method = match serde_json::to_value(method) {
            Ok(serde_json::Value::String(name)) => name,
            _ => String::new(),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
///
/// Exactly one of `result` or `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// JSON-RPC version. Always "2.0".
    pub jsonrpc: String,
    /// The request ID this response corresponds to.
    pub id: serde_json::Value,
    /// The successful result, if the method completed without error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error, if the method failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Creates a successful response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 error object.
///
/// Standard codes:
/// - `-32700`: Parse error
/// - `-32600`: Invalid request
/// - `-32601`: Method not found
/// - `-32602`: Invalid params
/// - `-32603`: Internal error
///
/// Ledger errors use the per-kind codes from
/// [`ErrorKind::code`](crate::error::ErrorKind::code) and carry
/// `{"kind": "<ErrorKind>"}` in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// JSON parse error.
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: msg.into(),
            data: None,
        }
    }

    /// Invalid JSON-RPC request structure.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: msg.into(),
            data: None,
        }
    }

    /// The requested method does not exist.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("method not found: {}", method.into()),
            data: None,
        }
    }

    /// Invalid method parameters.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: msg.into(),
            data: None,
        }
    }

    /// Internal server error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: msg.into(),
            data: None,
        }
    }

    /// The error kind carried in `data`, if this is a ledger error.
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

impl From<&LedgerError> for RpcError {
    fn from(err: &LedgerError) -> Self {
        let kind = err.kind();
        Self {
            code: kind.code(),
            message: err.to_string(),
            data: Some(serde_json::json!({ "kind": kind })),
        }
    }
}

impl From<LedgerError> for RpcError {
    fn from(err: LedgerError) -> Self {
        RpcError::from(&err)
    }
}

// ---------------------------------------------------------------------------
// Typed Parameters
// ---------------------------------------------------------------------------

/// Optional identity ledger selector. Absent means the primary instance.
pub type LedgerSelector = Option<LedgerRef>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintIdentityParams {
    pub caller: Address,
    pub holder: Address,
    #[serde(default)]
    pub role: Option<String>,
    pub metadata_ref: MetadataRef,
    #[serde(default)]
    pub ledger: LedgerSelector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnIdentityParams {
    pub caller: Address,
    pub id: CredentialId,
    #[serde(default)]
    pub ledger: LedgerSelector,
}

/// Parameters for single-id identity reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityIdParams {
    pub id: CredentialId,
    #[serde(default)]
    pub ledger: LedgerSelector,
}

/// Parameters for per-holder identity reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityHolderParams {
    pub holder: Address,
    #[serde(default)]
    pub ledger: LedgerSelector,
}

/// Parameters for whole-ledger identity reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityLedgerParams {
    #[serde(default)]
    pub ledger: LedgerSelector,
}

/// Parameters for administrator-only calls with no other argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerParams {
    pub caller: Address,
}

/// Parameters for any call keyed by a single holder address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderParams {
    pub holder: Address,
}

/// Parameters for any call keyed by a single numeric id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdParams {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayFeeParams {
    /// The payer. Fees are always paid by the holder for themselves.
    pub holder: Address,
    pub semester: String,
    pub metadata_ref: MetadataRef,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCourseParams {
    pub caller: Address,
    pub name: String,
    pub instructor: String,
    pub duration_weeks: u32,
    pub credits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseParams {
    pub caller: Address,
    pub course_id: CourseId,
    pub name: String,
    pub instructor: String,
    pub duration_weeks: u32,
    pub credits: u32,
}

/// Parameters for administrator calls targeting one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAdminParams {
    pub caller: Address,
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseParams {
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterParams {
    pub student: Address,
    pub course_id: CourseId,
    pub metadata_ref: MetadataRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGradeParams {
    pub caller: Address,
    pub student: Address,
    pub course_id: CourseId,
    pub grade: i64,
    pub metadata_ref: MetadataRef,
}

/// Parameters for (student, course) pair reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCourseParams {
    pub student: Address,
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRewardParams {
    pub caller: Address,
    pub holder: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintMultipleRewardsParams {
    pub caller: Address,
    pub holder: Address,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseRewardParams {
    pub caller: Address,
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFromParams {
    pub caller: Address,
    pub from: Address,
    pub to: Address,
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveParams {
    pub caller: Address,
    pub approved: Address,
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetApprovalForAllParams {
    pub caller: Address,
    pub operator: Address,
    pub approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenParams {
    pub token_id: TokenId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorQueryParams {
    pub owner: Address,
    pub operator: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetIdLedgerParams {
    pub caller: Address,
    pub ledger: LedgerRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPointParams {
    pub caller: Address,
    pub location: String,
    pub account: Address,
    pub cost: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAdminParams {
    pub caller: Address,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationParams {
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmenityParams {
    pub holder: Address,
    pub amenity: String,
}

/// Credential families that reject every transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialFamily {
    Identity,
    FeeReceipt,
    Enrollment,
    Completion,
}

impl CredentialFamily {
    pub fn label(self) -> &'static str {
        match self {
            CredentialFamily::Identity => "identity",
            CredentialFamily::FeeReceipt => "fee receipt",
            CredentialFamily::Enrollment => "enrollment",
            CredentialFamily::Completion => "completion",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCredentialParams {
    pub family: CredentialFamily,
    pub from: Address,
    pub to: Address,
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn rpc_request_serialization() {
        let req = RpcRequest::new(
            serde_json::json!(1),
            RpcMethod::GetAdminTokens,
            serde_json::json!({}),
        );

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("campus_getAdminTokens"));

        let recovered: RpcRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(
            RpcMethod::from_name(&recovered.method),
            Some(RpcMethod::GetAdminTokens)
        );
    }

    #[test]
    fn unknown_method_name_resolves_to_none() {
        assert_eq!(RpcMethod::from_name("campus_doesNotExist"), None);
        assert_eq!(RpcMethod::from_name("mintIdentity"), None);
    }

    #[test]
    fn rpc_error_response() {
        let resp = RpcResponse::error(
            serde_json::json!(1),
            RpcError::internal_error("something broke"),
        );

        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, -32603);
    }

    #[test]
    fn standard_error_codes() {
        assert_eq!(RpcError::parse_error("").code, -32700);
        assert_eq!(RpcError::invalid_request("").code, -32600);
        assert_eq!(RpcError::method_not_found("").code, -32601);
        assert_eq!(RpcError::invalid_params("").code, -32602);
        assert_eq!(RpcError::internal_error("").code, -32603);
    }

    #[test]
    fn ledger_error_carries_kind_in_data() {
        let err = LedgerError::MissingFeeReceipt(Address::from("0xs"));
        let rpc = RpcError::from(&err);
        assert_eq!(rpc.code, ErrorKind::MissingFeeReceipt.code());
        assert_eq!(rpc.kind(), Some("MissingFeeReceipt"));
    }

    #[test]
    fn mutating_methods_flagged() {
        assert!(RpcMethod::Register.mutates());
        assert!(RpcMethod::UseReward.mutates());
        assert!(!RpcMethod::GetAdminTokens.mutates());
        assert!(!RpcMethod::CheckAmenityAccess.mutates());
    }

    #[test]
    fn params_use_camel_case_keys() {
        let params: RegisterParams = serde_json::from_value(serde_json::json!({
            "student": "0xs",
            "courseId": 1,
            "metadataRef": "ipfs://enroll"
        }))
        .unwrap();
        assert_eq!(params.course_id, 1);
        assert_eq!(params.student.as_str(), "0xs");
    }

    #[test]
    fn credential_reads_are_not_mutating() {
        for name in ["campus_getEnrollment", "campus_getCompletion", "campus_totalIdentities"] {
            let method = RpcMethod::from_name(name).expect(name);
            assert!(!method.mutates(), "{name}");
        }
    }

    #[test]
    fn ledger_selector_defaults_to_primary() {
        let params: IdentityIdParams =
            serde_json::from_value(serde_json::json!({ "id": 4 })).unwrap();
        assert_eq!(params.ledger, None);
    }
}
