//! # Ledger Error Taxonomy
//!
//! Every rejected ledger operation returns exactly one [`LedgerError`]. Each
//! error has a fieldless [`ErrorKind`] that travels over the wire so a UI
//! can tell "no identity" from "no fee receipt" without parsing messages.
//!
//! A failed operation never leaves partial state behind: ledgers validate
//! every precondition before their first write.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::{Address, CourseId, TokenId};

// ---------------------------------------------------------------------------
// LedgerError
// ---------------------------------------------------------------------------

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A required address was the null account.
    #[error("invalid address: {0} must not be the null address")]
    InvalidAddress(&'static str),

    /// The holder already owns a live identity credential.
    #[error("duplicate identity: {0} already holds an identity credential")]
    DuplicateIdentity(Address),

    /// The account does not own a live identity credential.
    #[error("missing identity: {0} does not own an identity credential")]
    MissingIdentity(Address),

    /// The account has never paid a fee (no active receipt).
    #[error("missing fee receipt: {0} has not paid the fee")]
    MissingFeeReceipt(Address),

    /// A fee payment carried no value.
    #[error("fee amount must be greater than zero")]
    ZeroFee,

    /// Crediting the treasury would overflow.
    #[error("amount overflow: treasury balance would exceed u64::MAX")]
    AmountOverflow,

    /// No course exists with this id.
    #[error("course not found: {0}")]
    CourseNotFound(CourseId),

    /// The course exists but is deactivated.
    #[error("course {0} is not active")]
    CourseInactive(CourseId),

    /// Course fields failed validation.
    #[error("invalid course parameters: {reason}")]
    InvalidCourseParams {
        /// Which field was rejected and why.
        reason: String,
    },

    /// The student already holds an enrollment or completion for the course.
    #[error("{student} is already enrolled in course {course_id}")]
    AlreadyEnrolled {
        /// The student address.
        student: Address,
        /// The course.
        course_id: CourseId,
    },

    /// Grading was attempted for a student with no enrollment.
    #[error("{student} is not registered for course {course_id}")]
    NotRegistered {
        /// The student address.
        student: Address,
        /// The course.
        course_id: CourseId,
    },

    /// The (student, course) pair was already graded.
    #[error("grade already submitted for {student} in course {course_id}")]
    AlreadyGraded {
        /// The student address.
        student: Address,
        /// The course.
        course_id: CourseId,
    },

    /// Grade outside the accepted range.
    #[error("invalid grade {grade}: must be between 0 and 10")]
    InvalidGrade {
        /// The rejected grade.
        grade: i64,
    },

    /// Identity, fee, enrollment and completion credentials never move.
    #[error("{credential} credential {id} is soulbound and cannot be transferred")]
    SoulboundTransferDisallowed {
        /// Credential family ("identity", "fee receipt", ...).
        credential: &'static str,
        /// Id within that family.
        id: u64,
    },

    /// Reward transfer to an account without an identity credential.
    #[error("recipient {0} must own an identity credential")]
    RecipientMissingIdentity(Address),

    /// Caller is neither owner, approved account, nor operator of the token.
    #[error("{caller} does not own reward token {token_id}")]
    NotOwner {
        /// The rejected caller.
        caller: Address,
        /// The token in question.
        token_id: TokenId,
    },

    /// A batch count of zero.
    #[error(
        "number of reward tokens must be between 1 and {}",
        crate::config::MAX_BATCH_MINT
    )]
    InvalidCount,

    /// The referenced entity does not exist (or was burned).
    #[error("{what} not found: {id}")]
    NotFound {
        /// Entity family.
        what: &'static str,
        /// The looked-up key, rendered.
        id: String,
    },

    /// A non-administrator called an administrator-only operation.
    #[error("unauthorized: {0} is not the administrator")]
    Unauthorized(Address),

    /// The administrator tried to deposit a token that is already pooled.
    #[error("reward token {0} is already in the recycle pool")]
    AlreadyPooled(TokenId),

    /// Access point fields failed validation.
    #[error("invalid access point: {reason}")]
    InvalidAccessPoint {
        /// Which field was rejected and why.
        reason: String,
    },

    /// An access point already exists at this location.
    #[error("access point already exists at {0}")]
    DuplicateAccessPoint(String),

    /// The metadata resolver could not produce a document.
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),
}

/// Convenience alias used by every ledger operation.
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Shorthand for [`LedgerError::NotFound`].
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            what,
            id: id.to_string(),
        }
    }

    /// The fieldless kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            LedgerError::DuplicateIdentity(_) => ErrorKind::DuplicateIdentity,
            LedgerError::MissingIdentity(_) => ErrorKind::MissingIdentity,
            LedgerError::MissingFeeReceipt(_) => ErrorKind::MissingFeeReceipt,
            LedgerError::ZeroFee => ErrorKind::ZeroFee,
            LedgerError::AmountOverflow => ErrorKind::AmountOverflow,
            LedgerError::CourseNotFound(_) => ErrorKind::CourseNotFound,
            LedgerError::CourseInactive(_) => ErrorKind::CourseInactive,
            LedgerError::InvalidCourseParams { .. } => ErrorKind::InvalidCourseParams,
            LedgerError::AlreadyEnrolled { .. } => ErrorKind::AlreadyEnrolled,
            LedgerError::NotRegistered { .. } => ErrorKind::NotRegistered,
            LedgerError::AlreadyGraded { .. } => ErrorKind::AlreadyGraded,
            LedgerError::InvalidGrade { .. } => ErrorKind::InvalidGrade,
            LedgerError::SoulboundTransferDisallowed { .. } => {
                ErrorKind::SoulboundTransferDisallowed
            }
            LedgerError::RecipientMissingIdentity(_) => ErrorKind::RecipientMissingIdentity,
            LedgerError::NotOwner { .. } => ErrorKind::NotOwner,
            LedgerError::InvalidCount => ErrorKind::InvalidCount,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Unauthorized(_) => ErrorKind::Unauthorized,
            LedgerError::AlreadyPooled(_) => ErrorKind::AlreadyPooled,
            LedgerError::InvalidAccessPoint { .. } => ErrorKind::InvalidAccessPoint,
            LedgerError::DuplicateAccessPoint(_) => ErrorKind::DuplicateAccessPoint,
            LedgerError::MetadataUnavailable(_) => ErrorKind::MetadataUnavailable,
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Stable, fieldless tag for a [`LedgerError`].
///
/// Serialized by name (e.g. `"MissingFeeReceipt"`). Each kind owns a fixed
/// JSON-RPC application code in the `-32000..=-32099` server range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidAddress,
    DuplicateIdentity,
    MissingIdentity,
    MissingFeeReceipt,
    ZeroFee,
    AmountOverflow,
    CourseNotFound,
    CourseInactive,
    InvalidCourseParams,
    AlreadyEnrolled,
    NotRegistered,
    AlreadyGraded,
    InvalidGrade,
    SoulboundTransferDisallowed,
    RecipientMissingIdentity,
    NotOwner,
    InvalidCount,
    NotFound,
    Unauthorized,
    AlreadyPooled,
    InvalidAccessPoint,
    DuplicateAccessPoint,
    MetadataUnavailable,
}

impl ErrorKind {
    /// JSON-RPC error code for this kind.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::InvalidAddress => -32010,
            ErrorKind::DuplicateIdentity => -32011,
            ErrorKind::MissingIdentity => -32012,
            ErrorKind::MissingFeeReceipt => -32013,
            ErrorKind::ZeroFee => -32014,
            ErrorKind::AmountOverflow => -32015,
            ErrorKind::CourseNotFound => -32020,
            ErrorKind::CourseInactive => -32021,
            ErrorKind::InvalidCourseParams => -32022,
            ErrorKind::AlreadyEnrolled => -32023,
            ErrorKind::NotRegistered => -32024,
            ErrorKind::AlreadyGraded => -32025,
            ErrorKind::InvalidGrade => -32026,
            ErrorKind::SoulboundTransferDisallowed => -32030,
            ErrorKind::RecipientMissingIdentity => -32031,
            ErrorKind::NotOwner => -32032,
            ErrorKind::InvalidCount => -32033,
            ErrorKind::AlreadyPooled => -32034,
            ErrorKind::InvalidAccessPoint => -32035,
            ErrorKind::DuplicateAccessPoint => -32036,
            ErrorKind::NotFound => -32040,
            ErrorKind::Unauthorized => -32041,
            ErrorKind::MetadataUnavailable => -32050,
        }
    }

    /// The kind's name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidAddress => "InvalidAddress",
            ErrorKind::DuplicateIdentity => "DuplicateIdentity",
            ErrorKind::MissingIdentity => "MissingIdentity",
            ErrorKind::MissingFeeReceipt => "MissingFeeReceipt",
            ErrorKind::ZeroFee => "ZeroFee",
            ErrorKind::AmountOverflow => "AmountOverflow",
            ErrorKind::CourseNotFound => "CourseNotFound",
            ErrorKind::CourseInactive => "CourseInactive",
            ErrorKind::InvalidCourseParams => "InvalidCourseParams",
            ErrorKind::AlreadyEnrolled => "AlreadyEnrolled",
            ErrorKind::NotRegistered => "NotRegistered",
            ErrorKind::AlreadyGraded => "AlreadyGraded",
            ErrorKind::InvalidGrade => "InvalidGrade",
            ErrorKind::SoulboundTransferDisallowed => "SoulboundTransferDisallowed",
            ErrorKind::RecipientMissingIdentity => "RecipientMissingIdentity",
            ErrorKind::NotOwner => "NotOwner",
            ErrorKind::InvalidCount => "InvalidCount",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::AlreadyPooled => "AlreadyPooled",
            ErrorKind::InvalidAccessPoint => "InvalidAccessPoint",
            ErrorKind::DuplicateAccessPoint => "DuplicateAccessPoint",
            ErrorKind::MetadataUnavailable => "MetadataUnavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
