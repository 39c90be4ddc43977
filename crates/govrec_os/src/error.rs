#![forbid(unsafe_code)]

use govrec_kernel_contracts::ContractViolation;
use govrec_storage::StorageError;
use thiserror::Error;

use crate::authz::Operation;

/// Every failure aborts the operation with no state change and reaches the
/// caller as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },
    #[error("{field} is not valid JSON")]
    MalformedPayload { field: &'static str },
    #[error("{key} already exists")]
    AlreadyExists { key: String },
    #[error("{key} does not exist")]
    NotFound { key: String },
    #[error("version {attempted} must be greater than latest version {latest}")]
    VersionNotMonotonic { attempted: String, latest: String },
    #[error("{identity} is not authorized to call {operation}")]
    UnauthorizedCaller {
        operation: Operation,
        identity: String,
    },
    #[error("already approved by {identity}")]
    DuplicateApproval { identity: String },
    #[error("SAR {sar_id} is already acknowledged")]
    AlreadyAcknowledged { sar_id: String },
    #[error("unknown function {name}")]
    UnknownFunction { name: String },
    #[error("{function} expects {expected} arguments, got {got}")]
    ArgumentCount {
        function: String,
        expected: &'static str,
        got: usize,
    },
    #[error("{function} result could not be encoded: {reason}")]
    ResponseEncoding { function: String, reason: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            EngineError::AlreadyExists { .. } => "ALREADY_EXISTS",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::VersionNotMonotonic { .. } => "VERSION_NOT_MONOTONIC",
            EngineError::UnauthorizedCaller { .. } => "UNAUTHORIZED_CALLER",
            EngineError::DuplicateApproval { .. } => "DUPLICATE_APPROVAL",
            EngineError::AlreadyAcknowledged { .. } => "ALREADY_ACKNOWLEDGED",
            EngineError::UnknownFunction { .. } => "UNKNOWN_FUNCTION",
            EngineError::ArgumentCount { .. } => "ARGUMENT_COUNT",
            EngineError::ResponseEncoding { .. } => "RESPONSE_ENCODING_ERROR",
            EngineError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<ContractViolation> for EngineError {
    fn from(v: ContractViolation) -> Self {
        match v {
            ContractViolation::InvalidValue { field, reason } => {
                EngineError::Validation { field, reason }
            }
            ContractViolation::NotFinite { field } => EngineError::Validation {
                field,
                reason: "must be finite",
            },
            ContractViolation::MalformedPayload { field } => {
                EngineError::MalformedPayload { field }
            }
        }
    }
}
