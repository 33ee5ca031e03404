use thiserror::Error;

use crate::domain::AdminStatus;

/// Main error type for the delegation client
#[derive(Error, Debug)]
pub enum PropdeskError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No connected address available")]
    NotConnected,

    // Workflow errors
    #[error("Precondition not met: requires {required}, currently {actual}")]
    InvalidPrecondition { required: String, actual: String },

    #[error("Admin status check rejected: status is {0}")]
    Rejected(AdminStatus),

    // Agreement errors
    #[error("Active trust agreement already exists: admin {admin} / user {user}")]
    DuplicateAgreement { admin: String, user: String },

    #[error(
        "Delegation not authorized: no verified trust agreement for {principal} / {sub_account}"
    )]
    UnauthorizedDelegation {
        principal: String,
        sub_account: String,
    },

    // Pool errors
    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Pool inactive: {0}")]
    PoolInactive(String),

    #[error("Allocation out of bounds: {amount} not in [{min}, {max}]")]
    OutOfBounds {
        amount: rust_decimal::Decimal,
        min: rust_decimal::Decimal,
        max: rust_decimal::Decimal,
    },

    #[error("Insufficient pool headroom: requested {requested}, available {available}")]
    InsufficientHeadroom {
        requested: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    // Trade errors
    #[error("Rejected by ledger: {0}")]
    LedgerRejected(String),

    // Crypto/signing errors
    #[error("Signature error: {0}")]
    Signature(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for PropdeskError
pub type Result<T> = std::result::Result<T, PropdeskError>;

/// Errors produced at the ledger gateway boundary, before classification
/// into the client taxonomy.
///
/// `Rejected` carries the ledger's reason verbatim; the service layer maps
/// it into the nearest taxonomy bucket (e.g. a headroom rejection during
/// allocation becomes `InsufficientHeadroom`).
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Ledger rejected the call: {reason}")]
    Rejected { code: Option<String>, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl LedgerError {
    /// Does the rejection reason indicate a pool headroom race?
    ///
    /// The client's check-then-act headroom pass can be invalidated by a
    /// concurrent allocation from another session; the ledger's rejection is
    /// the authoritative answer and is a normal outcome, not a fault.
    pub fn is_headroom_rejection(&self) -> bool {
        match self {
            LedgerError::Rejected { code, reason } => {
                code.as_deref() == Some("INSUFFICIENT_HEADROOM")
                    || reason.to_ascii_lowercase().contains("headroom")
                    || reason.to_ascii_lowercase().contains("insufficient")
            }
            _ => false,
        }
    }
}

impl From<LedgerError> for PropdeskError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Transport(msg) => PropdeskError::LedgerUnavailable(msg),
            LedgerError::Rejected { reason, .. } => PropdeskError::LedgerRejected(reason),
            LedgerError::NotFound(what) => PropdeskError::PoolNotFound(what),
        }
    }
}
