use serde::{Deserialize, Serialize};

/// Admin onboarding state machine stages.
///
/// Strictly ordered; progress is append-only. `AdminConfirmed` is terminal
/// for the workflow. Subsequent ledger standing (Warning/Banned) is tracked
/// as `AdminStatus`, not as a workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStage {
    Unverified,
    IdentityVerified,
    AgreementCreated,
    AdminConfirmed,
}

impl VerificationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStage::Unverified => "UNVERIFIED",
            VerificationStage::IdentityVerified => "IDENTITY_VERIFIED",
            VerificationStage::AgreementCreated => "AGREEMENT_CREATED",
            VerificationStage::AdminConfirmed => "ADMIN_CONFIRMED",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            VerificationStage::Unverified => 0,
            VerificationStage::IdentityVerified => 1,
            VerificationStage::AgreementCreated => 2,
            VerificationStage::AdminConfirmed => 3,
        }
    }

    pub fn at_least(&self, other: VerificationStage) -> bool {
        self.rank() >= other.rank()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VerificationStage::AdminConfirmed)
    }
}

impl std::fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-candidate verification progress.
///
/// Invariants: `agreement_created` implies `identity_verified`, and
/// `admin_status_confirmed` implies `agreement_created`. The only mutators
/// are the advance methods below, which preserve them by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminVerificationState {
    pub identity_verified: bool,
    pub agreement_created: bool,
    pub admin_status_confirmed: bool,
}

impl AdminVerificationState {
    pub fn stage(&self) -> VerificationStage {
        if self.admin_status_confirmed {
            VerificationStage::AdminConfirmed
        } else if self.agreement_created {
            VerificationStage::AgreementCreated
        } else if self.identity_verified {
            VerificationStage::IdentityVerified
        } else {
            VerificationStage::Unverified
        }
    }

    pub fn mark_identity_verified(&mut self) {
        self.identity_verified = true;
    }

    pub fn mark_agreement_created(&mut self) {
        debug_assert!(self.identity_verified);
        self.agreement_created = true;
    }

    pub fn mark_admin_confirmed(&mut self) {
        debug_assert!(self.agreement_created);
        self.admin_status_confirmed = true;
    }
}
