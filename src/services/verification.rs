//! Admin verification workflow.
//!
//! A strict 3-step state machine per candidate address:
//! `Unverified → IdentityVerified → AgreementCreated → AdminConfirmed`.
//! Step ordering is a contract enforced here, not a rendering detail.
//!
//! Per-address serialization: each address owns an async mutex, so a second
//! call observing an in-flight transition waits for it instead of racing a
//! duplicate ledger submission. The local state map is a per-session cache;
//! the ledger stays authoritative.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::domain::{
    AdminPerformance, AdminStatus, AdminVerificationState, Address, VerificationStage,
};
use crate::error::{PropdeskError, Result};
use crate::ledger::LedgerGateway;
use crate::services::AgreementService;
use crate::validation::validate_profit_share;

pub struct VerificationWorkflow {
    ledger: Arc<dyn LedgerGateway>,
    agreements: Arc<AgreementService>,
    states: DashMap<Address, Arc<Mutex<AdminVerificationState>>>,
}

impl VerificationWorkflow {
    pub fn new(ledger: Arc<dyn LedgerGateway>, agreements: Arc<AgreementService>) -> Self {
        Self {
            ledger,
            agreements,
            states: DashMap::new(),
        }
    }

    fn state_for(&self, address: &Address) -> Arc<Mutex<AdminVerificationState>> {
        self.states
            .entry(address.clone())
            .or_insert_with(|| Arc::new(Mutex::new(AdminVerificationState::default())))
            .clone()
    }

    /// Current workflow stage for an address (advisory, session-local).
    pub async fn stage(&self, address: &Address) -> VerificationStage {
        let state = self.state_for(address);
        let guard = state.lock().await;
        guard.stage()
    }

    /// Step 1: register identity credentials on the ledger.
    ///
    /// Idempotent: re-invoking for an already verified address is a no-op
    /// that reports success. `candidate` is the connected address; absent
    /// means no wallet session.
    #[instrument(skip(self, credentials, proof))]
    pub async fn verify_identity(
        &self,
        candidate: Option<&Address>,
        credentials: &str,
        proof: &str,
    ) -> Result<VerificationStage> {
        let candidate = candidate.ok_or(PropdeskError::NotConnected)?;
        let state = self.state_for(candidate);
        let mut guard = state.lock().await;

        if guard.identity_verified {
            return Ok(guard.stage());
        }

        self.ledger
            .register_identity(candidate, credentials, proof)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))?;

        guard.mark_identity_verified();
        info!(address = %candidate, "identity verified");
        Ok(guard.stage())
    }

    /// Step 2: create the trust agreement binding admin to principal.
    ///
    /// Precondition: identity already verified for `admin`.
    #[instrument(skip(self, terms))]
    pub async fn create_agreement(
        &self,
        admin: &Address,
        user: &Address,
        profit_share_percent: u8,
        terms: &str,
    ) -> Result<String> {
        let profit_share = validate_profit_share(profit_share_percent)?;

        let state = self.state_for(admin);
        let mut guard = state.lock().await;

        if !guard.stage().at_least(VerificationStage::IdentityVerified) {
            return Err(PropdeskError::InvalidPrecondition {
                required: VerificationStage::IdentityVerified.to_string(),
                actual: guard.stage().to_string(),
            });
        }

        let agreement_id = self
            .agreements
            .create(admin, user, profit_share, terms)
            .await?;

        guard.mark_agreement_created();
        Ok(agreement_id)
    }

    /// Step 3: poll ledger standing and confirm admin status.
    ///
    /// Transitions to `AdminConfirmed` only when the ledger reports Active;
    /// otherwise the current status is reported without a transition so the
    /// candidate can retry after resolving warnings.
    #[instrument(skip(self))]
    pub async fn confirm_admin_status(&self, admin: &Address) -> Result<VerificationStage> {
        let state = self.state_for(admin);
        let mut guard = state.lock().await;

        if !guard.stage().at_least(VerificationStage::AgreementCreated) {
            return Err(PropdeskError::InvalidPrecondition {
                required: VerificationStage::AgreementCreated.to_string(),
                actual: guard.stage().to_string(),
            });
        }
        if guard.admin_status_confirmed {
            return Ok(guard.stage());
        }

        let status = self
            .ledger
            .check_admin_status(admin)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))?;

        match status {
            AdminStatus::Active => {
                guard.mark_admin_confirmed();
                info!(address = %admin, "admin status confirmed");
                Ok(guard.stage())
            }
            other => {
                warn!(address = %admin, status = %other, "admin status not active");
                Err(PropdeskError::Rejected(other))
            }
        }
    }

    /// Current ledger standing, independent of the workflow stage.
    pub async fn admin_status(&self, address: &Address) -> Result<AdminStatus> {
        self.ledger
            .check_admin_status(address)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))
    }

    /// Dashboard performance metrics for an admin.
    pub async fn admin_performance(&self, address: &Address) -> Result<AdminPerformance> {
        self.ledger
            .get_admin_performance(address)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))
    }
}
