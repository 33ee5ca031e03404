//! Client view of the trust-agreement registry.
//!
//! The ledger is the source of truth; this service validates locally,
//! pre-checks duplicates (ledger calls are costly and not atomically
//! idempotent from here), and classifies ledger errors. Verification is
//! the trade-time gate and always fails closed.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{Address, AgreementTerms, ProfitShare, TrustAgreement};
use crate::error::{LedgerError, PropdeskError, Result};
use crate::ledger::LedgerGateway;
use crate::signing::RequestSigner;
use crate::validation::validate_distinct_parties;

pub struct AgreementService {
    ledger: Arc<dyn LedgerGateway>,
    signer: Option<RequestSigner>,
}

impl AgreementService {
    pub fn new(ledger: Arc<dyn LedgerGateway>, signer: Option<RequestSigner>) -> Self {
        Self { ledger, signer }
    }

    /// Create a trust agreement between an admin and a principal.
    ///
    /// Returns the ledger agreement id. Fails with `DuplicateAgreement` if
    /// an active agreement already exists for the pair.
    pub async fn create(
        &self,
        admin: &Address,
        user: &Address,
        profit_share: ProfitShare,
        terms: &str,
    ) -> Result<String> {
        validate_distinct_parties(admin, user)?;

        let existing = self
            .ledger
            .find_trust_agreement(admin, user)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))?;
        if existing.is_some() {
            return Err(PropdeskError::DuplicateAgreement {
                admin: admin.to_string(),
                user: user.to_string(),
            });
        }

        let payload = AgreementTerms {
            profit_share: profit_share.percent(),
            admin_address: admin.clone(),
            user_address: user.clone(),
            timestamp: Utc::now().timestamp(),
            terms: terms.to_string(),
        };
        let (blob, signature) = match &self.signer {
            Some(signer) => signer.sign_terms(&payload)?,
            None => (serde_json::to_string(&payload)?, "unsigned".to_string()),
        };

        let agreement_id = self
            .ledger
            .create_trust_agreement(admin, user, &blob, &signature)
            .await
            .map_err(|e| self.classify_create_error(e, admin, user))?;

        info!(
            admin = %admin,
            user = %user,
            profit_share = %profit_share,
            agreement_id = %agreement_id,
            "trust agreement created"
        );
        Ok(agreement_id)
    }

    /// Trade-time delegation gate.
    ///
    /// Returns true only when the ledger confirms an agreement for this
    /// exact pair. Any ledger error is treated as not-verified, never as
    /// authorization.
    pub async fn verify(&self, admin: &Address, user: &Address) -> bool {
        match self.ledger.verify_trust_agreement(admin, user).await {
            Ok(verified) => verified,
            Err(e) => {
                warn!(
                    admin = %admin,
                    user = %user,
                    error = %e,
                    "trust agreement verification failed, treating as unverified"
                );
                false
            }
        }
    }

    /// Fetch the agreement for a pair, if one exists.
    pub async fn find(&self, admin: &Address, user: &Address) -> Result<Option<TrustAgreement>> {
        self.ledger
            .find_trust_agreement(admin, user)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))
    }

    fn classify_create_error(
        &self,
        err: LedgerError,
        admin: &Address,
        user: &Address,
    ) -> PropdeskError {
        match err {
            LedgerError::Rejected { code, reason } => {
                if code.as_deref() == Some("DUPLICATE_AGREEMENT") {
                    PropdeskError::DuplicateAgreement {
                        admin: admin.to_string(),
                        user: user.to_string(),
                    }
                } else {
                    PropdeskError::LedgerRejected(reason)
                }
            }
            other => PropdeskError::LedgerUnavailable(other.to_string()),
        }
    }
}
