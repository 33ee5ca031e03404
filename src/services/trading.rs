//! Trade execution gateway.
//!
//! Delegated trades pass the trust-agreement gate before anything reaches
//! the ledger. Submission happens exactly once: trade calls are not safely
//! retryable without idempotency keys, so a ledger rejection is surfaced
//! verbatim instead of retried.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::{DelegatedTrade, TradeReceipt};
use crate::error::{LedgerError, PropdeskError, Result};
use crate::ledger::{LedgerGateway, TradeSubmission};
use crate::services::AgreementService;
use crate::validation::validate_positive_amount;

pub struct TradeExecutor {
    ledger: Arc<dyn LedgerGateway>,
    agreements: Arc<AgreementService>,
}

impl TradeExecutor {
    pub fn new(ledger: Arc<dyn LedgerGateway>, agreements: Arc<AgreementService>) -> Self {
        Self { ledger, agreements }
    }

    /// Execute a trade for a principal, directly or via delegation.
    #[instrument(skip(self))]
    pub async fn execute(&self, trade: &DelegatedTrade) -> Result<TradeReceipt> {
        validate_positive_amount(trade.amount, "trade amount")?;

        if trade.is_delegated() {
            // `verify` fails closed, so a ledger outage here denies the
            // delegation rather than letting the trade through.
            let sub = trade
                .sub_account
                .as_ref()
                .unwrap_or_else(|| unreachable!("is_delegated implies sub_account"));
            // The sub-account trades as the admin side of the agreement;
            // the principal is the user whose capital is at stake.
            if !self.agreements.verify(sub, &trade.principal).await {
                return Err(PropdeskError::UnauthorizedDelegation {
                    principal: trade.principal.to_string(),
                    sub_account: sub.to_string(),
                });
            }
        }

        // Advisory figure only; the ledger recomputes the executed size.
        let position_size = trade.position_size();
        let submission = TradeSubmission {
            principal: trade.principal.clone(),
            sub_account: trade.sub_account.clone(),
            amount: trade.amount,
            order_type: trade.order_type,
            position_size,
        };

        let tx_ref = self
            .ledger
            .execute_trade(&submission)
            .await
            .map_err(|e| match e {
                LedgerError::Transport(msg) => PropdeskError::LedgerUnavailable(msg),
                LedgerError::Rejected { reason, .. } => PropdeskError::LedgerRejected(reason),
                LedgerError::NotFound(what) => PropdeskError::LedgerRejected(what),
            })?;

        info!(
            principal = %trade.principal,
            order_type = %trade.order_type,
            amount = %trade.amount,
            tx_ref = %tx_ref,
            "trade submitted"
        );

        Ok(TradeReceipt {
            tx_ref,
            principal: trade.principal.clone(),
            sub_account: trade.sub_account.clone(),
            amount: trade.amount,
            order_type: trade.order_type,
            position_size,
            submitted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, OrderType, RiskPercentage};
    use crate::ledger::{MemoryLedgerGateway, MockLedgerGateway};
    use rust_decimal_macros::dec;

    fn addr(n: u8) -> Address {
        format!("0x{:040x}", n).parse().unwrap()
    }

    fn executor_over(ledger: Arc<dyn LedgerGateway>) -> TradeExecutor {
        let agreements = Arc::new(AgreementService::new(ledger.clone(), None));
        TradeExecutor::new(ledger, agreements)
    }

    fn trade(principal: Address, sub: Option<Address>) -> DelegatedTrade {
        DelegatedTrade {
            principal,
            sub_account: sub,
            amount: dec!(1000),
            order_type: OrderType::Market,
            risk: RiskPercentage::Two,
        }
    }

    #[tokio::test]
    async fn self_trade_skips_the_delegation_gate() {
        let executor = executor_over(Arc::new(MemoryLedgerGateway::new()));
        let receipt = executor.execute(&trade(addr(1), None)).await.unwrap();
        assert_eq!(receipt.position_size, dec!(20.00));
        assert!(!receipt.tx_ref.is_empty());
    }

    #[tokio::test]
    async fn delegated_trade_without_agreement_is_unauthorized() {
        let executor = executor_over(Arc::new(MemoryLedgerGateway::new()));
        let err = executor
            .execute(&trade(addr(1), Some(addr(2))))
            .await
            .unwrap_err();
        assert!(matches!(err, PropdeskError::UnauthorizedDelegation { .. }));
    }

    #[tokio::test]
    async fn gate_fails_closed_when_ledger_is_down() {
        let mut mock = MockLedgerGateway::new();
        mock.expect_verify_trust_agreement()
            .returning(|_, _| Err(LedgerError::Transport("rpc down".to_string())));
        let executor = executor_over(Arc::new(mock));

        let err = executor
            .execute(&trade(addr(1), Some(addr(2))))
            .await
            .unwrap_err();
        assert!(matches!(err, PropdeskError::UnauthorizedDelegation { .. }));
    }

    #[tokio::test]
    async fn ledger_rejection_reason_is_surfaced_verbatim() {
        let mut mock = MockLedgerGateway::new();
        mock.expect_execute_trade().returning(|_| {
            Err(LedgerError::Rejected {
                code: Some("MARGIN".to_string()),
                reason: "margin requirements not met".to_string(),
            })
        });
        let executor = executor_over(Arc::new(mock));

        let err = executor.execute(&trade(addr(1), None)).await.unwrap_err();
        match err {
            PropdeskError::LedgerRejected(reason) => {
                assert_eq!(reason, "margin requirements not met")
            }
            other => panic!("expected LedgerRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_positive_amount_never_reaches_the_ledger() {
        let mock = MockLedgerGateway::new();
        let executor = executor_over(Arc::new(mock));
        let mut t = trade(addr(1), None);
        t.amount = dec!(0);
        assert!(matches!(
            executor.execute(&t).await,
            Err(PropdeskError::Validation(_))
        ));
    }
}
