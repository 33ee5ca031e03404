//! In-memory ledger gateway.
//!
//! Backs dry-run mode and the test suite with the same interface as the
//! real bridge. State here is authoritative the way the chain would be:
//! headroom and delegation are re-checked on this side regardless of what
//! the client already validated.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::traits::{LedgerGateway, LedgerResult, TradeSubmission};
use crate::domain::{
    AdminPerformance, AdminStatus, Address, CapitalPool, PoolParams, ProfitShare, TrustAgreement,
};
use crate::error::LedgerError;

#[derive(Default)]
pub struct MemoryLedgerGateway {
    identities: DashMap<Address, ()>,
    statuses: DashMap<Address, AdminStatus>,
    performance: DashMap<Address, AdminPerformance>,
    agreements: DashMap<(Address, Address), TrustAgreement>,
    pools: DashMap<String, CapitalPool>,
    pool_traders: DashMap<String, HashSet<Address>>,
    registration_calls: AtomicUsize,
    // Serializes allocation check-then-act so concurrent sessions cannot
    // both pass the same headroom window.
    allocation_lock: Mutex<()>,
}

impl MemoryLedgerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the status the ledger reports for an address.
    pub fn set_admin_status(&self, address: Address, status: AdminStatus) {
        self.statuses.insert(address, status);
    }

    pub fn set_admin_performance(&self, address: Address, perf: AdminPerformance) {
        self.performance.insert(address, perf);
    }

    pub fn deactivate_pool(&self, pool_id: &str) {
        if let Some(mut pool) = self.pools.get_mut(pool_id) {
            pool.active = false;
        }
    }

    /// How many identity registrations actually reached the ledger.
    pub fn registration_calls(&self) -> usize {
        self.registration_calls.load(Ordering::SeqCst)
    }

    fn parse_terms_blob(terms_blob: &str) -> LedgerResult<(ProfitShare, String)> {
        let terms: crate::domain::AgreementTerms = serde_json::from_str(terms_blob)
            .map_err(|e| LedgerError::Rejected {
                code: Some("BAD_TERMS".to_string()),
                reason: format!("unparseable terms blob: {}", e),
            })?;
        let share = ProfitShare::from_percent(terms.profit_share).ok_or_else(|| {
            LedgerError::Rejected {
                code: Some("BAD_TERMS".to_string()),
                reason: format!("profit share {} not offered", terms.profit_share),
            }
        })?;
        Ok((share, terms.terms))
    }
}

#[async_trait]
impl LedgerGateway for MemoryLedgerGateway {
    async fn register_identity(
        &self,
        address: &Address,
        _credentials: &str,
        _proof: &str,
    ) -> LedgerResult<()> {
        self.registration_calls.fetch_add(1, Ordering::SeqCst);
        self.identities.insert(address.clone(), ());
        self.statuses
            .entry(address.clone())
            .or_insert(AdminStatus::Active);
        Ok(())
    }

    async fn create_trust_agreement(
        &self,
        admin: &Address,
        user: &Address,
        terms_blob: &str,
        signature: &str,
    ) -> LedgerResult<String> {
        if !self.identities.contains_key(admin) {
            return Err(LedgerError::Rejected {
                code: Some("UNREGISTERED".to_string()),
                reason: format!("admin {} has no registered identity", admin),
            });
        }
        let key = (admin.clone(), user.clone());
        if self.agreements.contains_key(&key) {
            return Err(LedgerError::Rejected {
                code: Some("DUPLICATE_AGREEMENT".to_string()),
                reason: format!("active agreement exists for {} / {}", admin, user),
            });
        }

        let (profit_share, terms) = Self::parse_terms_blob(terms_blob)?;
        let id = Uuid::new_v4().to_string();
        self.agreements.insert(
            key,
            TrustAgreement {
                id: id.clone(),
                admin_address: admin.clone(),
                user_address: user.clone(),
                profit_share,
                terms,
                created_at: Utc::now(),
                signature: signature.to_string(),
            },
        );
        Ok(id)
    }

    async fn check_admin_status(&self, address: &Address) -> LedgerResult<AdminStatus> {
        self.statuses
            .get(address)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::NotFound(format!("admin {}", address)))
    }

    async fn get_admin_performance(&self, address: &Address) -> LedgerResult<AdminPerformance> {
        Ok(self
            .performance
            .get(address)
            .map(|entry| *entry.value())
            .unwrap_or(AdminPerformance {
                trust_score: 0,
                total_managed_accounts: 0,
                success_rate: 0,
            }))
    }

    async fn verify_trust_agreement(&self, admin: &Address, user: &Address) -> LedgerResult<bool> {
        Ok(self
            .agreements
            .contains_key(&(admin.clone(), user.clone())))
    }

    async fn find_trust_agreement(
        &self,
        admin: &Address,
        user: &Address,
    ) -> LedgerResult<Option<TrustAgreement>> {
        Ok(self
            .agreements
            .get(&(admin.clone(), user.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn create_pool(
        &self,
        admin: &Address,
        total_amount: Decimal,
        params: &PoolParams,
    ) -> LedgerResult<String> {
        if total_amount <= Decimal::ZERO {
            return Err(LedgerError::Rejected {
                code: Some("BAD_AMOUNT".to_string()),
                reason: format!("pool total must be positive: {}", total_amount),
            });
        }
        let id = Uuid::new_v4().to_string();
        self.pools.insert(
            id.clone(),
            CapitalPool {
                id: id.clone(),
                admin_address: admin.clone(),
                total_amount,
                allocated_amount: Decimal::ZERO,
                active: true,
                traders_count: 0,
                params: params.clone(),
            },
        );
        self.pool_traders.insert(id.clone(), HashSet::new());
        Ok(id)
    }

    async fn get_pool(&self, pool_id: &str) -> LedgerResult<Option<CapitalPool>> {
        Ok(self.pools.get(pool_id).map(|entry| entry.value().clone()))
    }

    async fn list_pools(&self, admin: &Address) -> LedgerResult<Vec<CapitalPool>> {
        let mut pools: Vec<CapitalPool> = self
            .pools
            .iter()
            .filter(|entry| entry.value().admin_address == *admin)
            .map(|entry| entry.value().clone())
            .collect();
        pools.sort_by(|a, b| b.params.created_at.cmp(&a.params.created_at));
        Ok(pools)
    }

    async fn allocate_to_beginner(
        &self,
        trader: &Address,
        pool_id: &str,
        amount: Decimal,
    ) -> LedgerResult<()> {
        let _guard = self
            .allocation_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut pool = self
            .pools
            .get_mut(pool_id)
            .ok_or_else(|| LedgerError::NotFound(format!("pool {}", pool_id)))?;
        if !pool.active {
            return Err(LedgerError::Rejected {
                code: Some("POOL_INACTIVE".to_string()),
                reason: format!("pool {} is inactive", pool_id),
            });
        }
        if amount > pool.headroom() {
            return Err(LedgerError::Rejected {
                code: Some("INSUFFICIENT_HEADROOM".to_string()),
                reason: format!(
                    "requested {} exceeds headroom {}",
                    amount,
                    pool.headroom()
                ),
            });
        }

        pool.allocated_amount += amount;
        let mut traders = self
            .pool_traders
            .entry(pool_id.to_string())
            .or_default();
        if traders.insert(trader.clone()) {
            pool.traders_count += 1;
        }
        Ok(())
    }

    async fn execute_trade(&self, submission: &TradeSubmission) -> LedgerResult<String> {
        if let Some(sub) = &submission.sub_account {
            if *sub != submission.principal {
                // Delegation rides on the agreement where the sub-account
                // is the admin and the principal is the user.
                let delegated = self
                    .agreements
                    .contains_key(&(sub.clone(), submission.principal.clone()));
                if !delegated {
                    return Err(LedgerError::Rejected {
                        code: Some("NO_AGREEMENT".to_string()),
                        reason: format!(
                            "no trust agreement between {} and {}",
                            submission.principal, sub
                        ),
                    });
                }
            }
        }
        if submission.amount <= Decimal::ZERO {
            return Err(LedgerError::Rejected {
                code: Some("BAD_AMOUNT".to_string()),
                reason: format!("trade amount must be positive: {}", submission.amount),
            });
        }
        Ok(format!("0xmem{}", Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderType;
    use rust_decimal_macros::dec;

    fn addr(n: u8) -> Address {
        format!("0x{:040x}", n).parse().unwrap()
    }

    #[tokio::test]
    async fn allocation_is_rejected_beyond_headroom() {
        let ledger = MemoryLedgerGateway::new();
        let admin = addr(1);
        let params = PoolParams::for_total(dec!(50000), Utc::now());
        let pool_id = ledger.create_pool(&admin, dec!(50000), &params).await.unwrap();

        ledger
            .allocate_to_beginner(&addr(2), &pool_id, dec!(45000))
            .await
            .unwrap();
        let err = ledger
            .allocate_to_beginner(&addr(3), &pool_id, dec!(6000))
            .await
            .unwrap_err();
        assert!(err.is_headroom_rejection());
    }

    #[tokio::test]
    async fn traders_count_increments_only_for_new_traders() {
        let ledger = MemoryLedgerGateway::new();
        let admin = addr(1);
        let params = PoolParams::for_total(dec!(100000), Utc::now());
        let pool_id = ledger
            .create_pool(&admin, dec!(100000), &params)
            .await
            .unwrap();

        ledger
            .allocate_to_beginner(&addr(2), &pool_id, dec!(1000))
            .await
            .unwrap();
        ledger
            .allocate_to_beginner(&addr(2), &pool_id, dec!(1000))
            .await
            .unwrap();
        ledger
            .allocate_to_beginner(&addr(3), &pool_id, dec!(1000))
            .await
            .unwrap();

        let pool = ledger.get_pool(&pool_id).await.unwrap().unwrap();
        assert_eq!(pool.traders_count, 2);
        assert_eq!(pool.allocated_amount, dec!(3000));
    }

    #[tokio::test]
    async fn delegated_trade_requires_agreement_ledger_side() {
        let ledger = MemoryLedgerGateway::new();
        let submission = TradeSubmission {
            principal: addr(1),
            sub_account: Some(addr(2)),
            amount: dec!(100),
            order_type: OrderType::Market,
            position_size: dec!(1),
        };
        assert!(ledger.execute_trade(&submission).await.is_err());
    }
}
