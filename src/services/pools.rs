//! Capital pool and allocation management.
//!
//! Per-trader bounds (1%..10% of the pool total) are fixed at creation time
//! so later pool amount changes never retroactively move them. Headroom
//! checks are check-then-act: the client pre-validates against its latest
//! read, but the ledger's acceptance of the allocation is the arbiter, and
//! a ledger-side headroom rejection is a normal, non-fatal outcome.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::cache::DisplayCache;
use crate::domain::{Address, Allocation, CapitalPool, PoolParams};
use crate::error::{LedgerError, PropdeskError, Result};
use crate::ledger::LedgerGateway;
use crate::validation::{
    check_allocation_bounds, check_allocation_headroom, validate_positive_amount,
};

pub struct PoolService {
    ledger: Arc<dyn LedgerGateway>,
    cache: Arc<DisplayCache>,
}

impl PoolService {
    pub fn new(ledger: Arc<dyn LedgerGateway>, cache: Arc<DisplayCache>) -> Self {
        Self { ledger, cache }
    }

    /// Create a pool with allocation bounds derived once from the total.
    #[instrument(skip(self))]
    pub async fn create_pool(&self, admin: &Address, total_amount: Decimal) -> Result<CapitalPool> {
        validate_positive_amount(total_amount, "pool total")?;

        let params = PoolParams::for_total(total_amount, Utc::now());
        let pool_id = self
            .ledger
            .create_pool(admin, total_amount, &params)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))?;

        info!(admin = %admin, pool_id = %pool_id, total = %total_amount, "pool created");
        self.cache.invalidate(admin);

        Ok(CapitalPool {
            id: pool_id,
            admin_address: admin.clone(),
            total_amount,
            allocated_amount: Decimal::ZERO,
            active: true,
            traders_count: 0,
            params,
        })
    }

    /// Allocate pool capital to a trader.
    ///
    /// Checks run in order, first failure wins: pool exists and is active,
    /// amount within the pool's fixed bounds, amount within headroom. Then
    /// the ledger call decides for real.
    #[instrument(skip(self))]
    pub async fn allocate(
        &self,
        pool_id: &str,
        trader: &Address,
        amount: Decimal,
    ) -> Result<Allocation> {
        let pool = self
            .ledger
            .get_pool(pool_id)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))?
            .ok_or_else(|| PropdeskError::PoolNotFound(pool_id.to_string()))?;

        if !pool.active {
            return Err(PropdeskError::PoolInactive(pool_id.to_string()));
        }
        check_allocation_bounds(&pool, amount)?;
        check_allocation_headroom(&pool, amount)?;

        self.ledger
            .allocate_to_beginner(trader, pool_id, amount)
            .await
            .map_err(|e| Self::classify_allocation_error(e, &pool, amount))?;

        info!(pool_id = %pool_id, trader = %trader, amount = %amount, "capital allocated");
        self.cache.invalidate(&pool.admin_address);

        Ok(Allocation {
            pool_id: pool_id.to_string(),
            trader_address: trader.clone(),
            amount,
            allocated_at: Utc::now(),
        })
    }

    /// Pools owned by an admin, creation time descending.
    ///
    /// Always fetched from the ledger; the result refreshes the display
    /// cache as a side effect.
    pub async fn list_pools(&self, admin: &Address) -> Result<Vec<CapitalPool>> {
        let mut pools = self
            .ledger
            .list_pools(admin)
            .await
            .map_err(|e| PropdeskError::LedgerUnavailable(e.to_string()))?;
        pools.sort_by(|a, b| b.params.created_at.cmp(&a.params.created_at));
        self.cache.store_pools(admin, pools.clone());
        Ok(pools)
    }

    fn classify_allocation_error(
        err: LedgerError,
        pool: &CapitalPool,
        amount: Decimal,
    ) -> PropdeskError {
        // A concurrent allocation from another session can invalidate the
        // client-side pass; the ledger's rejection is the expected report.
        if err.is_headroom_rejection() {
            return PropdeskError::InsufficientHeadroom {
                requested: amount,
                available: pool.headroom(),
            };
        }
        match err {
            LedgerError::NotFound(_) => PropdeskError::PoolNotFound(pool.id.clone()),
            LedgerError::Rejected { code, reason } => {
                if code.as_deref() == Some("POOL_INACTIVE") {
                    PropdeskError::PoolInactive(pool.id.clone())
                } else {
                    PropdeskError::LedgerRejected(reason)
                }
            }
            LedgerError::Transport(msg) => PropdeskError::LedgerUnavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MemoryLedgerGateway, MockLedgerGateway};
    use rust_decimal_macros::dec;

    fn addr(n: u8) -> Address {
        format!("0x{:040x}", n).parse().unwrap()
    }

    fn service_over(ledger: Arc<dyn LedgerGateway>) -> PoolService {
        PoolService::new(ledger, Arc::new(DisplayCache::new()))
    }

    #[tokio::test]
    async fn create_pool_rejects_non_positive_total() {
        let service = service_over(Arc::new(MemoryLedgerGateway::new()));
        assert!(matches!(
            service.create_pool(&addr(1), dec!(0)).await.unwrap_err(),
            PropdeskError::Validation(_)
        ));
        assert!(matches!(
            service.create_pool(&addr(1), dec!(-10)).await.unwrap_err(),
            PropdeskError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn create_pool_derives_fixed_bounds() {
        let service = service_over(Arc::new(MemoryLedgerGateway::new()));
        let pool = service.create_pool(&addr(1), dec!(100000)).await.unwrap();
        assert_eq!(pool.params.min_allocation, dec!(1000.00));
        assert_eq!(pool.params.max_allocation, dec!(10000.00));
        assert_eq!(pool.allocated_amount, Decimal::ZERO);
        assert!(pool.active);
    }

    #[tokio::test]
    async fn allocate_checks_run_in_order() {
        let ledger = Arc::new(MemoryLedgerGateway::new());
        let service = service_over(ledger.clone());
        let admin = addr(1);
        let pool = service.create_pool(&admin, dec!(100000)).await.unwrap();

        // (a) unknown pool
        assert!(matches!(
            service.allocate("no-such-pool", &addr(2), dec!(5000)).await,
            Err(PropdeskError::PoolNotFound(_))
        ));

        // (a) inactive pool wins over a bounds violation
        ledger.deactivate_pool(&pool.id);
        assert!(matches!(
            service.allocate(&pool.id, &addr(2), dec!(500)).await,
            Err(PropdeskError::PoolInactive(_))
        ));
    }

    #[tokio::test]
    async fn allocate_enforces_bounds() {
        let service = service_over(Arc::new(MemoryLedgerGateway::new()));
        let pool = service.create_pool(&addr(1), dec!(100000)).await.unwrap();

        // Below 1% = 1000
        assert!(matches!(
            service.allocate(&pool.id, &addr(2), dec!(500)).await,
            Err(PropdeskError::OutOfBounds { .. })
        ));
        // Above 10% = 10000
        assert!(matches!(
            service.allocate(&pool.id, &addr(2), dec!(15000)).await,
            Err(PropdeskError::OutOfBounds { .. })
        ));
        // In range
        assert!(service.allocate(&pool.id, &addr(2), dec!(5000)).await.is_ok());
    }

    #[tokio::test]
    async fn allocated_amount_equals_sum_of_accepted_allocations() {
        let ledger = Arc::new(MemoryLedgerGateway::new());
        let service = service_over(ledger.clone());
        let pool = service.create_pool(&addr(1), dec!(100000)).await.unwrap();

        for (trader, amount) in [(2u8, dec!(5000)), (3, dec!(3000)), (4, dec!(7000))] {
            service
                .allocate(&pool.id, &addr(trader), amount)
                .await
                .unwrap();
        }

        let current = ledger.get_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(current.allocated_amount, dec!(15000));
        assert!(current.allocated_amount <= current.total_amount);
        assert_eq!(current.traders_count, 3);
    }

    #[tokio::test]
    async fn allocate_enforces_headroom() {
        let ledger = Arc::new(MemoryLedgerGateway::new());
        let service = service_over(ledger.clone());
        let admin = addr(1);
        let pool = service.create_pool(&admin, dec!(50000)).await.unwrap();

        // Fill to 45000 (max single allocation is 10% = 5000)
        for trader in 2u8..11 {
            service
                .allocate(&pool.id, &addr(trader), dec!(5000))
                .await
                .unwrap();
        }
        // 4000 fits the remaining 5000
        service.allocate(&pool.id, &addr(11), dec!(4000)).await.unwrap();
        // Another 4000 exceeds the remaining 1000
        assert!(matches!(
            service.allocate(&pool.id, &addr(12), dec!(4000)).await,
            Err(PropdeskError::InsufficientHeadroom { .. })
        ));
    }

    #[tokio::test]
    async fn ledger_side_headroom_rejection_is_reported_as_headroom() {
        // Client-side pass, ledger rejects (concurrent session took the room).
        let mut mock = MockLedgerGateway::new();
        mock.expect_get_pool().returning(|pool_id| {
            Ok(Some(CapitalPool {
                id: pool_id.to_string(),
                admin_address: "0x0000000000000000000000000000000000000001"
                    .parse()
                    .unwrap(),
                total_amount: dec!(100000),
                allocated_amount: dec!(90000),
                active: true,
                traders_count: 9,
                params: PoolParams::for_total(dec!(100000), Utc::now()),
            }))
        });
        mock.expect_allocate_to_beginner().returning(|_, _, _| {
            Err(LedgerError::Rejected {
                code: Some("INSUFFICIENT_HEADROOM".to_string()),
                reason: "headroom exhausted".to_string(),
            })
        });
        let service = service_over(Arc::new(mock));

        let err = service
            .allocate("pool-1", &addr(2), dec!(5000))
            .await
            .unwrap_err();
        assert!(matches!(err, PropdeskError::InsufficientHeadroom { .. }));
    }

    #[tokio::test]
    async fn list_pools_orders_by_creation_desc_and_fills_cache() {
        let ledger = Arc::new(MemoryLedgerGateway::new());
        let cache = Arc::new(DisplayCache::new());
        let service = PoolService::new(ledger.clone(), cache.clone());
        let admin = addr(1);

        let first = service.create_pool(&admin, dec!(10000)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = service.create_pool(&admin, dec!(20000)).await.unwrap();

        let pools = service.list_pools(&admin).await.unwrap();
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].id, second.id);
        assert_eq!(pools[1].id, first.id);

        let cached = cache.pools(&admin).expect("listing should be cached");
        assert_eq!(cached.pools.len(), 2);
    }
}
