use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::Address;

/// Per-pool parameters fixed at creation time.
///
/// The bounds are derived from the pool total once and stored, so later
/// changes to the pool amount do not retroactively move per-trader limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolParams {
    pub min_allocation: Decimal,
    pub max_allocation: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PoolParams {
    pub fn for_total(total_amount: Decimal, created_at: DateTime<Utc>) -> Self {
        Self {
            min_allocation: total_amount * dec!(0.01),
            max_allocation: total_amount * dec!(0.10),
            created_at,
        }
    }
}

/// Admin-managed pool of capital sub-allocated to individual traders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalPool {
    pub id: String,
    pub admin_address: Address,
    pub total_amount: Decimal,
    pub allocated_amount: Decimal,
    pub active: bool,
    pub traders_count: u32,
    pub params: PoolParams,
}

impl CapitalPool {
    /// Unallocated remainder of the pool.
    pub fn headroom(&self) -> Decimal {
        self.total_amount - self.allocated_amount
    }
}

/// A single sub-allocation of pool capital to one trader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub pool_id: String,
    pub trader_address: Address,
    pub amount: Decimal,
    pub allocated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn params_derive_one_and_ten_percent_bounds() {
        let params = PoolParams::for_total(dec!(100000), Utc::now());
        assert_eq!(params.min_allocation, dec!(1000.00));
        assert_eq!(params.max_allocation, dec!(10000.00));
    }

    #[test]
    fn headroom_is_total_minus_allocated() {
        let pool = CapitalPool {
            id: "pool-1".to_string(),
            admin_address: "0x1111111111111111111111111111111111111111"
                .parse()
                .unwrap(),
            total_amount: dec!(50000),
            allocated_amount: dec!(45000),
            active: true,
            traders_count: 4,
            params: PoolParams::for_total(dec!(50000), Utc::now()),
        };
        assert_eq!(pool.headroom(), dec!(5000));
    }
}
