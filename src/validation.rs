//! Input validation for delegation and pool operations
//!
//! Validation and precondition failures are resolved locally and never
//! reach the ledger; every check here runs before a gateway call is made.

use rust_decimal::Decimal;

use crate::domain::{Address, CapitalPool, ProfitShare};
use crate::error::{PropdeskError, Result};

/// Validate that an amount is strictly positive
pub fn validate_positive_amount(amount: Decimal, field_name: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(PropdeskError::Validation(format!(
            "{} must be positive: {}",
            field_name, amount
        )));
    }
    Ok(())
}

/// Validate a raw profit-share percentage against the offered tiers
pub fn validate_profit_share(percent: u8) -> Result<ProfitShare> {
    ProfitShare::from_percent(percent).ok_or_else(|| {
        PropdeskError::Validation(format!(
            "profit share {}% is not one of the offered tiers (10/15/20/25/30)",
            percent
        ))
    })
}

/// Validate that an agreement binds two distinct parties
pub fn validate_distinct_parties(admin: &Address, user: &Address) -> Result<()> {
    if admin == user {
        return Err(PropdeskError::Validation(format!(
            "admin and user addresses must differ: {}",
            admin
        )));
    }
    Ok(())
}

/// Check an allocation amount against a pool's fixed per-trader bounds
pub fn check_allocation_bounds(pool: &CapitalPool, amount: Decimal) -> Result<()> {
    if amount < pool.params.min_allocation || amount > pool.params.max_allocation {
        return Err(PropdeskError::OutOfBounds {
            amount,
            min: pool.params.min_allocation,
            max: pool.params.max_allocation,
        });
    }
    Ok(())
}

/// Check an allocation amount against a pool's current headroom
///
/// Advisory only: the ledger's acceptance is the true arbiter, this check
/// just avoids a doomed ledger call when the client already knows better.
pub fn check_allocation_headroom(pool: &CapitalPool, amount: Decimal) -> Result<()> {
    let available = pool.headroom();
    if amount > available {
        return Err(PropdeskError::InsufficientHeadroom {
            requested: amount,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PoolParams;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn pool(total: Decimal, allocated: Decimal) -> CapitalPool {
        CapitalPool {
            id: "pool-1".to_string(),
            admin_address: "0x1111111111111111111111111111111111111111"
                .parse()
                .unwrap(),
            total_amount: total,
            allocated_amount: allocated,
            active: true,
            traders_count: 0,
            params: PoolParams::for_total(total, Utc::now()),
        }
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(dec!(1), "total").is_ok());
        assert!(validate_positive_amount(dec!(0), "total").is_err());
        assert!(validate_positive_amount(dec!(-5), "total").is_err());
    }

    #[test]
    fn test_validate_profit_share() {
        assert!(validate_profit_share(20).is_ok());
        assert!(validate_profit_share(12).is_err());
    }

    #[test]
    fn test_validate_distinct_parties() {
        let a: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();
        let b: Address = "0x2222222222222222222222222222222222222222"
            .parse()
            .unwrap();
        assert!(validate_distinct_parties(&a, &b).is_ok());
        assert!(validate_distinct_parties(&a, &a).is_err());
    }

    #[test]
    fn test_allocation_bounds() {
        let p = pool(dec!(100000), dec!(0));
        // Below 1% = 1000
        assert!(matches!(
            check_allocation_bounds(&p, dec!(500)),
            Err(PropdeskError::OutOfBounds { .. })
        ));
        // Above 10% = 10000
        assert!(matches!(
            check_allocation_bounds(&p, dec!(15000)),
            Err(PropdeskError::OutOfBounds { .. })
        ));
        assert!(check_allocation_bounds(&p, dec!(5000)).is_ok());
    }

    #[test]
    fn test_allocation_headroom() {
        let p = pool(dec!(50000), dec!(45000));
        assert!(check_allocation_headroom(&p, dec!(4000)).is_ok());
        assert!(matches!(
            check_allocation_headroom(&p, dec!(6000)),
            Err(PropdeskError::InsufficientHeadroom { .. })
        ));
    }
}
