//! Advisory display cache keyed by address.
//!
//! Holds the last pool listing fetched for an admin so presentation layers
//! can render without a round trip. Never a system of record: no decision
//! logic reads from here, and entries are overwritten wholesale on refresh.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::{Address, CapitalPool};

#[derive(Debug, Clone)]
pub struct PoolListing {
    pub pools: Vec<CapitalPool>,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct DisplayCache {
    pool_listings: DashMap<Address, PoolListing>,
}

impl DisplayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_pools(&self, admin: &Address, pools: Vec<CapitalPool>) {
        self.pool_listings.insert(
            admin.clone(),
            PoolListing {
                pools,
                refreshed_at: Utc::now(),
            },
        );
    }

    pub fn pools(&self, admin: &Address) -> Option<PoolListing> {
        self.pool_listings.get(admin).map(|entry| entry.clone())
    }

    pub fn invalidate(&self, admin: &Address) {
        self.pool_listings.remove(admin);
    }
}
