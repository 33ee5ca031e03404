use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AdminPerformance, AdminStatus, Address, CapitalPool, OrderType, PoolParams, TrustAgreement,
};
use crate::error::LedgerError;

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Trade submission payload sent to the ledger's execution entry point.
///
/// `position_size` is the client's advisory `amount × risk` figure; the
/// ledger recomputes the executed size and never trusts this value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSubmission {
    pub principal: Address,
    pub sub_account: Option<Address>,
    pub amount: Decimal,
    pub order_type: OrderType,
    pub position_size: Decimal,
}

/// Abstraction over the on-chain registries (identity, trust-agreement,
/// pool, trade). Any concrete ledger must satisfy these operations; they
/// behave as remote calls with network-failure semantics.
///
/// Components receive a gateway by injection so they stay testable against
/// a double implementing the same interface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Register identity credentials and proof for a candidate address.
    async fn register_identity(
        &self,
        address: &Address,
        credentials: &str,
        proof: &str,
    ) -> LedgerResult<()>;

    /// Submit a trust agreement; returns the ledger agreement id.
    async fn create_trust_agreement(
        &self,
        admin: &Address,
        user: &Address,
        terms_blob: &str,
        signature: &str,
    ) -> LedgerResult<String>;

    /// Current standing of an admin address.
    async fn check_admin_status(&self, address: &Address) -> LedgerResult<AdminStatus>;

    /// Dashboard performance metrics for an admin address.
    async fn get_admin_performance(&self, address: &Address) -> LedgerResult<AdminPerformance>;

    /// Does a trust agreement exist for this exact (admin, user) pair?
    async fn verify_trust_agreement(&self, admin: &Address, user: &Address) -> LedgerResult<bool>;

    /// Fetch the agreement for a pair, if any.
    async fn find_trust_agreement(
        &self,
        admin: &Address,
        user: &Address,
    ) -> LedgerResult<Option<TrustAgreement>>;

    /// Create a capital pool; returns the ledger pool id.
    async fn create_pool(
        &self,
        admin: &Address,
        total_amount: Decimal,
        params: &PoolParams,
    ) -> LedgerResult<String>;

    /// Fetch a single pool by id.
    async fn get_pool(&self, pool_id: &str) -> LedgerResult<Option<CapitalPool>>;

    /// Pools owned by an admin, creation time descending.
    async fn list_pools(&self, admin: &Address) -> LedgerResult<Vec<CapitalPool>>;

    /// Allocate pool capital to a trader. The ledger's acceptance is the
    /// authoritative headroom arbiter.
    async fn allocate_to_beginner(
        &self,
        trader: &Address,
        pool_id: &str,
        amount: Decimal,
    ) -> LedgerResult<()>;

    /// Submit a trade; returns the ledger transaction reference.
    async fn execute_trade(&self, submission: &TradeSubmission) -> LedgerResult<String>;
}
