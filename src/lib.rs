pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod services;
pub mod signing;
pub mod validation;

pub use cache::DisplayCache;
pub use config::AppConfig;
pub use domain::{
    AdminPerformance, AdminStatus, AdminVerificationState, Address, Allocation, CapitalPool,
    DelegatedTrade, OrderType, PoolParams, ProfitShare, RiskPercentage, TradeReceipt,
    TrustAgreement, VerificationStage,
};
pub use error::{LedgerError, PropdeskError, Result};
pub use ledger::{HttpLedgerGateway, LedgerGateway, MemoryLedgerGateway, TradeSubmission};
pub use services::{AgreementService, PoolService, TradeExecutor, VerificationWorkflow};
pub use signing::RequestSigner;
