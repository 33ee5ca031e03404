pub mod agreements;
pub mod pools;
pub mod trading;
pub mod verification;

pub use agreements::AgreementService;
pub use pools::PoolService;
pub use trading::TradeExecutor;
pub use verification::VerificationWorkflow;
