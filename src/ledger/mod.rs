pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpLedgerGateway;
pub use memory::MemoryLedgerGateway;
pub use traits::{LedgerGateway, LedgerResult, TradeSubmission};

#[cfg(test)]
pub use traits::MockLedgerGateway;
