pub mod address;
pub mod agreement;
pub mod pool;
pub mod trade;
pub mod verification;

pub use address::*;
pub use agreement::*;
pub use pool::*;
pub use trade::*;
pub use verification::*;
