pub mod boost_yield;
pub mod exchange;
pub mod flash_loan;
pub mod supply_liquidity;

pub use boost_yield::*;
pub use exchange::*;
pub use flash_loan::*;
pub use supply_liquidity::*;
