pub mod borrow;
pub mod create_position;
pub mod exit_position;
pub mod repay;
pub mod supply_collateral;
pub mod transfer_collateral;
pub mod withdraw_collateral;

pub use borrow::*;
pub use create_position::*;
pub use exit_position::*;
pub use repay::*;
pub use supply_collateral::*;
pub use transfer_collateral::*;
pub use withdraw_collateral::*;
