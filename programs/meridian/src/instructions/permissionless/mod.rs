pub mod accrue_interest;
pub mod liquidate;

pub use accrue_interest::*;
pub use liquidate::*;
