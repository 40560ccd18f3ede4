pub mod asset;
pub mod market;
pub mod position;

pub use asset::*;
pub use market::*;
pub use position::*;
