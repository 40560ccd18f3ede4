pub mod initialize_market;
pub mod set_asset_config;
pub mod set_pause;
pub mod update_protocol_config;

pub use initialize_market::*;
pub use set_asset_config::*;
pub use set_pause::*;
pub use update_protocol_config::*;
