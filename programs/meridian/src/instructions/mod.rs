pub mod admin;
pub mod permissionless;
pub mod pool;
pub mod user;

pub use admin::*;
pub use permissionless::*;
pub use pool::*;
pub use user::*;
