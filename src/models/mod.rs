pub mod review;
pub mod store;
pub mod user;

pub use review::*;
pub use store::*;
pub use user::*;
