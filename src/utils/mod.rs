// Utility functions
pub mod crypto;
pub mod error;
pub mod flash;
pub mod thread_pool;
pub mod validation;

pub use error::*;
pub use flash::{Flash, FlashKind};
