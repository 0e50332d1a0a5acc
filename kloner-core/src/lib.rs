pub mod config;
pub mod error;
pub mod error_utils;
pub mod format;
pub mod streak;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use format::*;
pub use streak::*;
pub use types::*;
