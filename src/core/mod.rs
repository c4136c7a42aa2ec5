pub mod config;
pub mod config_loader;
pub mod error;
pub mod retry;
pub mod traits;

pub use error::*;
pub use retry::*;
pub use traits::*;
