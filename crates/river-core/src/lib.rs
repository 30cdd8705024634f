pub mod config;
pub mod error;
pub mod resolve;
pub mod runnable;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::error::{RiverError, Result};
    pub use crate::resolve::{Deferred, Ready, Resolve, defer};
    pub use crate::runnable::Runnable;
}
