pub mod config;
pub mod style;
pub mod testing;

pub use crate::config::Config;

/// The error types used through out this crate.
pub mod errors {
    pub use anyhow::{Error, Result};
}
