//! LUCA Core - Types, records, and error handling shared by the engine and gateway

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
