//! LUCA Gateway - JSON HTTP surface for the analysis engine

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, start_gateway, AppState, ExtendedConfig};
