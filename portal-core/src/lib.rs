//! portal-core: Shared infrastructure for the credential portal.
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use serde;
pub use tracing;
