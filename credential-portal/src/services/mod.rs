pub mod credential_client;
pub mod metrics;
