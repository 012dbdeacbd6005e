//! HTTP proxy in front of the analysis backend, plus chapter segmentation and health.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;
