//! HTTP client for the analysis backend with a validated response schema.

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::BackendClient;
pub use error::BackendError;
pub use types::{AnalysisReport, AnalyzeRequest, DeepReport, ElementStats, Pillar, Pillars};
