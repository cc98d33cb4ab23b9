//! Inference client abstraction layer.
//!
//! Provides a trait-based interface over the remote classification endpoint:
//! - HTTP client for the `/predict` and `/labels` wire contract
//! - Timeout wrapper for callers that want a deadline
//! - Mock client for testing

pub mod http;
pub mod mock;
pub mod timeout;
pub mod traits;

pub use http::{HealthReport, HttpClassificationClient};
pub use mock::MockClient;
pub use timeout::TimeoutClient;
pub use traits::{ClassificationClient, ClientError};
