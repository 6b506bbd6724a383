// Adapters layer: concrete implementations for external systems.

pub mod github;
pub mod rate_limit;

pub use github::{ClientOptions, GitHubClient};
pub use rate_limit::{RateLimitPolicy, RetryConfig, ThrottlePolicy};
