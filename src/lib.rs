pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{ClientOptions, GitHubClient, RateLimitPolicy, RetryConfig, ThrottlePolicy};
pub use config::Configuration;
pub use core::backfill::BackfillEngine;
pub use domain::model::{AddFailure, Roster, RunReport, TeamOutcome};
pub use utils::error::{BackfillError, Result};
