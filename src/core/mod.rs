pub mod backfill;
pub mod roster;
pub mod writer;

pub use crate::domain::model::{Roster, RunReport, TeamOutcome};
pub use crate::domain::ports::DirectoryProvider;
pub use crate::utils::error::Result;
