#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BackfillError, Result};
use crate::utils::validation::validate_required_input;
use std::collections::HashMap;
use std::fmt;

pub const INPUT_ORG: &str = "ORG";
pub const INPUT_TEAMS: &str = "TEAMS";
pub const INPUT_TOKEN: &str = "TOKEN";

/// Run configuration. Immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    pub organization: String,
    pub teams: Vec<String>,
    pub credential: String,
}

impl Configuration {
    pub fn load<C: ConfigProvider + ?Sized>(provider: &C) -> Result<Self> {
        tracing::info!("Parsing inputs");

        let organization = validate_required_input(INPUT_ORG, provider.input(INPUT_ORG))?;
        let teams = validate_required_input(INPUT_TEAMS, provider.input(INPUT_TEAMS))?;
        let credential = validate_required_input(INPUT_TOKEN, provider.input(INPUT_TOKEN))?;

        // 逗號分隔，不去重也不驗證 slug 格式
        let teams: Vec<String> = teams
            .split(',')
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
            .collect();
        if teams.is_empty() {
            return Err(BackfillError::config(format!(
                "Input {} must name at least one team",
                INPUT_TEAMS
            )));
        }

        tracing::debug!(org = %organization, teams = ?teams, "Inputs parsed");

        Ok(Self {
            organization: organization.to_string(),
            teams,
            credential: credential.to_string(),
        })
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("organization", &self.organization)
            .field("teams", &self.teams)
            .field("credential", &"***")
            .finish()
    }
}

impl ConfigProvider for HashMap<String, String> {
    fn input(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}
