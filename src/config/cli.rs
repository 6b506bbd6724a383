use crate::config::{INPUT_ORG, INPUT_TEAMS, INPUT_TOKEN};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_url, Validate};
use clap::builder::BoolishValueParser;
use clap::Parser;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Every input can come from a flag or from the action's `INPUT_*` environment.
#[derive(Clone, Parser)]
#[command(name = "team-backfill")]
#[command(about = "Add every organization member to the listed teams")]
pub struct CliConfig {
    #[arg(long, env = "INPUT_ORG", help = "Organization login")]
    pub org: Option<String>,

    #[arg(long, env = "INPUT_TEAMS", help = "Comma-separated team slugs")]
    pub teams: Option<String>,

    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true, help = "Access token")]
    pub token: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(
        long,
        env = "INPUT_DRY_RUN",
        value_parser = BoolishValueParser::new(),
        help = "Log planned additions without writing them"
    )]
    pub dry_run: bool,

    #[arg(long, help = "Print the run report as JSON on stdout")]
    pub json_report: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn input(&self, name: &str) -> Option<&str> {
        match name {
            INPUT_ORG => self.org.as_deref(),
            INPUT_TEAMS => self.teams.as_deref(),
            INPUT_TOKEN => self.token.as_deref(),
            _ => None,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_url", &self.api_url)?;
        Ok(())
    }
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("org", &self.org)
            .field("teams", &self.teams)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .field("json_report", &self.json_report)
            .field("json_logs", &self.json_logs)
            .field("verbose", &self.verbose)
            .finish()
    }
}
