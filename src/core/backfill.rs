use crate::config::Configuration;
use crate::core::roster::{fetch_org_members, fetch_team_members};
use crate::core::writer::add_member;
use crate::core::{DirectoryProvider, Result, Roster, RunReport, TeamOutcome};
use crate::domain::model::AddFailure;
use crate::domain::services::missing;
use crate::utils::error::BackfillError;

pub struct BackfillEngine<P: DirectoryProvider> {
    provider: P,
    dry_run: bool,
}

impl<P: DirectoryProvider> BackfillEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Fetch errors abort the run; failed additions are recorded in the report.
    pub async fn run(&self, config: &Configuration) -> Result<RunReport> {
        let org = config.organization.as_str();

        // org roster 只抓一次，之後每個 team 共用
        let org_roster = fetch_org_members(&self.provider, org).await?;
        tracing::info!(org = %org, members = org_roster.len(), "Org roster ready");

        let mut report = RunReport {
            organization: org.to_string(),
            dry_run: self.dry_run,
            teams: Vec::with_capacity(config.teams.len()),
        };

        for team in &config.teams {
            let team_roster = fetch_team_members(&self.provider, org, team).await?;
            let outcome = self.backfill_team(org, team, &org_roster, &team_roster).await;
            report.teams.push(outcome);
        }

        Ok(report)
    }

    async fn backfill_team(
        &self,
        org: &str,
        team: &str,
        org_roster: &Roster,
        team_roster: &Roster,
    ) -> TeamOutcome {
        let pending = missing(org_roster, team_roster);
        tracing::info!(
            team = %team,
            team_members = team_roster.len(),
            missing = pending.len(),
            "Computed missing members for team {}",
            team
        );

        let mut outcome = TeamOutcome {
            team: team.to_string(),
            ..Default::default()
        };

        for member in pending {
            if self.dry_run {
                tracing::info!(
                    member = %member,
                    team = %team,
                    "[dry-run] Would add user {} to team {}",
                    member,
                    team
                );
                outcome.added.push(member);
                continue;
            }

            match add_member(&self.provider, &member, org, team).await {
                Ok(()) => outcome.added.push(member),
                Err(BackfillError::WriteError {
                    team,
                    member,
                    message,
                }) => outcome.failures.push(AddFailure {
                    team,
                    member,
                    message,
                }),
                Err(other) => outcome.failures.push(AddFailure {
                    team: team.to_string(),
                    member,
                    message: other.to_string(),
                }),
            }
        }

        outcome
    }
}
