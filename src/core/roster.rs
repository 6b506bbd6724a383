use crate::core::{DirectoryProvider, Result, Roster};
use crate::utils::error::BackfillError;

/// Every member of the organization. Any page failure fails the whole fetch.
pub async fn fetch_org_members<P: DirectoryProvider + ?Sized>(
    provider: &P,
    org: &str,
) -> Result<Roster> {
    tracing::info!(org = %org, "Retrieving all org members for org {}", org);

    match provider.list_org_members(org).await {
        Ok(roster) => {
            tracing::debug!(org = %org, members = roster.len(), "Org roster fetched");
            Ok(roster)
        }
        Err(e) => {
            tracing::error!(org = %org, error = %e, "Failed getting org members");
            Err(BackfillError::fetch(format!("org members of {}", org), &e))
        }
    }
}

/// Current members of one team, identified by slug.
pub async fn fetch_team_members<P: DirectoryProvider + ?Sized>(
    provider: &P,
    org: &str,
    team: &str,
) -> Result<Roster> {
    tracing::info!(org = %org, team = %team, "Retrieving team membership for team {}", team);

    match provider.list_team_members(org, team).await {
        Ok(roster) => {
            tracing::debug!(team = %team, members = roster.len(), "Team roster fetched");
            Ok(roster)
        }
        Err(e) => {
            tracing::error!(org = %org, team = %team, error = %e, "Failed getting team members");
            Err(BackfillError::fetch(format!("team members of {}/{}", org, team), &e))
        }
    }
}
