use crate::core::{DirectoryProvider, Result};
use crate::domain::model::MembershipRequest;
use crate::utils::error::BackfillError;

/// Adds one member to a team with role `member`.
///
/// The error is returned to the caller, which records it and moves on; nothing
/// here retries beyond what the provider already did.
pub async fn add_member<P: DirectoryProvider + ?Sized>(
    provider: &P,
    member: &str,
    org: &str,
    team: &str,
) -> Result<()> {
    tracing::info!(member = %member, team = %team, "Adding user {} to team {}", member, team);

    let request = MembershipRequest::member(org, team, member);
    provider.add_team_member(&request).await.map_err(|e| {
        tracing::error!(
            member = %member,
            team = %team,
            error = %e,
            "Failed adding user {} to team {}",
            member,
            team
        );
        BackfillError::WriteError {
            team: team.to_string(),
            member: member.to_string(),
            message: e.to_string(),
        }
    })
}
