use crate::domain::model::{MembershipRequest, Roster};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Named inputs of the execution environment (ORG, TEAMS, TOKEN, ...).
pub trait ConfigProvider: Send + Sync {
    fn input(&self, name: &str) -> Option<&str>;
}

/// Organization and team membership provider.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    async fn list_org_members(&self, org: &str) -> Result<Roster>;
    async fn list_team_members(&self, org: &str, team: &str) -> Result<Roster>;
    /// Add-or-update; must succeed for a user already on the team.
    async fn add_team_member(&self, request: &MembershipRequest) -> Result<()>;
}
