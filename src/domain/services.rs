use crate::domain::model::{MemberLogin, Roster};

/// Org members absent from the team, in org roster order.
pub fn missing(org_roster: &Roster, team_roster: &Roster) -> Vec<MemberLogin> {
    org_roster
        .iter()
        .filter(|login| !team_roster.contains(login))
        .cloned()
        .collect()
}
