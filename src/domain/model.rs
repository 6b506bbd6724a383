use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Account login as returned by the directory. The only attribute used for identity.
pub type MemberLogin = String;

/// Member identifiers in first-seen order, with a hash index for membership tests.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    ordered: Vec<MemberLogin>,
    index: HashSet<MemberLogin>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a login; returns false when it was already present.
    pub fn insert(&mut self, login: impl Into<MemberLogin>) -> bool {
        let login = login.into();
        if self.index.contains(&login) {
            return false;
        }
        self.index.insert(login.clone());
        self.ordered.push(login);
        true
    }

    pub fn contains(&self, login: &str) -> bool {
        self.index.contains(login)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberLogin> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl<S: Into<MemberLogin>> FromIterator<S> for Roster {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for login in iter {
            roster.insert(login);
        }
        roster
    }
}

/// Member entry as listed by the org and team member endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub login: MemberLogin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    #[default]
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRequest {
    pub organization: String,
    pub team: String,
    pub member: MemberLogin,
    pub role: TeamRole,
}

impl MembershipRequest {
    pub fn member(organization: &str, team: &str, member: &str) -> Self {
        Self {
            organization: organization.to_string(),
            team: team.to_string(),
            member: member.to_string(),
            role: TeamRole::Member,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFailure {
    pub team: String,
    pub member: MemberLogin,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamOutcome {
    pub team: String,
    pub added: Vec<MemberLogin>,
    pub failures: Vec<AddFailure>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub organization: String,
    pub dry_run: bool,
    pub teams: Vec<TeamOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.teams.iter().all(|t| t.failures.is_empty())
    }

    pub fn failures(&self) -> impl Iterator<Item = &AddFailure> {
        self.teams.iter().flat_map(|t| t.failures.iter())
    }

    /// Non-zero when any addition failed, even though the run completed.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn total_added(&self) -> usize {
        self.teams.iter().map(|t| t.added.len()).sum()
    }
}
