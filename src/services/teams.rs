//! Team operations.

use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::{Team, User};
use serde::Serialize;

/// Service for organization teams.
pub struct TeamsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> TeamsService<'a> {
    /// Creates a new teams service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists teams in an organization, all pages.
    pub async fn list(&self, org: &str) -> GitHubResult<Vec<Team>> {
        let request = RequestDescriptor::get(format!("/orgs/{}/teams", org))
            .description(format!("Getting teams in {}", org))
            .telemetry_event("teams.list");
        self.client.request_all(request).await
    }

    /// Gets a team by slug.
    pub async fn get_by_slug(&self, org: &str, team_slug: &str) -> GitHubResult<Team> {
        let request = RequestDescriptor::get(format!("/orgs/{}/teams/{}", org, team_slug))
            .description(format!("Getting team {}/{}", org, team_slug))
            .telemetry_event("teams.get");
        self.client.request(request).await
    }

    /// Lists members of a team, all pages.
    pub async fn list_members(
        &self,
        org: &str,
        team_slug: &str,
        role: Option<TeamMemberRole>,
    ) -> GitHubResult<Vec<User>> {
        let request = RequestDescriptor::get(format!("/orgs/{}/teams/{}/members", org, team_slug))
            .query(&ListMembersParams { role })?
            .description(format!("Getting members of team {}/{}", org, team_slug))
            .telemetry_event("teams.members");
        self.client.request_all(request).await
    }
}

/// Team member role filter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamMemberRole {
    /// Members.
    Member,
    /// Maintainers.
    Maintainer,
    /// Both.
    All,
}

#[derive(Debug, Serialize)]
struct ListMembersParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<TeamMemberRole>,
}
