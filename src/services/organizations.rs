//! Organization operations.

use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::{Organization, User};
use serde::Serialize;

/// Service for organization operations.
pub struct OrganizationsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> OrganizationsService<'a> {
    /// Creates a new organizations service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists organizations of the authenticated user, all pages.
    pub async fn list(&self) -> GitHubResult<Vec<Organization>> {
        let request = RequestDescriptor::get("/user/orgs")
            .description("Getting organizations for the authenticated user")
            .telemetry_event("organizations.list");
        self.client.request_all(request).await
    }

    /// Lists public organizations of a user, all pages.
    pub async fn list_for_user(&self, username: &str) -> GitHubResult<Vec<Organization>> {
        let request = RequestDescriptor::get(format!("/users/{}/orgs", username))
            .description(format!("Getting organizations for {}", username))
            .telemetry_event("organizations.list_for_user");
        self.client.request_all(request).await
    }

    /// Gets an organization.
    pub async fn get(&self, org: &str) -> GitHubResult<Organization> {
        let request = RequestDescriptor::get(format!("/orgs/{}", org))
            .description(format!("Getting organization {}", org))
            .telemetry_event("organizations.get");
        self.client.request(request).await
    }

    /// Lists members of an organization, all pages.
    pub async fn list_members(
        &self,
        org: &str,
        params: &ListOrgMembersParams,
    ) -> GitHubResult<Vec<User>> {
        let request = RequestDescriptor::get(format!("/orgs/{}/members", org))
            .query(params)?
            .description(format!("Getting members of {}", org))
            .telemetry_event("organizations.members");
        self.client.request_all(request).await
    }

    /// Checks if a user is a member: `204` is yes, `404` is no.
    pub async fn check_membership(&self, org: &str, username: &str) -> GitHubResult<bool> {
        let request = RequestDescriptor::get(format!("/orgs/{}/members/{}", org, username))
            .description(format!("Checking if {} is a member of {}", username, org))
            .telemetry_event("organizations.check_membership");
        self.client.check(request).await
    }
}

/// Parameters for listing organization members.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListOrgMembersParams {
    /// Filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<MemberFilter>,
    /// Role filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
}

/// Member filter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberFilter {
    /// Members without two-factor authentication.
    #[serde(rename = "2fa_disabled")]
    TwoFactorDisabled,
    /// Everyone.
    All,
}

/// Organization member role filter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Everyone.
    All,
    /// Owners.
    Admin,
    /// Non-owners.
    Member,
}
