//! User operations.

use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::request::RequestDescriptor;
use crate::types::{User, UserProfile};

/// Service for user operations.
pub struct UsersService<'a> {
    client: &'a GitHubClient,
}

impl<'a> UsersService<'a> {
    /// Creates a new users service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Gets the authenticated user.
    pub async fn get_authenticated(&self) -> GitHubResult<UserProfile> {
        let request = RequestDescriptor::get("/user")
            .description("Getting the authenticated user")
            .telemetry_event("users.get_authenticated");
        self.client.request(request).await
    }

    /// Gets a user by login.
    pub async fn get(&self, username: &str) -> GitHubResult<UserProfile> {
        let request = RequestDescriptor::get(format!("/users/{}", username))
            .description(format!("Getting user {}", username))
            .telemetry_event("users.get");
        self.client.request(request).await
    }

    /// Lists followers of a user, all pages.
    pub async fn list_followers(&self, username: &str) -> GitHubResult<Vec<User>> {
        let request = RequestDescriptor::get(format!("/users/{}/followers", username))
            .description(format!("Getting followers of {}", username))
            .telemetry_event("users.followers");
        self.client.request_all(request).await
    }

    /// Lists followers of the authenticated user, all pages.
    pub async fn list_own_followers(&self) -> GitHubResult<Vec<User>> {
        let request = RequestDescriptor::get("/user/followers")
            .description("Getting followers of the authenticated user")
            .telemetry_event("users.followers");
        self.client.request_all(request).await
    }
}
