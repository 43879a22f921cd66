//! Request descriptors handed to the REST core by endpoint commands.

use crate::auth::AccessToken;
use crate::errors::{GitHubError, GitHubResult};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// How many pages a logical call should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallMode {
    /// One request, one decoded document.
    #[default]
    Single,
    /// Follow `next` links and concatenate every page.
    AllPages,
    /// Fetch the first page only, keeping its links.
    FirstPage,
}

/// Immutable description of one logical API call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    uri_fragment: String,
    method: Method,
    body: Option<Value>,
    accept: Vec<String>,
    description: String,
    access_token: Option<AccessToken>,
    telemetry_event: Option<String>,
    telemetry_properties: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Starts a builder for the given method and URI fragment.
    pub fn builder(method: Method, uri_fragment: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(method, uri_fragment)
    }

    /// Starts a GET builder.
    pub fn get(uri_fragment: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::GET, uri_fragment)
    }

    /// Starts a POST builder.
    pub fn post(uri_fragment: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::POST, uri_fragment)
    }

    /// Starts a PUT builder.
    pub fn put(uri_fragment: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::PUT, uri_fragment)
    }

    /// Starts a PATCH builder.
    pub fn patch(uri_fragment: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::PATCH, uri_fragment)
    }

    /// Starts a DELETE builder.
    pub fn delete(uri_fragment: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::DELETE, uri_fragment)
    }

    /// URI fragment relative to the API root.
    pub fn uri_fragment(&self) -> &str {
        &self.uri_fragment
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// JSON body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Accept header overrides.
    pub fn accept(&self) -> &[String] {
        &self.accept
    }

    /// Human-readable description used for progress reporting.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Explicit token override.
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// Telemetry event name, defaulting to the method.
    pub fn telemetry_event(&self) -> String {
        self.telemetry_event
            .clone()
            .unwrap_or_else(|| format!("rest.{}", self.method.as_str().to_ascii_lowercase()))
    }

    /// Extra telemetry properties.
    pub fn telemetry_properties(&self) -> &BTreeMap<String, String> {
        &self.telemetry_properties
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug)]
pub struct RequestDescriptorBuilder {
    uri_fragment: String,
    method: Method,
    body: Option<Value>,
    accept: Vec<String>,
    description: Option<String>,
    access_token: Option<AccessToken>,
    telemetry_event: Option<String>,
    telemetry_properties: BTreeMap<String, String>,
}

impl RequestDescriptorBuilder {
    /// Creates a new builder.
    pub fn new(method: Method, uri_fragment: impl Into<String>) -> Self {
        Self {
            uri_fragment: uri_fragment.into(),
            method,
            body: None,
            accept: Vec::new(),
            description: None,
            access_token: None,
            telemetry_event: None,
            telemetry_properties: BTreeMap::new(),
        }
    }

    /// Sets a JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes a typed body.
    pub fn json<B: Serialize>(mut self, body: &B) -> GitHubResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            GitHubError::invalid_parameter(format!("Failed to serialize request body: {}", e))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Appends query parameters to the URI fragment.
    pub fn query<P: Serialize>(mut self, params: &P) -> GitHubResult<Self> {
        let query_string = serde_urlencoded::to_string(params).map_err(|e| {
            GitHubError::invalid_parameter(format!("Failed to serialize parameters: {}", e))
        })?;

        if !query_string.is_empty() {
            let separator = if self.uri_fragment.contains('?') { '&' } else { '?' };
            self.uri_fragment = format!("{}{}{}", self.uri_fragment, separator, query_string);
        }
        Ok(self)
    }

    /// Adds an Accept header value (used to opt into preview media types).
    pub fn accept(mut self, media_type: impl Into<String>) -> Self {
        self.accept.push(media_type.into());
        self
    }

    /// Sets the progress description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Overrides the access token for this call.
    pub fn access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Sets the telemetry event name.
    pub fn telemetry_event(mut self, name: impl Into<String>) -> Self {
        self.telemetry_event = Some(name.into());
        self
    }

    /// Adds a telemetry property.
    pub fn telemetry_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.telemetry_properties.insert(key.into(), value.into());
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> RequestDescriptor {
        let description = self
            .description
            .unwrap_or_else(|| format!("{} {}", self.method, self.uri_fragment));

        RequestDescriptor {
            uri_fragment: self.uri_fragment,
            method: self.method,
            body: self.body,
            accept: self.accept,
            description,
            access_token: self.access_token,
            telemetry_event: self.telemetry_event,
            telemetry_properties: self.telemetry_properties,
        }
    }
}
