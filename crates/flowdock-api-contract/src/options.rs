//! Request options for list, create and update endpoints
//!
//! List options are encoded into the query string (see [`crate::query`]);
//! create and update options are sent as JSON request bodies. Unset fields
//! are skipped in both encodings.

use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

/// Tag matching mode for message searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// Every listed tag must be present
    And,
    /// Any listed tag is enough
    Or,
}

/// Options for listing flows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowsListOptions {
    /// List every flow in the user's organizations, not only joined ones.
    /// Selects the endpoint rather than a query parameter.
    #[serde(skip)]
    pub all: bool,
    /// Include each flow's member list
    #[serde(rename = "user", skip_serializing_if = "is_false")]
    pub users: bool,
}

/// Lookup by opaque id, used by the `find` endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindOptions {
    pub id: String,
}

/// Options for creating a flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FlowCreateOptions {
    #[validate(length(min = 1, message = "Flow name cannot be empty"))]
    pub name: String,
}

/// Filters for listing messages of a flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct MessagesListOptions {
    /// Event type filter; the service accepts a comma separated list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[validate(range(min = 1, message = "Limit must be positive"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_id: Option<i64>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "comma_separated"
    )]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_mode: Option<TagMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Body for posting a message or a comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MessageCreateOptions {
    /// Target flow id
    #[validate(length(min = 1, message = "Flow cannot be empty"))]
    pub flow: String,
    #[validate(length(min = 1, message = "Event cannot be empty"))]
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Parent message id; required for comments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Body for updating a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UserUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body for updating an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OrganizationUpdateOptions {
    #[validate(length(min = 1, message = "Organization name cannot be empty"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body for posting a mail-style message to a flow's team inbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct InboxCreateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[validate(url)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn comma_separated<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&values.join(","))
}
