use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::{NewsPriority, NewsStatus, Role, UserProfile};

// -- Envelope --

/// Every response body has this shape. `error` is set exactly when the
/// request failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { data: Some(data), error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { data: None, error: Some(message.into()) }
    }
}

/// Payload of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: Uuid,
}

// -- JWT Claims --

/// JWT claims. The role is re-read from storage when the session is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// Session id; deleting the session revokes the token.
    pub sid: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetRoleRequest {
    pub role: Role,
}

// -- News --

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { limit: default_limit(), offset: 0 }
    }
}

pub fn default_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNewsRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub status: NewsStatus,
    #[serde(default)]
    pub priority: NewsPriority,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Partial update: only the fields that are present change. For
/// `category_id` and `published_at` an explicit `null` clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNewsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NewsStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<NewsPriority>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Option<DateTime<Utc>>>,
}

/// Maps a present field to `Some`, so `null` arrives as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "blue".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

// -- Residents --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertResidentRequest {
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    pub house_number: String,
    pub block: String,
    #[serde(default = "default_family_members")]
    pub family_members: u32,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub vehicle_info: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn default_family_members() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResidentQuery {
    pub block: Option<String>,
    /// Free-text directory search.
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tells_absent_from_null() {
        let absent: UpdateNewsRequest = serde_json::from_str(r#"{"title": "Baru"}"#).unwrap();
        assert_eq!(absent.category_id, None);
        assert_eq!(absent.published_at, None);

        let cleared: UpdateNewsRequest =
            serde_json::from_str(r#"{"category_id": null, "published_at": null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));
        assert_eq!(cleared.published_at, Some(None));

        let id = Uuid::new_v4();
        let set: UpdateNewsRequest = serde_json::from_str(&format!(r#"{{"category_id": "{id}"}}"#)).unwrap();
        assert_eq!(set.category_id, Some(Some(id)));
    }

    #[test]
    fn update_serializes_only_what_changes() {
        let req = UpdateNewsRequest { category_id: Some(None), ..Default::default() };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"category_id":null}"#);
    }
}
