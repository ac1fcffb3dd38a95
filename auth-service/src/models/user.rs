//! User model - Twiller account documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    Es,
    Hi,
    Pt,
    Zh,
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

/// User entity.
///
/// Pending verification codes deliberately do NOT live on this document;
/// they are kept in their own `(user_id, purpose)`-keyed store so concurrent
/// flows cannot clobber each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub verified: bool,
    #[serde(default)]
    pub preferred_language: Language,
    /// Stamp set by a successful audio-upload OTP verification; uploads are
    /// allowed for one hour after it.
    pub audio_upload_verified: Option<DateTime<Utc>>,
    /// Password reset may be requested once per calendar day.
    pub last_password_reset_request: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            username,
            email,
            password_hash,
            avatar: None,
            bio: None,
            phone: None,
            verified: false,
            preferred_language: Language::default(),
            audio_upload_verified: None,
            last_password_reset_request: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert to sanitized response (never exposes the password hash).
    pub fn sanitized(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            bio: self.bio.clone(),
            verified: self.verified,
            preferred_language: self.preferred_language,
            created_at: self.created_at,
        }
    }
}

/// User response for the API (without sensitive fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub verified: bool,
    pub preferred_language: Language,
    pub created_at: DateTime<Utc>,
}
