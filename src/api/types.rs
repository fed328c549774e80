//! Wire types for the reels backend.
//!
//! Optional fields default when absent so older or partial responses still
//! decode; only `success` is required on every body.
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

fn clamp_count(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

/// View counts: `null` reads as 0 and negatives clamp to 0.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.map_or(0, clamp_count))
}

/// Remaining views: `null` stays unknown, negatives mean none left.
fn remaining<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.map(clamp_count))
}

/// One short video entry as returned by `GET /api/reels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reel {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// User status block optionally attached to the reel list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserStatus {
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default, deserialize_with = "count")]
    pub views_count: u32,
    /// `None` means unlimited (logged in) or not reported.
    #[serde(default, deserialize_with = "remaining")]
    pub views_remaining: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReelsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub reels: Vec<Reel>,
    #[serde(default)]
    pub user: Option<UserStatus>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful reel list: the backend-ordered reels plus any user status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelsPage {
    pub reels: Vec<Reel>,
    pub user: Option<UserStatus>,
}

/// Response to `POST /api/track-view`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackViewResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "count")]
    pub views_count: u32,
    #[serde(default, deserialize_with = "remaining")]
    pub views_remaining: Option<u32>,
    #[serde(default)]
    pub requires_login: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response to `GET /api/auth/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthStatus {
    pub success: bool,
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default, deserialize_with = "count")]
    pub views_count: u32,
    #[serde(default, deserialize_with = "remaining")]
    pub views_remaining: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Generic `{ success, error? }` body used by login, register, add and delete.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Login or registration credentials.
///
/// `email` is only sent when registering. The password stays wrapped in a
/// [`SecretString`] so it never shows up in `Debug` output or logs.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub email: Option<String>,
    pub password: SecretString,
}

impl Credentials {
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            password: SecretString::from(password.into()),
        }
    }

    pub fn register(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: Some(email.into()),
            password: SecretString::from(password.into()),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct TrackViewBody {
    pub reel_id: i64,
}

/// Body of `POST /api/reels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReel {
    pub filename: String,
    pub title: String,
    pub description: String,
}
