use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Owner;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub email_address: Option<String>,
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn owner(&self) -> Owner {
        Owner {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Usernames are stored and looked up without surrounding whitespace.
pub fn normalize_username(raw: &str) -> &str {
    raw.trim()
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub profile: UserProfile,
}

/// Fields submitted on the registration page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
}

impl RegistrationForm {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            full_name: non_blank(&self.full_name),
            email_address: non_blank(&self.email_address),
            mobile_number: non_blank(&self.mobile_number),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// What the registration view echoes back. The password is never echoed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationEcho {
    pub username: String,
    pub profile: UserProfile,
}

impl From<&RegistrationForm> for RegistrationEcho {
    fn from(form: &RegistrationForm) -> Self {
        Self {
            username: normalize_username(&form.username).to_string(),
            profile: form.profile(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}
