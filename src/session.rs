//! Signed session tokens and the extractor that turns them into the
//! current user.
//!
//! The token is an HS256 JWT stored in the `hoster_session` cookie. It is
//! checked on every request: signature, expiry, and the user must still exist.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::user_models::User;
use crate::AppState;

pub const SESSION_COOKIE_NAME: &str = "hoster_session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// `None` for a forged, malformed or expired token.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256)) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                None
            }
        }
    }

    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE_NAME,
            token,
            self.ttl.num_seconds()
        )
    }
}

/// Cookie value that makes the browser drop the session.
pub fn expired_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE_NAME
    )
}

fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// The user the current request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Extractor for routes that need a logged-in user.
pub struct RequireUser(pub CurrentUser);

/// Sends anonymous visitors to the login page.
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to("/users/login").into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = RedirectToLogin;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        current_user(&parts.headers, state)
            .await
            .map(Self)
            .ok_or(RedirectToLogin)
    }
}

async fn current_user(headers: &HeaderMap, state: &AppState) -> Option<CurrentUser> {
    let token = read_cookie(headers, SESSION_COOKIE_NAME)?;
    let claims = state.session.verify(token)?;

    let user = match state.users.find_by_id(claims.sub).await {
        Ok(user) => user?,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load session user");
            return None;
        }
    };

    if user.username != claims.username {
        return None;
    }

    Some(CurrentUser {
        id: user.id,
        username: user.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_models::UserProfile;
    use axum::http::HeaderValue;

    fn user() -> User {
        User {
            id: 7,
            username: "jane".to_string(),
            password_hash: "hash".to_string(),
            profile: UserProfile::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new(b"test-secret", Duration::hours(1));
        let token = keys.issue(&user()).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "jane");
    }

    #[test]
    fn test_foreign_or_expired_tokens_are_rejected() {
        let keys = SessionKeys::new(b"test-secret", Duration::hours(1));
        let other = SessionKeys::new(b"other-secret", Duration::hours(1));
        let token = other.issue(&user()).unwrap();
        assert!(keys.verify(&token).is_none());

        let expired = SessionKeys::new(b"test-secret", Duration::hours(-2));
        let token = expired.issue(&user()).unwrap();
        assert!(keys.verify(&token).is_none());

        assert!(keys.verify("not-a-token").is_none());
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; hoster_session=abc.def.ghi"),
        );

        assert_eq!(read_cookie(&headers, SESSION_COOKIE_NAME), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let keys = SessionKeys::new(b"test-secret", Duration::hours(1));
        let cookie = keys.cookie("tok");
        assert!(cookie.starts_with("hoster_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("Max-Age=3600"));
        assert!(expired_cookie().ends_with("Max-Age=0"));
    }
}
