use crate::error::RepositoryError;
use crate::user_models::{normalize_username, NewUser, RegistrationForm, User};
use crate::user_repository::UserRepository;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tokio::task::JoinError;

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9]").expect("valid regex"));
static LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new("[a-zA-Z]").expect("valid regex"));
static SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9 ]").expect("valid regex"));

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Password must contain at least 1 alphabet, 1 number & 1 special character")]
    InvalidPassword,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Password hashing did not complete: {0}")]
    Task(#[from] JoinError),

    #[error(transparent)]
    Repository(RepositoryError),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Password check did not complete: {0}")]
    Task(#[from] JoinError),
}

/// True when the password holds at least one digit, one ASCII letter and one
/// character that is neither alphanumeric nor a space. Length is not checked.
pub fn is_password_valid(password: &str) -> bool {
    DIGIT.is_match(password) && LETTER.is_match(password) && SPECIAL.is_match(password)
}

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(users: UserRepository, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    /// Checks password complexity before anything is hashed or stored.
    /// bcrypt runs on the blocking pool.
    pub async fn register_user(&self, form: &RegistrationForm) -> Result<User, RegistrationError> {
        if !is_password_valid(&form.password) {
            return Err(RegistrationError::InvalidPassword);
        }

        let password = form.password.clone();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        let username = normalize_username(&form.username);
        let new_user = NewUser {
            username: username.to_string(),
            password_hash,
            profile: form.profile(),
        };

        self.users
            .register_user(new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => RegistrationError::UsernameTaken(username.to_string()),
                other => RegistrationError::Repository(other),
            })
    }

    /// `Ok(None)` for an unknown username or a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>, LoginError> {
        let username = normalize_username(username);
        let Some(user) = self.users.find_by_username(username).await? else {
            return Ok(None);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;

        match verified {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "Stored password hash is unreadable");
                Ok(None)
            }
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        self.users.find_by_id(id).await
    }
}
