use crate::error::RepositoryError;
use crate::storage::Storage;
use crate::user_models::{NewUser, User};
use std::sync::Arc;

#[derive(Clone)]
pub struct UserRepository {
    storage: Arc<Storage>,
}

impl UserRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Fails with `Conflict` when the username is taken.
    pub async fn register_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let user = self.storage.transaction(|t| t.insert_user(user)).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .storage
            .read(|t| t.user_by_username(username).cloned())
            .await)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self.storage.read(|t| t.user(id).cloned()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_models::UserProfile;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            profile: UserProfile {
                full_name: Some("Test User".to_string()),
                ..UserProfile::default()
            },
        }
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let repo = UserRepository::new(Arc::new(Storage::in_memory()));
        let user = repo.register_user(new_user("dave")).await.unwrap();

        let by_name = repo.find_by_username("dave").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.profile.full_name.as_deref(), Some("Test User"));

        assert!(repo.find_by_id(user.id).await.unwrap().is_some());
        assert!(repo.find_by_username("Dave").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = UserRepository::new(Arc::new(Storage::in_memory()));
        repo.register_user(new_user("erin")).await.unwrap();

        let err = repo.register_user(new_user("erin")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let err = repo.register_user(new_user("ERIN")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
