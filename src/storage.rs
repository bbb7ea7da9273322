use crate::error::RepositoryError;
use crate::models::{CommentRecord, ImageRecord, ImageUpdate, NewComment, NewImage, Tag};
use crate::user_models::{NewUser, User};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub const DEFAULT_STORAGE_FILE: &str = "image_hoster.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    user: i64,
    image: i64,
    tag: i64,
    comment: i64,
}

fn next_id(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

/// Every table of the store. Writes happen on a clone inside
/// [`Storage::transaction`] and only become visible on commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    users: BTreeMap<i64, User>,
    images: BTreeMap<i64, ImageRecord>,
    tags: BTreeMap<i64, Tag>,
    comments: BTreeMap<i64, CommentRecord>,
    #[serde(default)]
    sequences: Sequences,
}

impl Tables {
    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    /// Usernames are unique ignoring case, matching how ownership is checked.
    pub fn insert_user(&mut self, user: NewUser) -> Result<User, RepositoryError> {
        let lowered = user.username.to_lowercase();
        if self.users.values().any(|u| u.username.to_lowercase() == lowered) {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }

        let user = User {
            id: next_id(&mut self.sequences.user),
            username: user.username,
            password_hash: user.password_hash,
            profile: user.profile,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn tag(&self, id: i64) -> Option<&Tag> {
        self.tags.get(&id)
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.values().find(|t| t.name == name)
    }

    /// Tag names are unique: a duplicate insert returns the existing row.
    pub fn upsert_tag(&mut self, name: &str) -> Tag {
        if let Some(existing) = self.tag_by_name(name) {
            return existing.clone();
        }

        let tag = Tag {
            id: next_id(&mut self.sequences.tag),
            name: name.to_string(),
        };
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    /// Looks each name up and creates the missing ones, keeping input order.
    pub fn find_or_create_tags(&mut self, names: &[String]) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
        for name in names {
            let tag = self.upsert_tag(name);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.values()
    }

    pub fn image(&self, id: i64) -> Option<&ImageRecord> {
        self.images.get(&id)
    }

    pub fn insert_image(&mut self, image: NewImage) -> Result<ImageRecord, RepositoryError> {
        if self.user(image.user_id).is_none() {
            return Err(RepositoryError::not_found("User", image.user_id));
        }
        let tag_ids = self.tag_ids(&image.tag_names);

        let record = ImageRecord {
            id: next_id(&mut self.sequences.image),
            title: image.title,
            description: image.description,
            image_file: image.image_file,
            date: image.date,
            user_id: image.user_id,
            tag_ids,
        };
        self.images.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn replace_image(&mut self, update: ImageUpdate) -> Result<ImageRecord, RepositoryError> {
        let tag_ids = self.tag_ids(&update.tag_names);
        let record = self
            .images
            .get_mut(&update.id)
            .ok_or_else(|| RepositoryError::not_found("Image", update.id))?;

        record.title = update.title;
        record.description = update.description;
        record.image_file = update.image_file;
        record.date = update.date;
        record.tag_ids = tag_ids;
        Ok(record.clone())
    }

    /// Removes the image together with its comments. Its tag associations live
    /// on the image row and go with it; the shared tag rows are kept.
    pub fn remove_image(&mut self, id: i64) -> Result<ImageRecord, RepositoryError> {
        let record = self
            .images
            .remove(&id)
            .ok_or_else(|| RepositoryError::not_found("Image", id))?;
        self.comments.retain(|_, c| c.image_id != id);
        Ok(record)
    }

    pub fn comments_for(&self, image_id: i64) -> impl Iterator<Item = &CommentRecord> {
        self.comments.values().filter(move |c| c.image_id == image_id)
    }

    pub fn insert_comment(&mut self, comment: NewComment) -> Result<CommentRecord, RepositoryError> {
        if self.image(comment.image_id).is_none() {
            return Err(RepositoryError::not_found("Image", comment.image_id));
        }
        if self.user(comment.user_id).is_none() {
            return Err(RepositoryError::not_found("User", comment.user_id));
        }

        let record = CommentRecord {
            id: next_id(&mut self.sequences.comment),
            text: comment.text,
            created_date: comment.created_date,
            user_id: comment.user_id,
            image_id: comment.image_id,
        };
        self.comments.insert(record.id, record.clone());
        Ok(record)
    }

    fn tag_ids(&mut self, names: &[String]) -> Vec<i64> {
        self.find_or_create_tags(names)
            .into_iter()
            .map(|t| t.id)
            .collect()
    }
}

pub struct Storage {
    tables: RwLock<Tables>,
    path: Option<PathBuf>,
}

impl Storage {
    /// Opens the store backed by `path`, starting empty if the file is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tables = if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read storage file {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse storage file {}", path.display()))?
        } else {
            Tables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            path: Some(path.to_path_buf()),
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            path: None,
        }
    }

    pub async fn read<T>(&self, op: impl FnOnce(&Tables) -> T) -> T {
        let tables = self.tables.read().await;
        op(&tables)
    }

    /// Runs `op` against a working copy of the tables. The copy is persisted
    /// and swapped in on success, and dropped (rolled back) on any error.
    pub async fn transaction<T>(
        &self,
        op: impl FnOnce(&mut Tables) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut tables = self.tables.write().await;
        let mut working = tables.clone();

        let outcome = op(&mut working).and_then(|value| {
            self.save_to_disk(&working)?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                *tables = working;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transaction rolled back");
                Err(e)
            }
        }
    }

    fn save_to_disk(&self, tables: &Tables) -> Result<(), RepositoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(tables)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, path)?;
        Ok(())
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
            profile: UserProfile::default(),
        }
    }

    #[tokio::test]
    async fn test_failed_transaction_leaves_tables_unchanged() {
        let storage = Storage::in_memory();
        storage
            .transaction(|t| t.insert_user(new_user("alice")))
            .await
            .unwrap();

        let result = storage
            .transaction(|t| {
                t.upsert_tag("sunset");
                t.insert_user(new_user("alice"))
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert!(storage.read(|t| t.tag_by_name("sunset").is_none()).await);
    }

    #[tokio::test]
    async fn test_upsert_tag_reuses_existing_row() {
        let storage = Storage::in_memory();
        let (first, second, other) = storage
            .transaction(|t| Ok((t.upsert_tag("cat"), t.upsert_tag("cat"), t.upsert_tag("Cat"))))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn test_find_or_create_tags_dedups_and_keeps_order() {
        let storage = Storage::in_memory();
        let names = ["dog", "cat", "dog"].map(str::to_string);
        let tags = storage
            .transaction(|t| Ok(t.find_or_create_tags(&names)))
            .await
            .unwrap();

        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["dog", "cat"]);
    }

    #[tokio::test]
    async fn test_failed_image_write_creates_no_tags() {
        let storage = Storage::in_memory();
        let result = storage
            .transaction(|t| {
                t.replace_image(ImageUpdate {
                    id: 99,
                    title: "Orphan".to_string(),
                    description: String::new(),
                    image_file: String::new(),
                    date: Utc::now(),
                    tag_names: vec!["lonely".to_string()],
                })
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
        assert!(storage.read(|t| t.tag_by_name("lonely").is_none()).await);
    }

    #[tokio::test]
    async fn test_remove_image_drops_its_comments() {
        let storage = Storage::in_memory();
        let image_id = storage
            .transaction(|t| {
                let user = t.insert_user(new_user("alice"))?;
                let image = t.insert_image(NewImage::new(
                    "Shore".to_string(),
                    "waves".to_string(),
                    "aGVsbG8=".to_string(),
                    user.id,
                    vec!["beach".to_string()],
                ))?;
                t.insert_comment(NewComment::new("nice".to_string(), user.id, image.id))?;
                Ok(image.id)
            })
            .await
            .unwrap();

        storage
            .transaction(|t| t.remove_image(image_id))
            .await
            .unwrap();

        storage
            .read(|t| {
                assert!(t.image(image_id).is_none());
                assert_eq!(t.comments_for(image_id).count(), 0);
                assert!(t.tag_by_name("beach").is_some());
            })
            .await;
    }

    #[tokio::test]
    async fn test_committed_tables_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = Storage::open(&path).unwrap();
        storage
            .transaction(|t| t.insert_user(new_user("bob")))
            .await
            .unwrap();
        drop(storage);

        let reopened = Storage::open(&path).unwrap();
        let user = reopened
            .read(|t| t.user_by_username("bob").cloned())
            .await
            .unwrap();
        assert_eq!(user.id, 1);

        let next = reopened
            .transaction(|t| t.insert_user(new_user("carol")))
            .await
            .unwrap();
        assert_eq!(next.id, 2);
    }
}
