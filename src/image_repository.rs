use crate::error::RepositoryError;
use crate::models::{Comment, CommentRecord, Image, ImageRecord, ImageUpdate, NewComment, NewImage};
use crate::storage::{Storage, Tables};
use std::sync::Arc;

/// Image and comment persistence. Every write is one store transaction.
#[derive(Clone)]
pub struct ImageRepository {
    storage: Arc<Storage>,
}

impl ImageRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn upload_image(&self, image: NewImage) -> Result<Image, RepositoryError> {
        let image = self
            .storage
            .transaction(|t| {
                let record = t.insert_image(image)?;
                hydrate_image(t, &record)
            })
            .await?;

        tracing::info!(image_id = image.id, user_id = image.user.id, "Image uploaded");
        Ok(image)
    }

    pub async fn get_all_images(&self) -> Result<Vec<Image>, RepositoryError> {
        self.storage
            .read(|t| t.images().map(|r| hydrate_image(t, r)).collect())
            .await
    }

    /// Both fields must match; a miss is `Ok(None)`.
    pub async fn get_image_by_id_and_title(
        &self,
        id: i64,
        title: &str,
    ) -> Result<Option<Image>, RepositoryError> {
        self.storage
            .read(|t| {
                t.image(id)
                    .filter(|r| r.title == title)
                    .map(|r| hydrate_image(t, r))
                    .transpose()
            })
            .await
    }

    pub async fn get_image(&self, id: i64) -> Result<Image, RepositoryError> {
        self.storage
            .read(|t| {
                let record = t
                    .image(id)
                    .ok_or_else(|| RepositoryError::not_found("Image", id))?;
                hydrate_image(t, record)
            })
            .await
    }

    pub async fn update_image(&self, update: ImageUpdate) -> Result<Image, RepositoryError> {
        let image = self
            .storage
            .transaction(|t| {
                let record = t.replace_image(update)?;
                hydrate_image(t, &record)
            })
            .await?;

        tracing::info!(image_id = image.id, "Image updated");
        Ok(image)
    }

    pub async fn delete_image(&self, id: i64) -> Result<(), RepositoryError> {
        self.storage.transaction(|t| t.remove_image(id)).await?;
        tracing::info!(image_id = id, "Image deleted");
        Ok(())
    }

    /// Case-insensitive username comparison against the image's owner.
    /// A missing image is not an error, just `false`.
    pub async fn confirm_owner(&self, id: i64, username: &str) -> Result<bool, RepositoryError> {
        let username = username.to_lowercase();
        Ok(self
            .storage
            .read(|t| {
                t.image(id)
                    .and_then(|r| t.user(r.user_id))
                    .is_some_and(|owner| owner.username.to_lowercase() == username)
            })
            .await)
    }

    pub async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        let comment = self
            .storage
            .transaction(|t| {
                let record = t.insert_comment(comment)?;
                hydrate_comment(t, &record)
            })
            .await?;

        tracing::info!(
            comment_id = comment.id,
            image_id = comment.image_id,
            "Comment created"
        );
        Ok(comment)
    }

    pub async fn get_comments(&self, image_id: i64) -> Result<Vec<Comment>, RepositoryError> {
        self.storage
            .read(|t| t.comments_for(image_id).map(|c| hydrate_comment(t, c)).collect())
            .await
    }
}

fn hydrate_image(tables: &Tables, record: &ImageRecord) -> Result<Image, RepositoryError> {
    let owner = tables
        .user(record.user_id)
        .ok_or_else(|| RepositoryError::not_found("User", record.user_id))?;

    let tags = record
        .tag_ids
        .iter()
        .filter_map(|id| tables.tag(*id).cloned())
        .collect();

    let comments = tables
        .comments_for(record.id)
        .map(|c| hydrate_comment(tables, c))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Image {
        id: record.id,
        title: record.title.clone(),
        description: record.description.clone(),
        image_file: record.image_file.clone(),
        date: record.date,
        user: owner.owner(),
        tags,
        comments,
    })
}

fn hydrate_comment(tables: &Tables, record: &CommentRecord) -> Result<Comment, RepositoryError> {
    let author = tables
        .user(record.user_id)
        .ok_or_else(|| RepositoryError::not_found("User", record.user_id))?;

    Ok(Comment {
        id: record.id,
        text: record.text.clone(),
        created_date: record.created_date,
        user: author.owner(),
        image_id: record.image_id,
    })
}
