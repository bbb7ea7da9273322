use crate::error::RepositoryError;
use crate::image_repository::ImageRepository;
use crate::models::{Comment, Image, ImageUpdate, NewComment, NewImage};

/// Straight delegation to [`ImageRepository`].
#[derive(Clone)]
pub struct ImageService {
    images: ImageRepository,
}

impl ImageService {
    pub fn new(images: ImageRepository) -> Self {
        Self { images }
    }

    pub async fn get_all_images(&self) -> Result<Vec<Image>, RepositoryError> {
        self.images.get_all_images().await
    }

    pub async fn upload_image(&self, image: NewImage) -> Result<Image, RepositoryError> {
        self.images.upload_image(image).await
    }

    pub async fn get_image_by_id_and_title(
        &self,
        id: i64,
        title: &str,
    ) -> Result<Option<Image>, RepositoryError> {
        self.images.get_image_by_id_and_title(id, title).await
    }

    pub async fn get_image(&self, id: i64) -> Result<Image, RepositoryError> {
        self.images.get_image(id).await
    }

    pub async fn update_image(&self, update: ImageUpdate) -> Result<Image, RepositoryError> {
        self.images.update_image(update).await
    }

    pub async fn delete_image(&self, id: i64) -> Result<(), RepositoryError> {
        self.images.delete_image(id).await
    }

    pub async fn confirm_owner(&self, id: i64, username: &str) -> Result<bool, RepositoryError> {
        self.images.confirm_owner(id, username).await
    }

    pub async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepositoryError> {
        self.images.create_comment(comment).await
    }

    pub async fn get_comments(&self, image_id: i64) -> Result<Vec<Comment>, RepositoryError> {
        self.images.get_comments(image_id).await
    }
}
