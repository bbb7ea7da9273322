use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Public view of a user attached to images and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Row layout of an image inside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_file: String,
    pub date: DateTime<Utc>,
    pub user_id: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Row layout of a comment inside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    pub text: String,
    pub created_date: NaiveDate,
    pub user_id: i64,
    pub image_id: i64,
}

/// An image hydrated with its owner, tags and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_file: String,
    pub date: DateTime<Utc>,
    pub user: Owner,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_date: NaiveDate,
    pub user: Owner,
    pub image_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub title: String,
    pub description: String,
    pub image_file: String,
    pub date: DateTime<Utc>,
    pub user_id: i64,
    /// Resolved to tag rows inside the same transaction as the insert.
    pub tag_names: Vec<String>,
}

impl NewImage {
    pub fn new(
        title: String,
        description: String,
        image_file: String,
        user_id: i64,
        tag_names: Vec<String>,
    ) -> Self {
        Self {
            title,
            description,
            image_file,
            date: Utc::now(),
            user_id,
            tag_names,
        }
    }
}

/// Full replacement of an image's editable fields. The owner never changes.
#[derive(Debug, Clone)]
pub struct ImageUpdate {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_file: String,
    pub date: DateTime<Utc>,
    pub tag_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub created_date: NaiveDate,
    pub user_id: i64,
    pub image_id: i64,
}

impl NewComment {
    pub fn new(text: String, user_id: i64, image_id: i64) -> Self {
        Self {
            text,
            created_date: Utc::now().date_naive(),
            user_id,
            image_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageIdQuery {
    #[serde(rename = "imageId")]
    pub image_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub comment: String,
}
