//! Views returned by the controllers. Each one serializes to a JSON document
//! tagged with the view name and carrying that view's model.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::{Comment, Image, Tag};
use crate::user_models::RegistrationEcho;

pub const EDIT_ERROR: &str = "Only the owner of the image can edit the image";
pub const DELETE_ERROR: &str = "Only the owner of the image can delete the image";
pub const LOGIN_ERROR: &str = "Invalid username or password";

#[derive(Debug, Serialize)]
#[serde(tag = "view")]
pub enum View {
    #[serde(rename = "index")]
    Index { images: Vec<Image> },

    #[serde(rename = "images")]
    Images { images: Vec<Image> },

    #[serde(rename = "images/image")]
    ImageDetail {
        image: Image,
        tags: Vec<Tag>,
        comments: Vec<Comment>,
        #[serde(skip_serializing_if = "Option::is_none")]
        edit_error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delete_error: Option<String>,
    },

    #[serde(rename = "images/upload")]
    Upload,

    #[serde(rename = "images/edit")]
    EditImage { image: Image, tags: String },

    #[serde(rename = "users/registration")]
    Registration {
        user: RegistrationEcho,
        #[serde(skip_serializing_if = "Option::is_none")]
        password_type_error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        username_error: Option<String>,
    },

    #[serde(rename = "users/login")]
    Login {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl View {
    pub fn image_detail(image: Image) -> Self {
        Self::detail(image, None, None)
    }

    pub fn edit_denied(image: Image) -> Self {
        Self::detail(image, Some(EDIT_ERROR), None)
    }

    pub fn delete_denied(image: Image) -> Self {
        Self::detail(image, None, Some(DELETE_ERROR))
    }

    fn detail(image: Image, edit_error: Option<&str>, delete_error: Option<&str>) -> Self {
        Self::ImageDetail {
            tags: image.tags.clone(),
            comments: image.comments.clone(),
            image,
            edit_error: edit_error.map(str::to_string),
            delete_error: delete_error.map(str::to_string),
        }
    }

    pub fn registration(user: RegistrationEcho) -> Self {
        Self::Registration {
            user,
            password_type_error: None,
            username_error: None,
        }
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
