use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{CommentForm, Image, ImageIdQuery, ImageUpdate, NewComment, NewImage};
use crate::session::RequireUser;
use crate::tag_service::{parse_tag_names, tags_to_string};
use crate::views::View;
use crate::AppState;

/// Fields of the upload and edit forms.
#[derive(Debug, Default)]
struct ImageForm {
    title: String,
    description: String,
    tags: String,
    file: Vec<u8>,
    image_id: Option<i64>,
}

impl ImageForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => form.file = field.bytes().await.map_err(bad_multipart)?.to_vec(),
                "title" => form.title = field.text().await.map_err(bad_multipart)?.trim().to_string(),
                "description" => form.description = field.text().await.map_err(bad_multipart)?,
                "tags" => form.tags = field.text().await.map_err(bad_multipart)?,
                "imageId" => {
                    let raw = field.text().await.map_err(bad_multipart)?;
                    let id = raw
                        .trim()
                        .parse()
                        .map_err(|_| AppError::BadRequest("imageId must be a number".to_string()))?;
                    form.image_id = Some(id);
                }
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        if form.title.is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }
        Ok(form)
    }

    fn encoded_file(&self) -> String {
        STANDARD.encode(&self.file)
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(e.to_string())
}

async fn find_image(state: &AppState, id: i64, title: &str) -> Result<Image> {
    state
        .images
        .get_image_by_id_and_title(id, title)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("image {} '{}'", id, title)))
}

pub async fn get_user_images(
    State(state): State<Arc<AppState>>,
    RequireUser(_user): RequireUser,
) -> Result<View> {
    let images = state.images.get_all_images().await?;
    Ok(View::Images { images })
}

pub async fn show_image(
    State(state): State<Arc<AppState>>,
    Path((id, title)): Path<(i64, String)>,
) -> Result<View> {
    let image = find_image(&state, id, &title).await?;
    Ok(View::image_detail(image))
}

pub async fn new_image(RequireUser(_user): RequireUser) -> View {
    View::Upload
}

pub async fn create_image(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = ImageForm::from_multipart(multipart).await?;
    if form.file.is_empty() {
        return Err(AppError::BadRequest("an image file is required".to_string()));
    }

    let tag_names = parse_tag_names(&form.tags);
    let image_file = form.encoded_file();
    state
        .images
        .upload_image(NewImage::new(form.title, form.description, image_file, user.id, tag_names))
        .await?;

    Ok(Redirect::to("/images"))
}

pub async fn edit_image(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    Query(query): Query<ImageIdQuery>,
) -> Result<View> {
    let image = state.images.get_image(query.image_id).await?;

    if !state.images.confirm_owner(image.id, &user.username).await? {
        tracing::info!(image_id = image.id, user_id = user.id, "Edit refused for non-owner");
        return Ok(View::edit_denied(image));
    }

    Ok(View::EditImage {
        tags: tags_to_string(&image.tags),
        image,
    })
}

pub async fn edit_image_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    multipart: Multipart,
) -> Result<Response> {
    let form = ImageForm::from_multipart(multipart).await?;
    let image_id = form
        .image_id
        .ok_or_else(|| AppError::BadRequest("imageId is required".to_string()))?;
    let image = state.images.get_image(image_id).await?;

    if !state.images.confirm_owner(image.id, &user.username).await? {
        tracing::info!(image_id = image.id, user_id = user.id, "Edit refused for non-owner");
        return Ok(View::edit_denied(image).into_response());
    }

    // An empty upload keeps the stored file
    let image_file = if form.file.is_empty() {
        image.image_file
    } else {
        form.encoded_file()
    };

    let updated = state
        .images
        .update_image(ImageUpdate {
            id: image.id,
            title: form.title,
            description: form.description,
            image_file,
            date: Utc::now(),
            tag_names: parse_tag_names(&form.tags),
        })
        .await?;

    let location = format!("/images/{}/{}", updated.id, urlencoding::encode(&updated.title));
    Ok(Redirect::to(&location).into_response())
}

pub async fn delete_image_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    Query(query): Query<ImageIdQuery>,
) -> Result<Response> {
    let image = state.images.get_image(query.image_id).await?;

    if !state.images.confirm_owner(image.id, &user.username).await? {
        tracing::info!(image_id = image.id, user_id = user.id, "Delete refused for non-owner");
        return Ok(View::delete_denied(image).into_response());
    }

    state.images.delete_image(image.id).await?;
    Ok(Redirect::to("/images").into_response())
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    Path((image_id, image_title)): Path<(i64, String)>,
    Form(form): Form<CommentForm>,
) -> Result<View> {
    let text = form.comment.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("comment cannot be empty".to_string()));
    }

    let mut image = find_image(&state, image_id, &image_title).await?;
    state
        .images
        .create_comment(NewComment::new(text.to_string(), user.id, image.id))
        .await?;

    image.comments = state.images.get_comments(image.id).await?;
    Ok(View::image_detail(image))
}
