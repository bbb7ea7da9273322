//! Image hosting service: users register, upload tagged images, edit or
//! delete the images they own, and comment on any image.

pub mod config;
pub mod error;
pub mod image_repository;
pub mod image_service;
pub mod models;
pub mod session;
pub mod storage;
pub mod tag_service;
pub mod user_models;
pub mod user_repository;
pub mod user_service;
pub mod views;

mod home_controller;
mod image_controller;
mod user_controller;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use config::Config;
use image_repository::ImageRepository;
use image_service::ImageService;
use session::SessionKeys;
use storage::Storage;
use user_repository::UserRepository;
use user_service::UserService;

pub struct AppState {
    pub images: ImageService,
    pub users: UserService,
    pub session: SessionKeys,
    pub config: Config,
}

impl AppState {
    pub fn new(storage: Arc<Storage>, config: Config) -> Self {
        Self {
            images: ImageService::new(ImageRepository::new(storage.clone())),
            users: UserService::new(UserRepository::new(storage), config.bcrypt_cost),
            session: SessionKeys::new(
                config.session_secret.as_bytes(),
                Duration::hours(config.session_ttl_hours),
            ),
            config,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(home_controller::get_all_images))
        .route("/images", get(image_controller::get_user_images))
        .route(
            "/images/upload",
            get(image_controller::new_image).post(image_controller::create_image),
        )
        .route("/images/{id}/{title}", get(image_controller::show_image))
        .route(
            "/editImage",
            get(image_controller::edit_image).put(image_controller::edit_image_submit),
        )
        .route("/deleteImage", delete(image_controller::delete_image_submit))
        .route(
            "/image/{image_id}/{image_title}/comments",
            post(image_controller::create_comment),
        )
        .route(
            "/users/registration",
            get(user_controller::registration).post(user_controller::register_user),
        )
        .route(
            "/users/login",
            get(user_controller::login).post(user_controller::login_user),
        )
        .route("/users/logout", post(user_controller::logout))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
