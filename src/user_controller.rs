use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::session::expired_cookie;
use crate::user_models::{normalize_username, LoginForm, RegistrationEcho, RegistrationForm};
use crate::user_service::{LoginError, RegistrationError};
use crate::views::{View, LOGIN_ERROR};
use crate::AppState;

pub async fn registration() -> View {
    View::registration(RegistrationEcho::default())
}

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response> {
    let echo = RegistrationEcho::from(&form);

    if normalize_username(&form.username).is_empty() {
        return Ok(View::Registration {
            user: echo,
            password_type_error: None,
            username_error: Some("Username is required".to_string()),
        }
        .into_response());
    }

    match state.users.register_user(&form).await {
        Ok(_) => Ok(Redirect::to("/users/login").into_response()),
        Err(e @ RegistrationError::InvalidPassword) => Ok(View::Registration {
            user: echo,
            password_type_error: Some(e.to_string()),
            username_error: None,
        }
        .into_response()),
        Err(e @ RegistrationError::UsernameTaken(_)) => Ok(View::Registration {
            user: echo,
            password_type_error: None,
            username_error: Some(e.to_string()),
        }
        .into_response()),
        Err(e @ (RegistrationError::Hashing(_) | RegistrationError::Task(_))) => {
            Err(AppError::Internal(e.to_string()))
        }
        Err(RegistrationError::Repository(e)) => Err(e.into()),
    }
}

pub async fn login() -> View {
    View::Login { error: None }
}

pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let login = state
        .users
        .login(&form.username, &form.password)
        .await
        .map_err(|e| match e {
            LoginError::Repository(e) => AppError::from(e),
            LoginError::Task(e) => AppError::Internal(e.to_string()),
        })?;

    let Some(user) = login else {
        tracing::info!(username = %form.username, "Login failed");
        return Ok(View::Login {
            error: Some(LOGIN_ERROR.to_string()),
        }
        .into_response());
    };

    let token = state
        .session
        .issue(&user)
        .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok((
        [(header::SET_COOKIE, state.session.cookie(&token))],
        Redirect::to("/images"),
    )
        .into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Result<Response> {
    let images = state.images.get_all_images().await?;
    Ok(([(header::SET_COOKIE, expired_cookie())], View::Index { images }).into_response())
}
