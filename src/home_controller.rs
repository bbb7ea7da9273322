use axum::extract::State;
use std::sync::Arc;

use crate::error::Result;
use crate::views::View;
use crate::AppState;

pub async fn get_all_images(State(state): State<Arc<AppState>>) -> Result<View> {
    let images = state.images.get_all_images().await?;
    Ok(View::Index { images })
}
