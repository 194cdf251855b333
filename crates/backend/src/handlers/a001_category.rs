use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_category::aggregate::{Category, CategoryDto, CategoryId};

use crate::shared::app_state::AppState;

/// GET /api/categories/main
pub async fn list_main(State(state): State<AppState>) -> Result<Json<Vec<Category>>, StatusCode> {
    Ok(Json(state.categories.main_categories().await?))
}

/// GET /api/categories/:id/children
pub async fn list_children(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Category>>, StatusCode> {
    Ok(Json(state.categories.child_categories(id).await?))
}

/// POST /api/categories (admin)
pub async fn create(
    State(state): State<AppState>,
    Json(dto): Json<CategoryDto>,
) -> Result<(StatusCode, Json<Category>), StatusCode> {
    let category = state.categories.create(dto).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(dto): Json<CategoryDto>,
) -> Result<Json<Category>, StatusCode> {
    Ok(Json(state.categories.update(CategoryId(id), dto).await?))
}

/// DELETE /api/categories/:id (admin)
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, StatusCode> {
    state.categories.delete(CategoryId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
