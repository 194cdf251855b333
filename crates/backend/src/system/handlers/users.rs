use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::handlers::a002_course::{project, ProjectionQuery, LIST_DEFAULT_EXCEPT};
use crate::shared::app_state::AppState;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/system/users/me/courses - courses purchased by the current user
pub async fn purchased_courses(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<Value>, StatusCode> {
    let courses = state.courses.purchased_courses(&claims.sub).await?;
    project(&courses, &query.fields(&LIST_DEFAULT_EXCEPT))
}
