use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a002_course::aggregate::{CommentDto, Course, CourseId, CourseUpdateDto};
use contracts::shared::projection::FieldProjectionFilter;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::shared::app_state::AppState;
use crate::system::auth::extractor::CurrentUser;

/// Поля, которые в списке курсов скрыты по умолчанию
pub(crate) const LIST_DEFAULT_EXCEPT: [&str; 1] = ["comments"];

/// Поля, которые клиент не может задать при создании курса
const CREATE_SANITIZED_FIELDS: [&str; 2] = ["authors", "courseFeedback"];

#[derive(Debug, Default, Deserialize)]
pub struct ProjectionQuery {
    /// Список полей через запятую; пустая строка - ничего не исключать
    pub except: Option<String>,
}

impl ProjectionQuery {
    pub(crate) fn fields(&self, default: &[&str]) -> Vec<String> {
        match &self.except {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect(),
            None => default.iter().map(|f| f.to_string()).collect(),
        }
    }
}

pub(crate) fn project<T: serde::Serialize + ?Sized>(
    value: &T,
    except: &[String],
) -> Result<Json<Value>, StatusCode> {
    FieldProjectionFilter::default()
        .project(value, except.is_empty(), except)
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to project response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// GET /api/courses?except=a,b
pub async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<Value>, StatusCode> {
    let courses = state.courses.list_all().await?;
    project(&courses, &query.fields(&LIST_DEFAULT_EXCEPT))
}

/// GET /api/courses/:id?except=a,b
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<Value>, StatusCode> {
    let course = state.courses.get_by_id(CourseId(id)).await?;
    project(&course, &query.fields(&[]))
}

/// POST /api/courses
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let draft = sanitize_create_payload(payload).map_err(|e| {
        tracing::warn!("Rejected course payload: {}", e);
        StatusCode::UNPROCESSABLE_ENTITY
    })?;

    let course = state.courses.create(draft, &claims.sub).await?;
    Ok((StatusCode::CREATED, project(&course, &[])?))
}

/// Черновик курса без полей, которые клиент задавать не может
fn sanitize_create_payload(payload: Value) -> Result<Course, serde_json::Error> {
    FieldProjectionFilter::default().filter_value(payload, CREATE_SANITIZED_FIELDS)
}

/// PUT /api/courses/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i64>,
    Json(dto): Json<CourseUpdateDto>,
) -> Result<Json<Value>, StatusCode> {
    let course = state.courses.update(CourseId(id), &claims.sub, dto).await?;
    project(&course, &[])
}

/// DELETE /api/courses/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state.courses.delete(CourseId(id), &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/courses/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i64>,
    Json(dto): Json<CommentDto>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let course = state.courses.add_comment(CourseId(id), &claims.sub, dto).await?;
    Ok((StatusCode::CREATED, project(&course, &[])?))
}

/// DELETE /api/courses/:id/comments/:comment_id
pub async fn remove_comment(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((id, comment_id)): Path<(i64, Uuid)>,
) -> Result<Json<Value>, StatusCode> {
    let course = state
        .courses
        .remove_comment(CourseId(id), comment_id, &claims.sub)
        .await?;
    project(&course, &[])
}

/// POST /api/courses/:id/purchase
pub async fn purchase(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    let added = state.courses.purchase(CourseId(id), &claims.sub).await?;
    Ok(Json(json!({ "courseId": id, "newPurchase": added })))
}
