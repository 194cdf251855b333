pub mod a001_category;
pub mod a002_course;

use axum::http::StatusCode;

use crate::domain::a001_category::service::CategoryServiceError;
use crate::domain::a002_course::service::CourseServiceError;

impl From<CourseServiceError> for StatusCode {
    fn from(e: CourseServiceError) -> Self {
        match e {
            CourseServiceError::NotFound(_) | CourseServiceError::CommentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CourseServiceError::NotAnAuthor { .. } | CourseServiceError::NotCommentAuthor { .. } => {
                tracing::warn!("{}", e);
                StatusCode::FORBIDDEN
            }
            CourseServiceError::CategoryNotFound(_) | CourseServiceError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            CourseServiceError::Conflict(_) => StatusCode::CONFLICT,
            CourseServiceError::Storage(e) => {
                tracing::error!("Course storage failure: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<CategoryServiceError> for StatusCode {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            CategoryServiceError::CategoryInUse { .. } => {
                tracing::warn!("{}", e);
                StatusCode::CONFLICT
            }
            CategoryServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            CategoryServiceError::Storage(e) => {
                tracing::error!("Category storage failure: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
