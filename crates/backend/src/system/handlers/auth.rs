use axum::{extract::Json, http::StatusCode};
use contracts::system::auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};

use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service::UserServiceError;
use crate::system::{auth::jwt, users::service as user_service};

async fn issue_token(user_id: &str, email: &str, is_admin: bool) -> Result<String, StatusCode> {
    jwt::generate_access_token(user_id, email, is_admin)
        .await
        .map_err(|e| {
            tracing::error!("Failed to generate access token: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Register handler: creates a regular user and logs them in
pub async fn register(
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), StatusCode> {
    let user = user_service::register(request)
        .await
        .map_err(registration_status)?;
    tracing::info!("User {} registered", user.email);

    let access_token = issue_token(&user.id, &user.email, user.is_admin).await?;
    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            access_token,
            user: user.info(),
        }),
    ))
}

fn registration_status(e: UserServiceError) -> StatusCode {
    match e {
        UserServiceError::Storage(e) => {
            tracing::error!("Registration failed: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        e => {
            tracing::warn!("Registration rejected: {}", e);
            StatusCode::BAD_REQUEST
        }
    }
}

/// Login handler
pub async fn login(Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    let user = user_service::verify_credentials(&request.email, &request.password)
        .await
        .map_err(|e| {
            tracing::error!("Failed to verify credentials: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let access_token = issue_token(&user.id, &user.email, user.is_admin).await?;

    Ok(Json(LoginResponse {
        access_token,
        user: user.info(),
    }))
}

/// Get current user info
pub async fn current_user(
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserInfo>, StatusCode> {
    let user = user_service::get_by_id(&claims.sub)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(user.info()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_errors_split_client_and_storage_failures() {
        assert_eq!(
            registration_status(UserServiceError::EmailTaken),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            registration_status(UserServiceError::WeakPassword("short".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            registration_status(UserServiceError::Storage(anyhow::anyhow!("disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
