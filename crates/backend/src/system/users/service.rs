use anyhow::Result;
use chrono::Utc;
use contracts::system::auth::RegisterRequest;
use contracts::system::users::{CreateUserDto, User};
use thiserror::Error;

use super::repository;
use crate::system::auth::password;

/// Registration failures: everything except `Storage` is the caller's fault
#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Email already registered")]
    EmailTaken,
    #[error("{0}")]
    WeakPassword(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Create a new user
pub async fn create(dto: CreateUserDto) -> std::result::Result<String, UserServiceError> {
    let email = dto.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(UserServiceError::InvalidEmail);
    }
    password::validate_password_strength(&dto.password)
        .map_err(|e| UserServiceError::WeakPassword(e.to_string()))?;

    if repository::get_by_email(&email).await?.is_some() {
        return Err(UserServiceError::EmailTaken);
    }

    let password_hash = password::hash_password(&dto.password)?;

    let user_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let user = User {
        id: user_id.clone(),
        email,
        first_name: dto.first_name,
        last_name: dto.last_name,
        is_active: true,
        is_admin: dto.is_admin,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
    };

    repository::create_with_password(&user, &password_hash).await?;

    Ok(user_id)
}

/// Self-registration; never grants admin rights
pub async fn register(request: RegisterRequest) -> std::result::Result<User, UserServiceError> {
    let user_id = create(CreateUserDto {
        email: request.email,
        password: request.password,
        first_name: request.first_name,
        last_name: request.last_name,
        is_admin: false,
    })
    .await?;

    let user = repository::get_by_id(&user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User {} missing after insert", user_id))?;
    Ok(user)
}

pub async fn get_by_id(id: &str) -> Result<Option<User>> {
    repository::get_by_id(id).await
}

/// Check email and password; `None` for unknown user, wrong password or inactive account
pub async fn verify_credentials(email: &str, password_plain: &str) -> Result<Option<User>> {
    let Some(user) = repository::get_by_email(email).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }

    let Some(hash) = repository::get_password_hash(&user.id).await? else {
        return Ok(None);
    };
    if !password::verify_password(password_plain, &hash)? {
        return Ok(None);
    }

    repository::update_last_login(&user.id, &Utc::now().to_rfc3339()).await?;
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(email: &str, password: &str) -> CreateUserDto {
        CreateUserDto {
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input_before_storage() {
        assert!(matches!(
            create(dto("no-at-sign", "secret")).await,
            Err(UserServiceError::InvalidEmail)
        ));
        assert!(matches!(
            create(dto("user@email.com", "abc")).await,
            Err(UserServiceError::WeakPassword(_))
        ));
    }
}
