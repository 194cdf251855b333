use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::shared::data::db::get_connection;

const DEFAULT_ACCESS_TOKEN_HOURS: i64 = 24;

static ACCESS_TOKEN_HOURS: OnceCell<i64> = OnceCell::new();

/// Задать срок жизни токена из конфигурации (один раз при старте)
pub fn configure(access_token_hours: i64) {
    let _ = ACCESS_TOKEN_HOURS.set(access_token_hours);
}

fn access_token_hours() -> i64 {
    ACCESS_TOKEN_HOURS
        .get()
        .copied()
        .unwrap_or(DEFAULT_ACCESS_TOKEN_HOURS)
}

/// Generate JWT access token
pub async fn generate_access_token(user_id: &str, email: &str, is_admin: bool) -> Result<String> {
    let secret = get_jwt_secret().await?;
    encode_token(&secret, user_id, email, is_admin, access_token_hours())
}

/// Validate JWT token and extract claims
pub async fn validate_token(token: &str) -> Result<TokenClaims> {
    let secret = get_jwt_secret().await?;
    decode_token(&secret, token)
}

fn encode_token(
    secret: &str,
    user_id: &str,
    email: &str,
    is_admin: bool,
    lifetime_hours: i64,
) -> Result<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        is_admin,
        exp: (now + chrono::Duration::hours(lifetime_hours)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

fn decode_token(secret: &str, token: &str) -> Result<TokenClaims> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;
    Ok(token_data.claims)
}

/// Get or create JWT secret from database
pub async fn get_jwt_secret() -> Result<String> {
    if let Some(secret) = get_jwt_secret_from_db().await? {
        return Ok(secret);
    }
    save_jwt_secret_to_db(&generate_jwt_secret()).await?;
    tracing::info!("New JWT secret generated");
    // перечитываем: при гонке побеждает первая запись
    get_jwt_secret_from_db()
        .await?
        .ok_or_else(|| anyhow::anyhow!("JWT secret is missing after insert"))
}

/// Generate a cryptographically secure JWT secret (256 bits)
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

async fn get_jwt_secret_from_db() -> Result<Option<String>> {
    let result = get_connection()?
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_settings WHERE key = ?",
            ["jwt_secret".into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(Some(row.try_get("", "value")?)),
        None => Ok(None),
    }
}

async fn save_jwt_secret_to_db(secret: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    get_connection()?
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT OR IGNORE INTO sys_settings (key, value, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            [
                "jwt_secret".into(),
                secret.to_string().into(),
                "Auto-generated JWT secret for authentication".into(),
                now.clone().into(),
                now.into(),
            ],
        ))
        .await
        .context("Failed to store JWT secret")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let secret = generate_jwt_secret();
        let token = encode_token(&secret, "user-1", "email@email.com", true, 1).unwrap();
        let claims = decode_token(&secret, &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "email@email.com");
        assert!(claims.is_admin);
    }

    #[test]
    fn test_wrong_secret_or_expired_token_is_rejected() {
        let token = encode_token(&generate_jwt_secret(), "u", "e", false, 1).unwrap();
        assert!(decode_token(&generate_jwt_secret(), &token).is_err());

        let secret = generate_jwt_secret();
        let expired = encode_token(&secret, "u", "e", false, -2).unwrap();
        assert!(decode_token(&secret, &expired).is_err());
    }
}
