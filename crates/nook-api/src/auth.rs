use std::sync::Arc;

use anyhow::Context;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use nook_db::Database;
use nook_db::models::UserRow;
use nook_types::api::{LoginRequest, LoginResponse, RegisterRequest};
use nook_types::models::{Role, User};

use crate::error::{ApiError, ApiResult, join_error};
use crate::middleware::{AuthUser, Claims};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
}

// -- Services --

pub fn register_user(db: &Database, req: &RegisterRequest) -> ApiResult<User> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if db.get_user_by_email(email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered"));
    }

    let row = UserRow {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password: hash_password(&req.password)?,
        role: Role::User.as_str().to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    db.create_user(&row)?;

    info!("Registered user {}", row.email);
    user_from_row(row)
}

/// Unknown email and wrong password produce the same error, so login
/// failures do not reveal which accounts exist.
pub fn login_user(
    db: &Database,
    jwt_secret: &str,
    token_expiry_minutes: i64,
    req: &LoginRequest,
) -> ApiResult<LoginResponse> {
    let row = db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&req.password, &row.password)? {
        return Err(ApiError::Unauthorized);
    }

    let user = user_from_row(row)?;
    let access_token = create_token(jwt_secret, token_expiry_minutes, &user)?;

    Ok(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    })
}

/// Startup seeding: ensures the configured admin account exists.
pub fn seed_admin(db: &Database, email: &str, password: &str) -> ApiResult<()> {
    if db.get_user_by_email(email)?.is_some() {
        return Ok(());
    }

    let row = UserRow {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password: hash_password(password)?,
        role: Role::Admin.as_str().to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    db.create_user(&row)?;

    info!("Admin user {} seeded", email);
    Ok(())
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_token(secret: &str, expiry_minutes: i64, user: &User) -> ApiResult<String> {
    let claims = Claims {
        sub: user.id,
        role: user.role,
        exp: (Utc::now() + chrono::Duration::minutes(expiry_minutes)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode token")?;

    Ok(token)
}

pub(crate) fn user_from_row(row: UserRow) -> ApiResult<User> {
    Ok(User {
        id: row.id.parse().context("corrupt user id")?,
        role: row
            .role
            .parse::<Role>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?,
        email: row.email,
        created_at: row
            .created_at
            .parse::<DateTime<Utc>>()
            .context("corrupt created_at")?,
    })
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = tokio::task::spawn_blocking(move || register_user(&state.db, &req))
        .await
        .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = tokio::task::spawn_blocking(move || {
        login_user(
            &state.db,
            &state.jwt_secret,
            state.token_expiry_minutes,
            &req,
        )
    })
    .await
    .map_err(join_error)??;

    Ok(Json(response))
}

pub async fn me(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(serde_json::json!({
        "id": user.id,
        "email": user.email,
        "role": user.role,
    }))
}
