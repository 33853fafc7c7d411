use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nook_types::models::Role;

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

/// The authenticated caller. Built from the stored user row, not the token
/// claims, so a stale token cannot carry a revoked role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Extract and validate JWT from Authorization header, then resolve the
/// subject against the user store. A token whose subject no longer exists
/// is rejected the same way as an invalid one.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    let subject = token_data.claims.sub.to_string();
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&subject))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::Unauthorized)?;

    let user = AuthUser {
        id: row
            .id
            .parse()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id: {}", e)))?,
        email: row.email,
        role: row
            .role
            .parse::<Role>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?,
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
