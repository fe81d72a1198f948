//! Middleware for Campus Hub.
//!
//! Bearer-token authentication shared by the protected API routes.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{error::Error, AppState};

/// Authenticated user context injected into request extensions.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Extract the bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<String> {
    let auth_header = req.headers().get(AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(str::to_string)
}

/// Middleware that requires a valid bearer token.
///
/// Decodes the JWT, re-reads the user's role from the store (so a role
/// change takes effect without reissuing tokens), and injects `AuthUser`
/// into request extensions.
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing, malformed, expired,
/// or the subject no longer exists.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_bearer_token(&req).ok_or(Error::Unauthenticated)?;

    let claims = state.auth.decode_token(&token)?;

    let user = crate::db::get_user(&state.db, &claims.sub)
        .await
        .map_err(|_| Error::Unauthenticated)?;

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(req).await)
}
