//! Authentication and profile endpoints.
//!
//! Registration and login are public; profile reads and updates require a
//! bearer token. Responses never include the password hash.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{self, CreateUser, UpdateUser, User, UserRole},
    error::{Error, Result},
    middleware::{require_auth, AuthUser},
    AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(rename = "studentId")]
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Public user summary (no credentials).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub role: String,
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            student_id: user.student_id,
            role: user.role,
            profile_image: user.profile_image,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let protected = Router::new()
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .layer(axum::middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if request.name.trim().is_empty() {
        return Err(Error::Validation("Name is required".to_string()));
    }
    if !request.email.contains('@') {
        return Err(Error::Validation("A valid email is required".to_string()));
    }
    if request.password.len() < 6 {
        return Err(Error::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if request.student_id.trim().is_empty() {
        return Err(Error::Validation("Student ID is required".to_string()));
    }
    Ok(())
}

/// Register a new student account.
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    validate_registration(&request)?;

    let password_hash = state.auth.hash_password(&request.password)?;

    let user = db::create_user(
        &state.db,
        CreateUser {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            password_hash,
            student_id: request.student_id.trim().to_string(),
            role: UserRole::Student,
        },
    )
    .await?;

    let token = state.auth.issue_token(&user.id, &user.role)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Log in with email and password.
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = db::get_user_by_email(&state.db, &request.email.trim().to_lowercase())
        .await?
        .ok_or(Error::InvalidCredentials)?;

    state
        .auth
        .verify_password(&request.password, &user.password_hash)?;

    let token = state.auth.issue_token(&user.id, &user.role)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Fetch the authenticated user's profile.
async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = db::get_user(&state.db, &auth.user_id).await?;
    Ok(Json(user.into()))
}

/// Update profile fields.
async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(Error::Validation("Name cannot be empty".to_string()));
        }
    }

    let user = db::update_user(
        &state.db,
        &auth.user_id,
        UpdateUser {
            name: request.name,
            student_id: request.student_id,
            profile_image: None,
        },
    )
    .await?;

    Ok(Json(user.into()))
}

/// Change the password after verifying the current one.
async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    if request.new_password.len() < 6 {
        return Err(Error::Validation(
            "New password must be at least 6 characters".to_string(),
        ));
    }

    let user = db::get_user(&state.db, &auth.user_id).await?;
    state
        .auth
        .verify_password(&request.current_password, &user.password_hash)?;

    let new_hash = state.auth.hash_password(&request.new_password)?;
    db::update_password(&state.db, &auth.user_id, &new_hash).await?;

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}
