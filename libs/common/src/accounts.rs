//! User accounts: registration, login and the user repository
//!
//! Services that need identities merge [`router`] into their own router and
//! apply [`USERS_SCHEMA`] at startup. The store sits behind the [`UserStore`]
//! trait so handlers can run against an in-memory fixture in tests.

use std::sync::Arc;

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    auth::JwtService,
    error::{DatabaseError, DatabaseResult},
    http::{ApiError, ApiResult, JsonBody, WithRejection},
    validation::{validate_email, validate_password, validate_username},
};

/// DDL for the `users` table
pub const USERS_SCHEMA: &str = include_str!("../sql/users.sql");

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Persistence port for users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a taken username is [`DatabaseError::Conflict`]
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Find a user by exact username
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;
}

/// Shared handle to a user store
pub type DynUserStore = Arc<dyn UserStore>;

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, is_staff, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_query(e, "Username already taken."))
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_staff, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

/// Hash a password with argon2 and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub confirmation: String,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public part of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Response for registration and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Routes for `/register` and `/login`
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    DynUserStore: FromRef<S>,
    JwtService: FromRef<S>,
{
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

fn token_response(jwt: &JwtService, user: User) -> ApiResult<TokenResponse> {
    let access_token = jwt.generate_token(user.id, &user.username).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(TokenResponse {
        user: UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        },
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt.token_expiry(),
    })
}

/// User registration endpoint
pub async fn register(
    State(users): State<DynUserStore>,
    State(jwt): State<JwtService>,
    WithRejection(Json(payload), _): JsonBody<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Registration attempt for user: {}", payload.username);

    validate_username(&payload.username).map_err(ApiError::BadRequest)?;
    if !payload.email.is_empty() {
        validate_email(&payload.email).map_err(ApiError::BadRequest)?;
    }
    validate_password(&payload.password).map_err(ApiError::BadRequest)?;
    if payload.password != payload.confirmation {
        return Err(ApiError::BadRequest("Passwords must match.".to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("{}", e);
        ApiError::InternalServerError
    })?;

    let user = users
        .create(&NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(token_response(&jwt, user)?)))
}

/// User login endpoint
pub async fn login(
    State(users): State<DynUserStore>,
    State(jwt): State<JwtService>,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for user: {}", payload.username);

    let user = users
        .find_by_username(&payload.username)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = verify_password(&user.password_hash, &payload.password).map_err(|e| {
        error!("{}", e);
        ApiError::InternalServerError
    })?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    Ok(Json(token_response(&jwt, user)?))
}
