// src/users/users_router.rs

use actix_web::{get, post, web, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::{query, query_as, query_scalar};

use super::auth_middleware::{issue_token, AuthenticatedUser};
use super::users_structs::{AuthResponse, LoginRequest, NewUser, User, UserProfile, UserRole};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::shared::shared_structs::GenericResponse;
use crate::AppState;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone_number, created_at";

// pg_advisory_xact_lock key held while a user is registered
const REGISTRATION_LOCK: i64 = 0x6269_6a6f_7500;

/// Role of a new account: admin while there are no users yet, otherwise the
/// requested role (staff by default) and only when an admin asks for it.
fn role_for_new_user(
    existing_users: i64,
    caller: Option<&AuthenticatedUser>,
    requested: Option<UserRole>,
) -> Result<UserRole, AppError> {
    if existing_users == 0 {
        return Ok(UserRole::Admin);
    }
    let admin = caller.ok_or_else(|| AppError::Unauthorized("Missing authentication token.".into()))?;
    admin.require_admin()?;
    tracing::debug!(by = %admin.email, "admin registering a user");
    Ok(requested.unwrap_or(UserRole::Staff))
}

/// Register a new user.
///
/// While the users table is empty anyone may register and the account is
/// created as admin. Afterwards only admins can add users.
#[post("/users/register")]
pub async fn register_user(
    data: web::Data<AppState>,
    caller: Option<AuthenticatedUser>,
    new_user: web::Json<NewUser>,
) -> Result<HttpResponse, AppError> {
    new_user.validate().map_err(AppError::Validation)?;

    let password_hash = hash(&new_user.password, DEFAULT_COST).map_err(|e| {
        tracing::error!(error = ?e, "failed to hash password");
        AppError::Internal("Failed to process password.".into())
    })?;

    // Count and insert under one lock so two concurrent first
    // registrations cannot both become admin
    let mut transaction = data.db_pool.begin().await?;
    query("SELECT pg_advisory_xact_lock($1)")
        .bind(REGISTRATION_LOCK)
        .execute(&mut *transaction)
        .await?;

    let existing: i64 = query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *transaction)
        .await?;
    if existing == 0 {
        tracing::info!("no users yet, first account becomes admin");
    }
    let role = role_for_new_user(existing, caller.as_ref(), new_user.role)?;

    let user = query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, role, phone_number) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
    ))
    .bind(new_user.name.trim())
    .bind(new_user.email.trim().to_lowercase())
    .bind(&password_hash)
    .bind(role)
    .bind(&new_user.phone_number)
    .fetch_one(&mut *transaction)
    .await?;

    transaction.commit().await?;

    tracing::info!(user_id = %user.id, role = ?user.role, "user registered");
    Ok(HttpResponse::Created().json(GenericResponse::success(
        "User registered successfully!",
        UserProfile::from(user),
    )))
}

/// Exchange e-mail and password for a JWT.
#[post("/users/login")]
pub async fn login_user(
    data: web::Data<AppState>,
    auth: web::Data<AuthConfig>,
    login: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials.".into());

    let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(login.email.trim().to_lowercase())
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(invalid)?;

    let matches = verify(&login.password, &user.password_hash).map_err(|e| {
        tracing::error!(error = ?e, "failed to verify password");
        AppError::Internal("Failed to verify password.".into())
    })?;
    if !matches {
        return Err(invalid());
    }

    let token = issue_token(&user, &auth).map_err(|e| {
        tracing::error!(error = ?e, "failed to sign jwt");
        AppError::Internal("Failed to issue token.".into())
    })?;

    Ok(HttpResponse::Ok().json(GenericResponse::success(
        "Login successful!",
        AuthResponse {
            token,
            user: UserProfile::from(user),
        },
    )))
}

/// Profile of the caller.
#[get("/users/me")]
pub async fn current_user(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(caller.user_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    Ok(HttpResponse::Ok().json(GenericResponse::success("Current user", UserProfile::from(user))))
}
