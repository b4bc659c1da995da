// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    pub name: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Consecutive calendar days with a qualifying activity.
    pub streak: i32,

    pub last_active_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: String,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
