use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    error::{is_unique_violation, AppError},
    model::User,
};

pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Inserts a user. A taken email is a Conflict whether it is caught by the
/// lookup or, under a concurrent registration, by the unique index.
pub async fn create_user(
    conn: &mut SqliteConnection,
    email: &str,
    password_hash: &str,
    full_name: &str,
) -> Result<User, AppError> {
    if find_by_email(conn, email).await?.is_some() {
        return Err(email_taken());
    }

    let now = Utc::now();
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, full_name, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            email_taken()
        } else {
            AppError::Persistence(e)
        }
    })
}

fn email_taken() -> AppError {
    AppError::Conflict("User with this email already exists".to_owned())
}
