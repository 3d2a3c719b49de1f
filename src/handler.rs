use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde_json::json;

use crate::{
    config::Config,
    db,
    error::AppError,
    jwt_auth::{issue_pair, verify_token, AuthUser, TokenKind, TokenPair, TOKEN_COOKIE},
    notes, password,
    request::*,
    response::*,
    tags, users, AppState,
};

fn token_cookie(value: String, max_age: time::Duration) -> Result<HeaderValue, AppError> {
    let cookie = Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .max_age(max_age)
        .same_site(SameSite::Lax)
        .http_only(true)
        .build();

    HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
}

fn with_token_cookie(
    config: &Config,
    status: StatusCode,
    body: AuthResponse,
) -> Result<Response, AppError> {
    let cookie = token_cookie(
        body.token.to_owned(),
        time::Duration::minutes(config.jwt_expires_in),
    )?;

    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

fn issue_tokens(config: &Config, user_id: i64, email: &str) -> Result<TokenPair, AppError> {
    issue_pair(config, user_id, email).map_err(|e| AppError::Internal(e.to_string()))
}

pub async fn health_checker_handler(State(data): State<Arc<AppState>>) -> impl IntoResponse {
    match db::ping(&data.db).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "healthy"}))),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unhealthy"})),
            )
        }
    }
}

pub async fn register_user_handler(
    State(data): State<Arc<AppState>>,
    ValidJson(body): ValidJson<RegisterUser>,
) -> Result<impl IntoResponse, AppError> {
    let email = body.email.trim().to_ascii_lowercase();
    let hashed_password = password::hash_password(&body.password)
        .map_err(|e| AppError::Internal(format!("Error while hashing password: {e}")))?;

    let mut tx = db::begin_write(&data.db).await?;
    let user = users::create_user(&mut tx, &email, &hashed_password, body.full_name.trim()).await?;
    tx.commit().await?;

    let tokens = issue_tokens(&data.config, user.id, &user.email)?;
    tracing::info!(user_id = user.id, email = %user.email, "user registered");

    with_token_cookie(
        &data.config,
        StatusCode::CREATED,
        AuthResponse::new(&user, tokens.access, tokens.refresh),
    )
}

pub async fn login_user_handler(
    State(data): State<Arc<AppState>>,
    ValidJson(body): ValidJson<LoginUser>,
) -> Result<impl IntoResponse, AppError> {
    let email = body.email.trim().to_ascii_lowercase();

    let mut conn = data.db.acquire().await?;
    let user = users::find_by_email(&mut conn, &email).await?;
    drop(conn);

    let user = match user {
        Some(user) if password::verify_password(&body.password, &user.password_hash) => user,
        _ => {
            tracing::warn!(%email, "failed login attempt");
            return Err(AppError::Unauthorized);
        }
    };

    let tokens = issue_tokens(&data.config, user.id, &user.email)?;
    tracing::info!(user_id = user.id, "user logged in");

    with_token_cookie(
        &data.config,
        StatusCode::OK,
        AuthResponse::new(&user, tokens.access, tokens.refresh),
    )
}

pub async fn refresh_token_handler(
    State(data): State<Arc<AppState>>,
    ValidJson(body): ValidJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user_id, _) = verify_token(&data.config, &body.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            tracing::warn!(error = %e, "refresh rejected");
            AppError::Unauthorized
        })?;

    let mut conn = data.db.acquire().await?;
    let user = users::find_by_id(&mut conn, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    drop(conn);

    let tokens = issue_tokens(&data.config, user.id, &user.email)?;
    tracing::info!(user_id, "token refreshed");

    Ok(Json(TokenResponse {
        token: tokens.access,
        refresh_token: tokens.refresh,
    }))
}

pub async fn logout_handler() -> Result<impl IntoResponse, AppError> {
    let cookie = token_cookie(String::new(), time::Duration::hours(-1))?;

    let mut response = Json(json!({"status": "success"})).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

pub async fn get_notes_handler(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<GetNotes>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::validation("query", e.body_text()))?;
    let params = query.into_params()?;

    let mut conn = data.db.acquire().await?;
    let page = notes::list_notes(&mut conn, user.id, &params).await?;

    tracing::info!(
        user_id = user.id,
        count = page.notes.len(),
        total = page.total_count,
        "retrieved notes"
    );
    Ok(Json(NotesResponse::new(page, params.page, params.page_size)))
}

pub async fn get_note_handler(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = data.db.acquire().await?;
    let note = notes::get_note(&mut conn, id, user.id).await?;
    Ok(Json(FilteredNote::from(note)))
}

pub async fn post_note_handler(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<PostNote>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = db::begin_write(&data.db).await?;
    let note = notes::create_note(&mut tx, user.id, &body.title, &body.content, &body.tags).await?;
    tx.commit().await?;

    tracing::info!(note_id = note.note.id, user_id = user.id, "note created");
    let location = format!("/notes/{}", note.note.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CreatedNote::from(note)),
    ))
}

pub async fn put_note_handler(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<PutNote>,
) -> Result<impl IntoResponse, AppError> {
    if body.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::validation("id", "Id does not match the route"));
    }

    let mut tx = db::begin_write(&data.db).await?;
    let note =
        notes::update_note(&mut tx, id, user.id, &body.title, &body.content, &body.tags).await?;
    tx.commit().await?;

    tracing::info!(note_id = id, user_id = user.id, "note updated");
    Ok(Json(UpdatedNote::from(note)))
}

pub async fn delete_note_handler(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = data.db.acquire().await?;
    notes::soft_delete_note(&mut conn, id, user.id).await?;

    tracing::info!(note_id = id, user_id = user.id, "note deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_tags_handler(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = data.db.acquire().await?;
    let usage = tags::list_usage(&mut conn, user.id).await?;

    tracing::info!(user_id = user.id, count = usage.len(), "retrieved tags");
    Ok(Json(TagsResponse {
        tags: usage.into_iter().map(TagItem::from).collect(),
    }))
}
