use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, AppState};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub kind: TokenKind,
    pub iat: usize,
    pub exp: usize,
}

/// The caller identity the auth middleware attaches to every protected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
    #[error("malformed subject claim {0:?}")]
    MalformedSubject(String),
}

pub fn issue_token(
    config: &Config,
    user_id: i64,
    email: &str,
    kind: TokenKind,
) -> Result<String, TokenError> {
    let lifetime = match kind {
        TokenKind::Access => config.jwt_expires_in,
        TokenKind::Refresh => config.jwt_refresh_expires_in,
    };
    let now = chrono::Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_owned(),
        kind,
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::minutes(lifetime)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(TokenError::Sign)
}

pub fn issue_pair(config: &Config, user_id: i64, email: &str) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access: issue_token(config, user_id, email, TokenKind::Access)?,
        refresh: issue_token(config, user_id, email, TokenKind::Refresh)?,
    })
}

/// Verifies signature and expiry, then requires the expected kind and an
/// integer subject. Returns the user id with the decoded claims.
pub fn verify_token(
    config: &Config,
    token: &str,
    expected: TokenKind,
) -> Result<(i64, TokenClaims), TokenError> {
    let claims = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(TokenError::Invalid)?
    .claims;

    if claims.kind != expected {
        return Err(TokenError::WrongKind { expected });
    }

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| TokenError::MalformedSubject(claims.sub.clone()))?;

    Ok((user_id, claims))
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
}

/// Rejects the request unless it carries a valid access token, from the
/// `Authorization` header or else the login cookie.
pub async fn auth(
    cookie_jar: CookieJar,
    State(data): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&req)
        .or_else(|| {
            cookie_jar
                .get(TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let (user_id, _) = verify_token(&data.config, &token, TokenKind::Access).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer credential");
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}
