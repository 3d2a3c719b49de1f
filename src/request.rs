use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    error::{AppError, FieldErrors},
    notes::{ListParams, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_FULL_NAME_LENGTH: usize = 100;
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

#[derive(Default)]
struct Checks(FieldErrors);

impl Checks {
    fn require(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0
                .entry(field.to_owned())
                .or_default()
                .push(message.to_owned());
        }
        self
    }

    fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// JSON body that has been deserialized and then passed [`Validate`].
/// Both kinds of failure come back as a 400 with field detail.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation("body", rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl Validate for RegisterUser {
    fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks
            .require(!is_blank(&self.email), "email", "Email is required")
            .require(
                is_blank(&self.email) || looks_like_email(&self.email),
                "email",
                "Email is not a valid email address",
            )
            .require(
                self.password.chars().count() >= MIN_PASSWORD_LENGTH,
                "password",
                "Password must be at least 6 characters",
            )
            .require(!is_blank(&self.full_name), "fullName", "Full name is required")
            .require(
                self.full_name.chars().count() <= MAX_FULL_NAME_LENGTH,
                "fullName",
                "Full name must be 100 characters or fewer",
            );
        checks.finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

impl Validate for LoginUser {
    fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks
            .require(!is_blank(&self.email), "email", "Email is required")
            .require(
                is_blank(&self.email) || looks_like_email(&self.email),
                "email",
                "Email is not a valid email address",
            )
            .require(!self.password.is_empty(), "password", "Password is required");
        checks.finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

impl Validate for RefreshTokenRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(
            !is_blank(&self.refresh_token),
            "refreshToken",
            "Refresh token is required",
        );
        checks.finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostNote {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutNote {
    /// Optional echo of the route id; must match it when present.
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn check_note_fields(checks: &mut Checks, title: &str, content: &str, tags: &[String]) {
    checks
        .require(!is_blank(title), "title", "Title is required")
        .require(
            title.chars().count() <= MAX_TITLE_LENGTH,
            "title",
            "Title must be 200 characters or fewer",
        )
        .require(!is_blank(content), "content", "Content is required")
        .require(
            tags.iter().all(|tag| !is_blank(tag)),
            "tags",
            "Tag names cannot be empty",
        );
}

impl Validate for PostNote {
    fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        check_note_fields(&mut checks, &self.title, &self.content, &self.tags);
        checks.finish()
    }
}

impl Validate for PutNote {
    fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        check_note_fields(&mut checks, &self.title, &self.content, &self.tags);
        checks.finish()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetNotes {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl GetNotes {
    pub fn into_params(self) -> Result<ListParams, AppError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        let mut checks = Checks::default();
        checks
            .require(page >= 1, "page", "Page must be at least 1")
            .require(page_size >= 1, "pageSize", "Page size must be at least 1");
        checks.finish()?;

        Ok(ListParams {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
            search: self.search,
            tag: self.tag,
        })
    }
}
