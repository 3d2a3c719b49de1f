use chrono::prelude::*;

#[derive(Debug, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A global tag with the number of the requesting user's live notes carrying it.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct TagUsage {
    pub id: i64,
    pub name: String,
    pub notes_count: i64,
}

#[derive(Debug, Clone)]
pub struct NoteWithTags {
    pub note: Note,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NotePage {
    pub notes: Vec<NoteWithTags>,
    pub total_count: i64,
}
