use chrono::prelude::*;
use serde::Serialize;

use crate::model::{NotePage, NoteWithTags, TagUsage, User};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub token: String,
    pub refresh_token: String,
}

impl AuthResponse {
    pub fn new(user: &User, token: String, refresh_token: String) -> Self {
        AuthResponse {
            id: user.id,
            email: user.email.to_owned(),
            full_name: user.full_name.to_owned(),
            token,
            refresh_token,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNote {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<NoteWithTags> for CreatedNote {
    fn from(NoteWithTags { note, tags }: NoteWithTags) -> Self {
        CreatedNote {
            id: note.id,
            title: note.title,
            content: note.content,
            tags,
            created_at: note.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedNote {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteWithTags> for UpdatedNote {
    fn from(NoteWithTags { note, tags }: NoteWithTags) -> Self {
        UpdatedNote {
            id: note.id,
            title: note.title,
            content: note.content,
            tags,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FilteredNote {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteWithTags> for FilteredNote {
    fn from(NoteWithTags { note, tags }: NoteWithTags) -> Self {
        FilteredNote {
            id: note.id,
            title: note.title,
            content: note.content,
            tags,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotesResponse {
    pub notes: Vec<FilteredNote>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}

impl NotesResponse {
    pub fn new(page: NotePage, page_number: i64, page_size: i64) -> Self {
        NotesResponse {
            notes: page.notes.into_iter().map(FilteredNote::from).collect(),
            total_count: page.total_count,
            page: page_number,
            page_size,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TagItem {
    pub id: i64,
    pub name: String,
    pub notes_count: i64,
}

impl From<TagUsage> for TagItem {
    fn from(tag: TagUsage) -> Self {
        TagItem {
            id: tag.id,
            name: tag.name,
            notes_count: tag.notes_count,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct TagsResponse {
    pub tags: Vec<TagItem>,
}
