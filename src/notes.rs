//! Owner-scoped note storage and retrieval.
//!
//! A note is visible to a user only while it is not soft-deleted and the user
//! owns it. Every miss (absent, deleted, foreign) surfaces as the same
//! [`AppError::NotFound`].

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    error::AppError,
    model::{Note, NotePage, NoteWithTags},
    tags,
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: i64,
    pub page_size: i64,
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            tag: None,
        }
    }
}

impl ListParams {
    /// Saturates for huge pages; an offset past the end yields an empty page.
    fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.take())
    }

    fn take(&self) -> i64 {
        self.page_size.min(MAX_PAGE_SIZE)
    }
}

const SELECT_NOTES: &str = "SELECT n.id, n.user_id, n.title, n.content, n.is_deleted, \
     n.created_at, n.updated_at FROM notes n";

async fn find_visible(
    conn: &mut SqliteConnection,
    note_id: i64,
    user_id: i64,
) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(
        "SELECT id, user_id, title, content, is_deleted, created_at, updated_at FROM notes \
         WHERE id = ? AND user_id = ? AND is_deleted = 0",
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn get_note(
    conn: &mut SqliteConnection,
    note_id: i64,
    user_id: i64,
) -> Result<NoteWithTags, AppError> {
    let Some(note) = find_visible(conn, note_id, user_id).await? else {
        tracing::warn!(note_id, user_id, "note not found for user");
        return Err(AppError::NotFound);
    };

    let tags = tags::names_for_notes(conn, &[note.id])
        .await?
        .remove(&note.id)
        .unwrap_or_default();

    Ok(NoteWithTags { note, tags })
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, user_id: i64, params: &ListParams) {
    query
        .push(" WHERE n.user_id = ")
        .push_bind(user_id)
        .push(" AND n.is_deleted = 0");

    // instr() rather than LIKE: LIKE folds ASCII case in SQLite.
    if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
        query
            .push(" AND (instr(n.title, ")
            .push_bind(search.to_owned())
            .push(") > 0 OR instr(n.content, ")
            .push_bind(search.to_owned())
            .push(") > 0)");
    }

    if let Some(tag) = params.tag.as_deref().filter(|t| !t.is_empty()) {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM note_tags nt JOIN tags t ON t.id = nt.tag_id \
                 WHERE nt.note_id = n.id AND t.name = ",
            )
            .push_bind(tag.to_owned())
            .push(")");
    }
}

/// One page of the user's live notes, most recently updated first, plus the
/// size of the whole filtered set.
pub async fn list_notes(
    conn: &mut SqliteConnection,
    user_id: i64,
    params: &ListParams,
) -> Result<NotePage, sqlx::Error> {
    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM notes n");
    push_filters(&mut count_query, user_id, params);
    let total_count: i64 = count_query
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let mut page_query = QueryBuilder::<Sqlite>::new(SELECT_NOTES);
    push_filters(&mut page_query, user_id, params);
    page_query
        .push(" ORDER BY n.updated_at DESC, n.id DESC LIMIT ")
        .push_bind(params.take())
        .push(" OFFSET ")
        .push_bind(params.skip());
    let notes: Vec<Note> = page_query
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

    let ids: Vec<i64> = notes.iter().map(|note| note.id).collect();
    let mut tag_names = tags::names_for_notes(conn, &ids).await?;

    let notes = notes
        .into_iter()
        .map(|note| {
            let tags = tag_names.remove(&note.id).unwrap_or_default();
            NoteWithTags { note, tags }
        })
        .collect();

    Ok(NotePage { notes, total_count })
}

/// Inserts the note and its tag associations. Run inside a transaction.
pub async fn create_note(
    conn: &mut SqliteConnection,
    user_id: i64,
    title: &str,
    content: &str,
    tag_names: &[String],
) -> Result<NoteWithTags, sqlx::Error> {
    let now = Utc::now();
    let note = sqlx::query_as::<_, Note>(
        "INSERT INTO notes (user_id, title, content, is_deleted, created_at, updated_at) \
         VALUES (?, ?, ?, 0, ?, ?) \
         RETURNING id, user_id, title, content, is_deleted, created_at, updated_at",
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    let tags = tags::attach_tags(conn, note.id, tag_names).await?;

    Ok(NoteWithTags { note, tags })
}

/// Rewrites title and content and replaces the tag set. Run inside a
/// transaction. The guarded UPDATE is the first statement so the write lock
/// is taken before anything is read.
pub async fn update_note(
    conn: &mut SqliteConnection,
    note_id: i64,
    user_id: i64,
    title: &str,
    content: &str,
    tag_names: &[String],
) -> Result<NoteWithTags, AppError> {
    let note = sqlx::query_as::<_, Note>(
        "UPDATE notes SET title = ?, content = ?, updated_at = ? \
         WHERE id = ? AND user_id = ? AND is_deleted = 0 \
         RETURNING id, user_id, title, content, is_deleted, created_at, updated_at",
    )
    .bind(title)
    .bind(content)
    .bind(Utc::now())
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(note) = note else {
        tracing::warn!(note_id, user_id, "note not found for user");
        return Err(AppError::NotFound);
    };

    let tags = tags::replace_tags(conn, note.id, tag_names).await?;

    Ok(NoteWithTags { note, tags })
}

pub async fn soft_delete_note(
    conn: &mut SqliteConnection,
    note_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE notes SET is_deleted = 1, updated_at = ? \
         WHERE id = ? AND user_id = ? AND is_deleted = 0",
    )
    .bind(Utc::now())
    .bind(note_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(note_id, user_id, "note not found for user");
        return Err(AppError::NotFound);
    }
    Ok(())
}
