//! Tag reconciliation for notes.
//!
//! Tags are global rows shared by every user; a note carries a tag through a
//! `note_tags` row. Every function here works on a caller-supplied connection,
//! normally borrowed from an open transaction, so the caller decides when the
//! whole change becomes visible.

use std::collections::{HashMap, HashSet};

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::model::{Tag, TagUsage};

/// Removes exact duplicates, keeping the first occurrence of each name.
/// Comparison is case-sensitive and whitespace-significant.
pub fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .iter()
        .filter(|name| seen.insert(*name))
        .cloned()
        .collect()
}

pub async fn find_by_names(
    conn: &mut SqliteConnection,
    names: &[String],
) -> Result<Vec<Tag>, sqlx::Error> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new("SELECT id, name FROM tags WHERE name IN (");
    let mut separated = query.separated(", ");
    for name in names {
        separated.push_bind(name.clone());
    }
    separated.push_unseparated(")");

    let tags = query.build_query_as::<Tag>().fetch_all(&mut *conn).await?;
    Ok(tags)
}

/// Inserts `name`, or reads back the existing row when the name is already
/// stored. Callers hold the write lock, so the fallback only fires for a
/// name that was never looked up first.
async fn insert_tag(conn: &mut SqliteConnection, name: &str) -> Result<Tag, sqlx::Error> {
    let inserted = sqlx::query_as::<_, Tag>(
        "INSERT INTO tags (name) VALUES (?) ON CONFLICT (name) DO NOTHING RETURNING id, name",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    match inserted {
        Some(tag) => Ok(tag),
        None => {
            sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *conn)
                .await
        }
    }
}

/// Returns one Tag row per name in `names`, creating the missing ones.
/// `names` must already be deduplicated.
pub async fn ensure_tags(
    conn: &mut SqliteConnection,
    names: &[String],
) -> Result<Vec<Tag>, sqlx::Error> {
    let mut by_name: HashMap<String, Tag> = find_by_names(conn, names)
        .await?
        .into_iter()
        .map(|tag| (tag.name.clone(), tag))
        .collect();

    let missing: Vec<&String> = names
        .iter()
        .filter(|name| !by_name.contains_key(name.as_str()))
        .collect();
    if !missing.is_empty() {
        tracing::debug!(count = missing.len(), "creating new tags");
    }
    for name in missing {
        let tag = insert_tag(conn, name).await?;
        by_name.insert(tag.name.clone(), tag);
    }

    Ok(names
        .iter()
        .filter_map(|name| by_name.remove(name.as_str()))
        .collect())
}

/// Associates a freshly created note with `names`. Returns the deduplicated
/// names in request order.
pub async fn attach_tags(
    conn: &mut SqliteConnection,
    note_id: i64,
    names: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    let names = dedupe_names(names);
    let tags = ensure_tags(conn, &names).await?;

    for tag in &tags {
        sqlx::query("INSERT INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(note_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(names)
}

/// Makes the note's tag set exactly `names`: every existing association is
/// dropped and the requested set written back.
pub async fn replace_tags(
    conn: &mut SqliteConnection,
    note_id: i64,
    names: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
        .bind(note_id)
        .execute(&mut *conn)
        .await?;

    attach_tags(conn, note_id, names).await
}

/// Tag names per note id, each list sorted by name. Notes without tags are
/// absent from the map.
pub async fn names_for_notes(
    conn: &mut SqliteConnection,
    note_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>, sqlx::Error> {
    if note_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT nt.note_id, t.name FROM note_tags nt JOIN tags t ON t.id = nt.tag_id WHERE nt.note_id IN (",
    );
    let mut separated = query.separated(", ");
    for id in note_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY t.name");

    let rows: Vec<(i64, String)> = query.build_query_as().fetch_all(&mut *conn).await?;

    let mut names: HashMap<i64, Vec<String>> = HashMap::new();
    for (note_id, name) in rows {
        names.entry(note_id).or_default().push(name);
    }
    Ok(names)
}

pub async fn list_usage(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<TagUsage>, sqlx::Error> {
    sqlx::query_as::<_, TagUsage>(
        r#"
        SELECT t.id, t.name, COUNT(n.id) AS notes_count
        FROM tags t
        LEFT JOIN note_tags nt ON nt.tag_id = t.id
        LEFT JOIN notes n ON n.id = nt.note_id AND n.user_id = ? AND n.is_deleted = 0
        GROUP BY t.id, t.name
        ORDER BY t.name
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        assert_eq!(
            dedupe_names(&names(&["x", "y", "x", "z", "y"])),
            names(&["x", "y", "z"])
        );
    }

    #[test]
    fn dedupe_is_case_and_whitespace_sensitive() {
        assert_eq!(
            dedupe_names(&names(&["Work", "work", "work ", "work"])),
            names(&["Work", "work", "work "])
        );
    }

    #[test]
    fn dedupe_of_empty_list_is_empty() {
        assert!(dedupe_names(&[]).is_empty());
    }

    #[tokio::test]
    async fn insert_of_stored_name_returns_existing_row() {
        let pool = crate::db::connect("sqlite::memory:", 1).await.unwrap();
        crate::db::migrate(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let seeded = insert_tag(&mut conn, "work").await.unwrap();
        let again = insert_tag(&mut conn, "work").await.unwrap();
        assert_eq!(again, seeded);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
