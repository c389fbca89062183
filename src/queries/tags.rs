use rusqlite::{params, Connection};

use crate::db::models::Tag;

/// A tag plus the number of posts carrying it, recomputed per query.
#[derive(Debug, Clone)]
pub struct TagEntry {
    pub tag: Tag,
    pub posts_with_tag: i64,
}

/// Tags ranked by how many posts carry them, busiest first.
/// Unused tags still show up with a zero count.
pub fn popular(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<TagEntry>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.title, COUNT(pt.post_id) AS posts_with_tag
         FROM tags t
         LEFT JOIN post_tags pt ON pt.tag_id = t.id
         GROUP BY t.id
         ORDER BY posts_with_tag DESC, t.title ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(TagEntry {
            tag: Tag {
                id: row.get(0)?,
                title: row.get(1)?,
            },
            posts_with_tag: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Looks a tag up by title. Titles are stored lowercased, so the lookup
/// normalizes its input the same way.
pub fn by_title(conn: &Connection, title: &str) -> rusqlite::Result<Option<Tag>> {
    let result = conn.query_row(
        "SELECT id, title FROM tags WHERE title = ?1",
        params![title.to_lowercase()],
        |row| {
            Ok(Tag {
                id: row.get(0)?,
                title: row.get(1)?,
            })
        },
    );
    match result {
        Ok(tag) => Ok(Some(tag)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Creates a tag, lowercasing the title before it hits storage.
/// Uniqueness is enforced by the schema.
pub fn create(conn: &Connection, title: &str) -> rusqlite::Result<Tag> {
    let id = uuid::Uuid::now_v7().to_string();
    let title = title.to_lowercase();
    conn.execute(
        "INSERT INTO tags (id, title) VALUES (?1, ?2)",
        params![id, title],
    )?;
    Ok(Tag { id, title })
}

/// Links a tag to a post. Re-attaching is a no-op.
pub fn attach(conn: &Connection, post_id: &str, tag_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
        params![post_id, tag_id],
    )?;
    Ok(())
}
