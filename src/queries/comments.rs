use rusqlite::{params, Connection};

use crate::db::models::Comment;

/// A comment joined with its author's username.
#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: String,
}

/// All comments under a post with their authors, oldest first, in one
/// JOIN query.
pub fn for_post(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<CommentEntry>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.post_id, c.author_id, c.text, c.published_at, u.username
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.published_at ASC",
    )?;
    let rows = stmt.query_map(params![post_id], |row| {
        Ok(CommentEntry {
            comment: Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                author_id: row.get(2)?,
                text: row.get(3)?,
                published_at: row.get(4)?,
            },
            author: row.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn create(
    conn: &Connection,
    post_id: &str,
    author_id: &str,
    text: &str,
    published_at: &str,
) -> rusqlite::Result<Comment> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO comments (id, post_id, author_id, text, published_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, post_id, author_id, text, published_at],
    )?;
    Ok(Comment {
        id,
        post_id: post_id.to_string(),
        author_id: author_id.to_string(),
        text: text.to_string(),
        published_at: published_at.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::queries::posts::{self, NewPost};
    use crate::queries::testutil::insert_user;

    #[test]
    fn for_post_lists_comments_oldest_first_with_authors() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        insert_user(&conn, "u1", "alice");
        insert_user(&conn, "u2", "bob");

        let post = posts::create(
            &conn,
            &NewPost {
                title: "Post",
                text: "Body",
                slug: "post",
                image_url: None,
                published_at: "2024-01-01 00:00:00",
                author_id: "u1",
            },
        )
        .unwrap();

        create(&conn, &post.id, "u2", "second", "2024-01-02 12:00:00").unwrap();
        create(&conn, &post.id, "u1", "first", "2024-01-01 08:00:00").unwrap();

        let comments = for_post(&conn, &post.id).unwrap();
        let texts: Vec<&str> = comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(comments[0].author, "alice");
        assert_eq!(comments[1].author, "bob");
    }

    #[test]
    fn for_post_returns_empty_for_uncommented_post() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        insert_user(&conn, "u1", "alice");

        let post = posts::create(
            &conn,
            &NewPost {
                title: "Post",
                text: "Body",
                slug: "post",
                image_url: None,
                published_at: "2024-01-01 00:00:00",
                author_id: "u1",
            },
        )
        .unwrap();

        assert!(for_post(&conn, &post.id).unwrap().is_empty());
    }
}
