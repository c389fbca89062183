use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection};

use crate::db::models::{Post, Tag};
use crate::queries::placeholders;
use crate::queries::tags::TagEntry;

const POST_COLUMNS: &str =
    "p.id, p.title, p.text, p.slug, p.image_url, p.published_at, p.author_id";

/// A post plus its request-scoped annotations. Counts start at zero and
/// author/tags stay empty until the matching `fetch_*` call attaches them;
/// nothing here is ever written back to storage.
#[derive(Debug, Clone)]
pub struct PostEntry {
    pub post: Post,
    pub likes_count: i64,
    pub comments_count: i64,
    pub author: Option<String>,
    pub tags: Vec<TagEntry>,
}

impl PostEntry {
    fn new(post: Post, likes_count: i64) -> Self {
        Self {
            post,
            likes_count,
            comments_count: 0,
            author: None,
            tags: Vec::new(),
        }
    }
}

fn post_from_row(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        slug: row.get(3)?,
        image_url: row.get(4)?,
        published_at: row.get(5)?,
        author_id: row.get(6)?,
    })
}

/// Posts ranked by like count, most liked first. Ties fall back to the
/// freshest post so the ordering is stable across runs.
pub fn popular(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<PostEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS}, COUNT(pl.user_id) AS likes_count
         FROM posts p
         LEFT JOIN post_likes pl ON pl.post_id = p.id
         GROUP BY p.id
         ORDER BY likes_count DESC, p.published_at DESC
         LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(PostEntry::new(post_from_row(row)?, row.get(7)?))
    })?;
    rows.collect()
}

/// Posts ordered newest first, like counts attached.
pub fn fresh(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<PostEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS},
                (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count
         FROM posts p
         ORDER BY p.published_at DESC
         LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(PostEntry::new(post_from_row(row)?, row.get(7)?))
    })?;
    rows.collect()
}

/// Attaches `comments_count` to an already-materialized collection with a
/// single aggregate query keyed by the id set. Safe to call after slicing,
/// leaves every other annotation untouched, and defaults posts without
/// comments to zero.
pub fn fetch_with_comments_count(
    conn: &Connection,
    posts: &mut [PostEntry],
) -> rusqlite::Result<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let ids: Vec<&str> = posts.iter().map(|e| e.post.id.as_str()).collect();
    let sql = format!(
        "SELECT post_id, COUNT(*) FROM comments
         WHERE post_id IN ({})
         GROUP BY post_id",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let counts: HashMap<String, i64> = stmt
        .query_map(params_from_iter(ids.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<rusqlite::Result<_>>()?;

    for entry in posts.iter_mut() {
        entry.comments_count = counts.get(&entry.post.id).copied().unwrap_or(0);
    }
    Ok(())
}

/// Attaches authors and tags (each tag carrying its own usage count) to a
/// collection in two queries total, however many posts are in it.
pub fn fetch_with_related_data(
    conn: &Connection,
    posts: &mut [PostEntry],
) -> rusqlite::Result<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let mut author_ids: Vec<&str> = posts.iter().map(|e| e.post.author_id.as_str()).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let sql = format!(
        "SELECT id, username FROM users WHERE id IN ({})",
        placeholders(author_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let authors: HashMap<String, String> = stmt
        .query_map(params_from_iter(author_ids.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<rusqlite::Result<_>>()?;

    let post_ids: Vec<&str> = posts.iter().map(|e| e.post.id.as_str()).collect();
    let sql = format!(
        "SELECT pt.post_id, t.id, t.title,
                (SELECT COUNT(*) FROM post_tags pt2 WHERE pt2.tag_id = t.id) AS posts_with_tag
         FROM post_tags pt
         JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id IN ({})
         ORDER BY t.title",
        placeholders(post_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(post_ids.iter()), |row| {
        Ok((
            row.get::<_, String>(0)?,
            TagEntry {
                tag: Tag {
                    id: row.get(1)?,
                    title: row.get(2)?,
                },
                posts_with_tag: row.get(3)?,
            },
        ))
    })?;
    let mut tags_by_post: HashMap<String, Vec<TagEntry>> = HashMap::new();
    for row in rows {
        let (post_id, entry) = row?;
        tags_by_post.entry(post_id).or_default().push(entry);
    }

    for entry in posts.iter_mut() {
        entry.author = authors.get(&entry.post.author_id).cloned();
        entry.tags = tags_by_post.remove(&entry.post.id).unwrap_or_default();
    }
    Ok(())
}

/// Resolves one post by slug with every annotation attached: like count,
/// comment count, author and annotated tags. `Ok(None)` for unknown slugs.
pub fn by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<PostEntry>> {
    let result = conn.query_row(
        &format!(
            "SELECT {POST_COLUMNS},
                    (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
             FROM posts p
             WHERE p.slug = ?1"
        ),
        params![slug],
        |row| {
            let mut entry = PostEntry::new(post_from_row(row)?, row.get(7)?);
            entry.comments_count = row.get(8)?;
            Ok(entry)
        },
    );
    match result {
        Ok(mut entry) => {
            fetch_with_related_data(conn, std::slice::from_mut(&mut entry))?;
            Ok(Some(entry))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Posts carrying a tag, newest first, like counts attached.
pub fn for_tag(conn: &Connection, tag_id: &str, limit: i64) -> rusqlite::Result<Vec<PostEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS},
                (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count
         FROM posts p
         JOIN post_tags pt ON pt.post_id = p.id
         WHERE pt.tag_id = ?1
         ORDER BY p.published_at DESC
         LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![tag_id, limit], |row| {
        Ok(PostEntry::new(post_from_row(row)?, row.get(7)?))
    })?;
    rows.collect()
}

pub struct NewPost<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub slug: &'a str,
    pub image_url: Option<&'a str>,
    pub published_at: &'a str,
    pub author_id: &'a str,
}

pub fn create(conn: &Connection, new: &NewPost) -> rusqlite::Result<Post> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO posts (id, title, text, slug, image_url, published_at, author_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            new.title,
            new.text,
            new.slug,
            new.image_url,
            new.published_at,
            new.author_id
        ],
    )?;
    Ok(Post {
        id,
        title: new.title.to_string(),
        text: new.text.to_string(),
        slug: new.slug.to_string(),
        image_url: new.image_url.map(str::to_string),
        published_at: new.published_at.to_string(),
        author_id: new.author_id.to_string(),
    })
}

/// Records a like. A user can like a post at most once.
pub fn like(conn: &Connection, post_id: &str, user_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
        params![post_id, user_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::queries::testutil::insert_user;
    use crate::queries::{comments, tags};

    /// Three posts by alice: "alpha" (2 likes, 3 comments), "beta"
    /// (1 like, none), "gamma" (none, 1 comment). "alpha" and "beta"
    /// share the rust tag, "alpha" alone carries the web tag.
    fn seed(conn: &Connection) {
        insert_user(conn, "u1", "alice");
        insert_user(conn, "u2", "bob");
        insert_user(conn, "u3", "carol");

        let specs = [
            ("alpha", "2024-01-03 10:00:00"),
            ("beta", "2024-01-02 10:00:00"),
            ("gamma", "2024-01-01 10:00:00"),
        ];
        for (slug, published_at) in specs {
            create(
                conn,
                &NewPost {
                    title: slug,
                    text: "Body text",
                    slug,
                    image_url: None,
                    published_at,
                    author_id: "u1",
                },
            )
            .unwrap();
        }

        let id_of = |slug: &str| -> String {
            conn.query_row(
                "SELECT id FROM posts WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )
            .unwrap()
        };
        let alpha = id_of("alpha");
        let beta = id_of("beta");

        like(conn, &alpha, "u2").unwrap();
        like(conn, &alpha, "u3").unwrap();
        like(conn, &beta, "u2").unwrap();

        let alpha_comments = [
            ("u2", "first", "2024-01-03 11:00:00"),
            ("u3", "second", "2024-01-03 12:00:00"),
            ("u2", "third", "2024-01-03 13:00:00"),
        ];
        for (author, text, published_at) in alpha_comments {
            comments::create(conn, &alpha, author, text, published_at).unwrap();
        }
        comments::create(conn, &id_of("gamma"), "u2", "hello", "2024-01-02 09:00:00").unwrap();

        let rust = tags::create(conn, "rust").unwrap();
        let web = tags::create(conn, "web").unwrap();
        tags::attach(conn, &alpha, &rust.id).unwrap();
        tags::attach(conn, &beta, &rust.id).unwrap();
        tags::attach(conn, &alpha, &web.id).unwrap();
    }

    #[test]
    fn popular_orders_by_like_count_desc() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let posts = popular(&conn, 10).unwrap();
        let slugs: Vec<&str> = posts.iter().map(|e| e.post.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta", "gamma"]);

        let likes: Vec<i64> = posts.iter().map(|e| e.likes_count).collect();
        assert_eq!(likes, vec![2, 1, 0]);
        assert!(likes.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn popular_respects_limit() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        assert_eq!(popular(&conn, 2).unwrap().len(), 2);
    }

    #[test]
    fn fresh_orders_by_published_at_desc() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let posts = fresh(&conn, 10).unwrap();
        let slugs: Vec<&str> = posts.iter().map(|e| e.post.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta", "gamma"]);
        assert_eq!(posts[0].likes_count, 2);
    }

    #[test]
    fn comments_count_matches_true_count_including_zero() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let mut posts = fresh(&conn, 10).unwrap();
        fetch_with_comments_count(&conn, &mut posts).unwrap();

        let by_slug: HashMap<&str, i64> = posts
            .iter()
            .map(|e| (e.post.slug.as_str(), e.comments_count))
            .collect();
        assert_eq!(by_slug["alpha"], 3);
        assert_eq!(by_slug["beta"], 0);
        assert_eq!(by_slug["gamma"], 1);
    }

    #[test]
    fn comments_count_after_slicing_stays_accurate_and_keeps_likes() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        // Materialize, then slice to the top entry before counting
        let mut posts = popular(&conn, 10).unwrap();
        posts.truncate(1);
        fetch_with_comments_count(&conn, &mut posts).unwrap();

        assert_eq!(posts[0].post.slug, "alpha");
        assert_eq!(posts[0].comments_count, 3);
        // Prior annotation survives the second fetch
        assert_eq!(posts[0].likes_count, 2);
    }

    #[test]
    fn related_data_attaches_author_and_annotated_tags() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let mut posts = fresh(&conn, 10).unwrap();
        fetch_with_related_data(&conn, &mut posts).unwrap();

        let alpha = posts.iter().find(|e| e.post.slug == "alpha").unwrap();
        assert_eq!(alpha.author.as_deref(), Some("alice"));
        let tag_counts: Vec<(&str, i64)> = alpha
            .tags
            .iter()
            .map(|t| (t.tag.title.as_str(), t.posts_with_tag))
            .collect();
        assert_eq!(tag_counts, vec![("rust", 2), ("web", 1)]);

        let gamma = posts.iter().find(|e| e.post.slug == "gamma").unwrap();
        assert!(gamma.tags.is_empty());
        assert_eq!(gamma.author.as_deref(), Some("alice"));
    }

    #[test]
    fn by_slug_returns_fully_annotated_post() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let entry = by_slug(&conn, "alpha").unwrap().unwrap();
        assert_eq!(entry.comments_count, 3);
        assert_eq!(entry.likes_count, 2);
        assert_eq!(entry.author.as_deref(), Some("alice"));
        assert_eq!(entry.tags.len(), 2);
    }

    #[test]
    fn by_slug_returns_none_for_unknown_slug() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        assert!(by_slug(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn for_tag_lists_tagged_posts_newest_first() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let rust = tags::by_title(&conn, "rust").unwrap().unwrap();
        let posts = for_tag(&conn, &rust.id, 20).unwrap();
        let slugs: Vec<&str> = posts.iter().map(|e| e.post.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta"]);

        assert_eq!(for_tag(&conn, &rust.id, 1).unwrap().len(), 1);
    }

    #[test]
    fn like_is_idempotent_per_user() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        let beta: String = conn
            .query_row("SELECT id FROM posts WHERE slug = 'beta'", [], |row| {
                row.get(0)
            })
            .unwrap();
        like(&conn, &beta, "u2").unwrap();
        like(&conn, &beta, "u2").unwrap();

        let posts = popular(&conn, 10).unwrap();
        let beta_entry = posts.iter().find(|e| e.post.slug == "beta").unwrap();
        assert_eq!(beta_entry.likes_count, 1);
    }

    #[test]
    fn count_fetches_on_empty_collections_are_no_ops() {
        let pool = test_pool();
        let conn = pool.get().unwrap();

        let mut posts: Vec<PostEntry> = Vec::new();
        fetch_with_comments_count(&conn, &mut posts).unwrap();
        fetch_with_related_data(&conn, &mut posts).unwrap();
        assert!(posts.is_empty());
    }
}
