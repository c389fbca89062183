//! Demo dataset used by the env-gated `/test/seed` endpoint. Entities
//! normally enter the system through the external admin tooling; this is
//! the direct-storage path for local runs and end-to-end tests.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection};

use crate::queries::posts::NewPost;
use crate::queries::{comments, posts, tags};
use crate::state::DbPool;

#[derive(Debug)]
pub struct SeedSummary {
    pub users: i64,
    pub posts: i64,
    pub tags: i64,
    pub comments: i64,
}

/// Populates a small demo blog: one staff author, a few readers, six
/// posts across four tags, with enough likes and comments to make the
/// popular ordering differ from the fresh one. Re-running against a
/// non-empty database leaves it untouched and just reports what's there.
pub fn demo(pool: &DbPool) -> anyhow::Result<SeedSummary> {
    let conn = pool.get()?;

    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
    if existing > 0 {
        tracing::info!("Database already has content, skipping seed");
        return summary(&conn);
    }

    for (id, username, is_staff) in [
        ("seed-alice", "alice", 1),
        ("seed-bob", "bob", 0),
        ("seed-carol", "carol", 0),
        ("seed-dave", "dave", 0),
    ] {
        conn.execute(
            "INSERT OR IGNORE INTO users (id, username, is_staff) VALUES (?1, ?2, ?3)",
            params![id, username, is_staff],
        )?;
    }

    let rust = tags::create(&conn, "rust")?;
    let web = tags::create(&conn, "web")?;
    let sqlite = tags::create(&conn, "sqlite")?;
    let notes = tags::create(&conn, "notes")?;

    let now = Utc::now();
    let stamp = |days_ago: i64, hours_later: i64| {
        (now - Duration::days(days_ago) + Duration::hours(hours_later))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    };

    let body = "There is a particular pleasure in software that fits in one \
        binary: you copy it to a machine, point it at a directory, and it \
        simply runs. This site is built the same way, a single process in \
        front of a single database file, and this post is the obligatory \
        hello-world that proves the whole pipeline works end to end.";

    let specs: [(&str, &str, &[&str], &[&str], &[(&str, &str)]); 6] = [
        (
            "Hello, Gazeta",
            "hello-gazeta",
            &["notes"],
            &["seed-bob", "seed-carol", "seed-dave"],
            &[("seed-bob", "Looking forward to more."), ("seed-carol", "Subscribed!")],
        ),
        (
            "SQLite in anger",
            "sqlite-in-anger",
            &["sqlite", "rust"],
            &["seed-bob", "seed-carol"],
            &[
                ("seed-dave", "WAL mode saved us too."),
                ("seed-bob", "What about busy timeouts?"),
                ("seed-carol", "Great writeup."),
            ],
        ),
        (
            "Counting without N+1",
            "counting-without-n-plus-1",
            &["rust", "sqlite"],
            &["seed-dave"],
            &[("seed-bob", "The IN-clause trick is neat.")],
        ),
        (
            "Server-rendered and happy",
            "server-rendered-and-happy",
            &["web"],
            &["seed-carol"],
            &[],
        ),
        ("Spring notes", "spring-notes", &["notes"], &[], &[]),
        ("Reading list", "reading-list", &["notes", "web"], &[], &[]),
    ];

    for (i, (title, slug, tag_titles, likers, comment_specs)) in specs.iter().enumerate() {
        let post = posts::create(
            &conn,
            &NewPost {
                title,
                text: body,
                slug,
                image_url: None,
                published_at: &stamp(i as i64 + 1, 0),
                author_id: "seed-alice",
            },
        )?;

        for tag_title in *tag_titles {
            let tag = match *tag_title {
                "rust" => &rust,
                "web" => &web,
                "sqlite" => &sqlite,
                _ => &notes,
            };
            tags::attach(&conn, &post.id, &tag.id)?;
        }

        for liker in *likers {
            posts::like(&conn, &post.id, liker)?;
        }

        // Comments trail their post by a few hours
        for (j, (author, text)) in comment_specs.iter().enumerate() {
            comments::create(&conn, &post.id, author, text, &stamp(i as i64 + 1, j as i64 + 1))?;
        }
    }

    tracing::info!("Seeded demo content");
    summary(&conn)
}

fn summary(conn: &Connection) -> anyhow::Result<SeedSummary> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
    };
    Ok(SeedSummary {
        users: count("users")?,
        posts: count("posts")?,
        tags: count("tags")?,
        comments: count("comments")?,
    })
}
