pub mod assets;
pub mod cards;
pub mod contacts;
pub mod home;
pub mod posts;
pub mod tags;

use axum::routing::get;
use axum::Router;
use rusqlite::Connection;

use crate::queries;
use crate::state::AppState;

use self::cards::{PostCard, TagBadge};

/// Every listing on the site shows at most this many entries per block.
pub(crate) const SIDEBAR_LIMIT: i64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/posts/{slug}", get(posts::detail))
        .route("/tags/{title}", get(tags::filter))
        .route("/contacts", get(contacts::page))
        .route("/assets/{*path}", get(assets::serve))
}

/// The most-popular-posts and popular-tags blocks shared by every page.
/// Popular posts get related data and comment counts batch-attached
/// after the top-5 slice, so the whole sidebar costs four queries.
pub(crate) fn popular_sidebars(
    conn: &Connection,
) -> rusqlite::Result<(Vec<PostCard>, Vec<TagBadge>)> {
    let mut popular_posts = queries::posts::popular(conn, SIDEBAR_LIMIT)?;
    queries::posts::fetch_with_related_data(conn, &mut popular_posts)?;
    queries::posts::fetch_with_comments_count(conn, &mut popular_posts)?;

    let popular_tags = queries::tags::popular(conn, SIDEBAR_LIMIT)?;

    Ok((
        popular_posts.iter().map(cards::post_card).collect(),
        popular_tags.iter().map(cards::tag_badge).collect(),
    ))
}
