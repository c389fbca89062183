use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::queries;
use crate::routes::cards::{self, PostCard, TagBadge};
use crate::routes::home::Html;
use crate::routes::popular_sidebars;
use crate::state::AppState;

/// The tag page lists more than the top-5 windows, but still bounded.
const TAG_PAGE_LIMIT: i64 = 20;

#[derive(Template)]
#[template(path = "pages/tag_filter.html")]
pub struct TagFilterTemplate {
    pub tag: String,
    pub posts: Vec<PostCard>,
    pub most_popular_posts: Vec<PostCard>,
    pub popular_tags: Vec<TagBadge>,
}

/// Posts carrying one tag, resolved by (normalized) title. Unknown titles
/// are a 404.
pub async fn filter(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    let tag = queries::tags::by_title(&conn, &title)?.ok_or(AppError::NotFound)?;

    let mut related = queries::posts::for_tag(&conn, &tag.id, TAG_PAGE_LIMIT)?;
    queries::posts::fetch_with_related_data(&conn, &mut related)?;
    queries::posts::fetch_with_comments_count(&conn, &mut related)?;

    let (most_popular_posts, popular_tags) = popular_sidebars(&conn)?;

    Ok(Html(TagFilterTemplate {
        tag: tag.title,
        posts: related.iter().map(cards::post_card).collect(),
        most_popular_posts,
        popular_tags,
    })
    .into_response())
}
