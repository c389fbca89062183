use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::queries;
use crate::routes::cards::{self, PostCard, PostView, TagBadge};
use crate::routes::home::Html;
use crate::routes::popular_sidebars;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/post_detail.html")]
pub struct PostDetailTemplate {
    pub post: PostView,
    pub most_popular_posts: Vec<PostCard>,
    pub popular_tags: Vec<TagBadge>,
}

/// One post by slug with its full comment thread. Unknown slugs are a 404.
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    let entry = queries::posts::by_slug(&conn, &slug)?.ok_or(AppError::NotFound)?;
    let comments = queries::comments::for_post(&conn, &entry.post.id)?;

    let (most_popular_posts, popular_tags) = popular_sidebars(&conn)?;

    Ok(Html(PostDetailTemplate {
        post: cards::post_view(&entry, &comments),
        most_popular_posts,
        popular_tags,
    })
    .into_response())
}
