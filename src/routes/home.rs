use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::queries;
use crate::routes::cards::{self, PostCard, TagBadge};
use crate::routes::{popular_sidebars, SIDEBAR_LIMIT};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub most_popular_posts: Vec<PostCard>,
    pub page_posts: Vec<PostCard>,
    pub popular_tags: Vec<TagBadge>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Home page: freshest posts in the feed, popular posts and tags beside it.
pub async fn index(State(state): State<AppState>) -> AppResult<Response> {
    let conn = state.db.get()?;

    let (most_popular_posts, popular_tags) = popular_sidebars(&conn)?;

    let mut fresh = queries::posts::fresh(&conn, SIDEBAR_LIMIT)?;
    queries::posts::fetch_with_related_data(&conn, &mut fresh)?;
    queries::posts::fetch_with_comments_count(&conn, &mut fresh)?;
    let page_posts = fresh.iter().map(cards::post_card).collect();

    Ok(Html(IndexTemplate {
        most_popular_posts,
        page_posts,
        popular_tags,
    })
    .into_response())
}
