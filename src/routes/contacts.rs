use askama::Template;
use axum::response::IntoResponse;

use crate::routes::home::Html;

#[derive(Template)]
#[template(path = "pages/contacts.html")]
struct ContactsTemplate;

/// Static contact page, no data dependencies.
pub async fn page() -> impl IntoResponse {
    Html(ContactsTemplate)
}
