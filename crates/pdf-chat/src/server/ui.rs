//! Single-page chat UI

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET / - upload sidebar and chat transcript
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
