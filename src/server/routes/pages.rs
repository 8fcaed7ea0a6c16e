//! Browser pages: upload form and rendered results.

use axum::{
    extract::{Multipart, State},
    response::Html,
};

use super::read_uploads;
use crate::server::error::ApiResult;
use crate::server::page;
use crate::server::state::AppState;

/// Upload page.
/// GET /
pub async fn index() -> Html<String> {
    Html(page::render_upload_page())
}

/// Convert the uploaded files and render one preview section per file.
/// POST /convert
pub async fn convert_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Html<String>> {
    let uploads = read_uploads(multipart).await?;
    let report = state.converter.convert_batch(uploads).await;
    Ok(Html(page::render_results_page(&report)))
}
