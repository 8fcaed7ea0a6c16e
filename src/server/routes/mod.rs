//! Route definitions.

mod api;
mod health;
mod pages;

use axum::{
    extract::Multipart,
    routing::{get, post},
    Router,
};
use tracing::debug;

use crate::pipeline::input::Upload;
use crate::server::error::ApiResult;
use crate::server::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Browser pages
        .route("/", get(pages::index))
        .route("/convert", post(pages::convert_page))
        // JSON / download API
        .route("/api/convert", post(api::convert))
        .route("/api/export", post(api::export))
        // Attach state
        .with_state(state)
}

/// Collect every file part of a multipart body, in the order sent.
///
/// Parts without a filename (plain form fields, or an empty file input) are
/// skipped.
pub(crate) async fn read_uploads(mut multipart: Multipart) -> ApiResult<Vec<Upload>> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
        else {
            debug!(field = ?field.name(), "skipping multipart part without filename");
            continue;
        };
        let bytes = field.bytes().await?;
        uploads.push(Upload::new(name, bytes.to_vec()));
    }
    Ok(uploads)
}

pub use api::*;
pub use health::*;
pub use pages::*;
