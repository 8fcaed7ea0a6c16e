//! JSON and download API.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use super::read_uploads;
use crate::output::BatchReport;
use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;

/// File name of the combined export.
pub const EXPORT_FILE_NAME: &str = "converted.zip";

/// Convert the uploaded files and report every outcome as JSON.
/// POST /api/convert
pub async fn convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<BatchReport>> {
    let uploads = read_uploads(multipart).await?;
    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }
    Ok(Json(state.converter.convert_batch(uploads).await))
}

/// Convert the uploaded files and return every success in one zip archive.
/// POST /api/export
pub async fn export(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let uploads = read_uploads(multipart).await?;
    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }
    let report = state.converter.convert_batch(uploads).await;
    let zip = report.export_zip()?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        zip,
    )
        .into_response())
}
