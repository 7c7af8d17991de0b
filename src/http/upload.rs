use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use tower::Service;

use crate::commands::upload_avatar::{UploadAvatarRequest, UploadAvatarResponse};

use super::{error::ApiError, AppState};

/// Multipart field carrying the photo
const FILE_FIELD: &str = "file";

/// `POST /api/upload`: store a member photo and return its public URL
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadAvatarResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();

        let res = state
            .logic
            .clone()
            .call(UploadAvatarRequest {
                file_name,
                content_type,
                bytes,
            })
            .await?;
        return Ok(Json(res));
    }

    Err(ApiError::bad_request("no file provided"))
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), err.body_text())
}
