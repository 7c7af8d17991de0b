use std::task::{Context, Poll};

use chrono::Utc;
use serde::Serialize;
use tower::Service;
use uuid::Uuid;

use crate::ports::{database::DatabasePort, storage::StoragePort};

use super::{CommandFuture, DomainLogic, Error};

/// Largest accepted photo (5 MiB)
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

const AVATAR_PREFIX: &str = "members";
const DEFAULT_EXTENSION: &str = "jpg";

pub struct UploadAvatarRequest {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct UploadAvatarResponse {
    /// Public URL to store in the member's `avatarUrl`
    pub url: String,
}

impl<D, S> Service<UploadAvatarRequest> for DomainLogic<D, S>
where
    D: DatabasePort + Send + Sync + ?Sized + 'static,
    S: StoragePort + Send + Sync + ?Sized + 'static,
{
    type Response = UploadAvatarResponse;
    type Error = Error;
    type Future = CommandFuture<UploadAvatarResponse>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UploadAvatarRequest) -> Self::Future {
        let storage = self.storage.clone();
        Box::pin(async move {
            let content_type = req
                .content_type
                .filter(|content_type| content_type.starts_with("image/"))
                .ok_or_else(|| Error::Validation("file must be an image".into()))?;
            if req.bytes.is_empty() {
                return Err(Error::Validation("no file provided".into()));
            }
            if req.bytes.len() > MAX_AVATAR_BYTES {
                return Err(Error::Validation("file size must be less than 5MB".into()));
            }

            let path = object_path(req.file_name.as_deref());
            let size = req.bytes.len();
            let url = storage
                .upload_object(&path, req.bytes, &content_type)
                .await?;

            tracing::info!(%path, size, "avatar uploaded");
            Ok(UploadAvatarResponse { url })
        })
    }
}

/// Unique object path: `members/<unix millis>-<6 random chars>.<extension>`
fn object_path(file_name: Option<&str>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{AVATAR_PREFIX}/{}-{}.{}",
        Utc::now().timestamp_millis(),
        &suffix[..6],
        extension(file_name)
    )
}

/// Lower-cased extension of `file_name`, falling back to `jpg`
fn extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
