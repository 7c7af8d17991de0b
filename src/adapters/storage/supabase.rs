use crate::ports::storage::{Error, StoragePort};
use reqwest::{header, Client};

/// Supabase Storage bucket reached over its REST API
///
/// Uploads authenticate with the service role key, so the bucket can stay write-protected for
/// anonymous clients while still serving public URLs.
#[derive(Clone, Debug)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        service_role_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_role_key: service_role_key.into(),
            bucket: bucket.into(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket)
    }

    /// URL under which a public bucket serves `path`
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base_url, self.bucket
        )
    }
}

#[async_trait::async_trait]
impl StoragePort for SupabaseStorage {
    async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%status, path, "storage upload rejected");
            return Err(Error::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(path))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Adapter(Box::new(err))
    }
}
