/// Object storage for uploaded member photos
#[mockall::automock]
#[async_trait::async_trait]
pub trait StoragePort {
    /// Store `bytes` under `path` and return the public URL of the object
    async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bucket refused the object
    #[error("upload rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
