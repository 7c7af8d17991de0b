use uuid::Uuid;

use crate::domain::{Member, MemberDraft};

/// Persistence boundary for member records
///
/// Implementations perform no date logic: the next payment date is computed before a draft
/// reaches the database.
#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort {
    /// All members, newest first
    async fn list_members(&self) -> Result<Vec<Member>, Error>;
    async fn create_member(&self, draft: MemberDraft) -> Result<Member, Error>;
    async fn update_member(&self, member_id: Uuid, draft: MemberDraft) -> Result<Member, Error>;
    async fn delete_member(&self, member_id: Uuid) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another member already uses one of the unique contact fields
    #[error("member already exists ({})", fields.join(", "))]
    Conflict { fields: Vec<String> },

    /// Domain-level error when a member does not exist
    #[error("member {0} does not exist")]
    MemberDoesNotExist(Uuid),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
