use crate::{
    domain::{Member, MemberDraft},
    ports::database::{DatabasePort, Error},
};
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// In-process member store
///
/// Members are kept in insertion order, which doubles as the tie-breaker when two members share
/// the same creation time.
#[derive(Clone, Debug)]
pub struct MemoryDatabase {
    members: Arc<Mutex<Vec<Member>>>,
}

impl MemoryDatabase {
    /// Unique fields of `draft` already used by a member other than `member_id`
    fn conflicts(members: &[Member], draft: &MemberDraft, member_id: Option<Uuid>) -> Vec<String> {
        let others = || {
            members
                .iter()
                .filter(move |member| Some(member.id) != member_id)
        };

        let mut fields = Vec::new();
        if others().any(|member| member.phone == draft.phone) {
            fields.push("phone".to_string());
        }
        if draft.email.is_some() && others().any(|member| member.email == draft.email) {
            fields.push("email".to_string());
        }
        fields
    }
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn list_members(&self) -> Result<Vec<Member>, Error> {
        let mut members: Vec<Member> = self.members.lock()?.iter().rev().cloned().collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(members)
    }

    async fn create_member(&self, draft: MemberDraft) -> Result<Member, Error> {
        let mut members = self.members.lock()?;

        let fields = Self::conflicts(&members, &draft, None);
        if !fields.is_empty() {
            return Err(Error::Conflict { fields });
        }

        let member = Member::from_draft(draft, Utc::now());
        members.push(member.clone());

        Ok(member)
    }

    async fn update_member(&self, member_id: Uuid, draft: MemberDraft) -> Result<Member, Error> {
        let mut members = self.members.lock()?;

        let index = members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or(Error::MemberDoesNotExist(member_id))?;

        let fields = Self::conflicts(&members, &draft, Some(member_id));
        if !fields.is_empty() {
            return Err(Error::Conflict { fields });
        }

        let member = &mut members[index];
        member.apply(draft);

        Ok(member.clone())
    }

    async fn delete_member(&self, member_id: Uuid) -> Result<(), Error> {
        let mut members = self.members.lock()?;

        let index = members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or(Error::MemberDoesNotExist(member_id))?;
        members.remove(index);

        Ok(())
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self {
            members: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
