use std::task::{Context, Poll};

use chrono::Utc;
use tower::Service;

use crate::{
    domain::Member,
    ports::{database::DatabasePort, storage::StoragePort},
};

use super::{parse_member_id, CommandFuture, DomainLogic, Error, MemberInput};

pub struct UpdateMemberRequest {
    /// Raw identifier from the request path
    pub member_id: String,
    pub input: MemberInput,
}

impl<D, S> Service<UpdateMemberRequest> for DomainLogic<D, S>
where
    D: DatabasePort + Send + Sync + ?Sized + 'static,
    S: StoragePort + Send + Sync + ?Sized + 'static,
{
    type Response = Member;
    type Error = Error;
    type Future = CommandFuture<Member>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UpdateMemberRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let member_id = parse_member_id(Some(req.member_id.as_str()))?;
            // The renewal date always follows the plan, even if the form sent its own
            let draft = req.input.into_draft(Utc::now())?;
            let member = database.update_member(member_id, draft).await?;

            tracing::info!(
                member_id = %member.id,
                plan = %member.plan,
                next_payment = %member.next_payment,
                "member updated"
            );
            Ok(member)
        })
    }
}
