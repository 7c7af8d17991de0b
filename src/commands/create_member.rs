use std::task::{Context, Poll};

use chrono::Utc;
use tower::Service;

use crate::{
    domain::Member,
    ports::{database::DatabasePort, storage::StoragePort},
};

use super::{CommandFuture, DomainLogic, Error, MemberInput};

pub struct CreateMemberRequest {
    pub input: MemberInput,
}

impl<D, S> Service<CreateMemberRequest> for DomainLogic<D, S>
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

    fn call(&mut self, req: CreateMemberRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let draft = req.input.into_draft(Utc::now())?;
            let member = database.create_member(draft).await?;

            tracing::info!(
                member_id = %member.id,
                plan = %member.plan,
                next_payment = %member.next_payment,
                "member created"
            );
            Ok(member)
        })
    }
}
