use std::task::{Context, Poll};

use tower::Service;

use crate::ports::{database::DatabasePort, storage::StoragePort};

use super::{parse_member_id, CommandFuture, DomainLogic, Error};

pub struct DeleteMemberRequest {
    /// Raw identifier from the request path, `None` when the path carried none
    pub member_id: Option<String>,
}

impl<D, S> Service<DeleteMemberRequest> for DomainLogic<D, S>
where
    D: DatabasePort + Send + Sync + ?Sized + 'static,
    S: StoragePort + Send + Sync + ?Sized + 'static,
{
    type Response = ();
    type Error = Error;
    type Future = CommandFuture<()>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DeleteMemberRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let member_id = parse_member_id(req.member_id.as_deref())?;
            database.delete_member(member_id).await?;

            tracing::info!(%member_id, "member deleted");
            Ok(())
        })
    }
}
