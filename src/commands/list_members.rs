use std::task::{Context, Poll};

use chrono::Utc;
use serde::Serialize;
use tower::Service;

use crate::{
    domain::{renewal::RenewalInfo, Member, MemberFilter, MemberStats},
    ports::{database::DatabasePort, storage::StoragePort},
};

use super::{CommandFuture, DomainLogic, Error};

#[derive(Default)]
pub struct ListMembersRequest {
    pub filter: MemberFilter,
}

/// A member along with its renewal countdown
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    #[serde(flatten)]
    pub member: Member,
    pub renewal: RenewalInfo,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListMembersResponse {
    /// Members matching the filter, newest first
    pub members: Vec<MemberSummary>,
    /// Counters over every member, regardless of the filter
    pub stats: MemberStats,
}

impl<D, S> Service<ListMembersRequest> for DomainLogic<D, S>
where
    D: DatabasePort + Send + Sync + ?Sized + 'static,
    S: StoragePort + Send + Sync + ?Sized + 'static,
{
    type Response = ListMembersResponse;
    type Error = Error;
    type Future = CommandFuture<ListMembersResponse>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListMembersRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let all = database.list_members().await?;
            let stats = MemberStats::from_members(&all);

            let now = Utc::now();
            let members = all
                .into_iter()
                .filter(|member| req.filter.matches(member))
                .map(|member| MemberSummary {
                    renewal: member.renewal_info(now),
                    member,
                })
                .collect();

            Ok(ListMembersResponse { members, stats })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Member, MemberDraft, Status},
        ports::{database::MockDatabasePort, storage::MockStoragePort},
    };
    use chrono::Duration;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    fn member(name: &str, phone: &str, status: Status, next_payment_in: Duration) -> Member {
        Member::from_draft(
            MemberDraft {
                name: name.to_string(),
                phone: phone.to_string(),
                email: None,
                plan: "1 tháng - Flex".to_string(),
                next_payment: Utc::now() + next_payment_in,
                status,
                checkins_this_month: Some(3),
                avatar_url: None,
                notes: None,
            },
            Utc::now(),
        )
    }

    #[fixture]
    fn domain() -> DomainLogic<MockDatabasePort, MockStoragePort> {
        let members = vec![
            member("Lan", "0901", Status::Active, Duration::days(10)),
            member("Minh", "0902", Status::Overdue, -Duration::days(3)),
            member("Hoa", "0903", Status::Inactive, Duration::days(40)),
        ];
        let mut database = MockDatabasePort::new();
        database
            .expect_list_members()
            .times(1)
            .returning(move || Ok(members.clone()));
        DomainLogic::new(Arc::new(database), Arc::new(MockStoragePort::new()))
    }

    #[rstest]
    #[tokio::test]
    async fn test_call_unfiltered(
        domain: DomainLogic<MockDatabasePort, MockStoragePort>,
    ) -> Result<(), BoxError> {
        let res = domain.oneshot(ListMembersRequest::default()).await?;

        assert_that!(res.members).has_length(3);
        assert_that!(res.stats).is_equal_to(MemberStats {
            total: 3,
            active: 1,
            inactive: 1,
            overdue: 1,
            checkins_this_month: 9,
        });

        // Renewal countdowns are attached to every member
        let overdue: Vec<bool> = res.members.iter().map(|m| m.renewal.overdue).collect();
        assert_that!(overdue).is_equal_to(vec![false, true, false]);
        assert_that!(res.members[1].renewal.label.as_str()).is_equal_to("-3 ngày");

        Ok(())
    }

    #[rstest]
    #[case(MemberFilter { query: Some("MINH".to_string()), status: None }, vec!["Minh"])]
    #[case(MemberFilter { query: Some("090".to_string()), status: Some(Status::Inactive) }, vec!["Hoa"])]
    #[case(MemberFilter { query: None, status: Some(Status::Active) }, vec!["Lan"])]
    #[case(MemberFilter { query: Some("nobody".to_string()), status: None }, vec![])]
    #[tokio::test]
    async fn test_call_filtered(
        domain: DomainLogic<MockDatabasePort, MockStoragePort>,
        #[case] filter: MemberFilter,
        #[case] expected: Vec<&str>,
    ) -> Result<(), BoxError> {
        let res = domain.oneshot(ListMembersRequest { filter }).await?;

        let names: Vec<&str> = res
            .members
            .iter()
            .map(|summary| summary.member.name.as_str())
            .collect();
        assert_that!(names).is_equal_to(expected);
        // Stats still cover everyone
        assert_that!(res.stats.total).is_equal_to(3);

        Ok(())
    }

    #[rstest]
    fn test_summary_json() {
        let member = member("Lan", "0901", Status::Active, Duration::days(1));
        let summary = MemberSummary {
            renewal: member.renewal_info(member.next_payment),
            member,
        };

        let json = serde_json::to_value(&summary).unwrap();

        assert_that!(json["name"].as_str()).is_equal_to(Some("Lan"));
        assert_that!(json["checkinsThisMonth"].as_u64()).is_equal_to(Some(3));
        assert_that!(json["status"].as_str()).is_equal_to(Some("active"));
        assert_that!(json["renewal"]["label"].as_str()).is_equal_to(Some("0 ngày"));
    }
}
