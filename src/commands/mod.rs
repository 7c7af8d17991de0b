use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{renewal, MemberDraft, Status};

pub mod create_member;
pub mod delete_member;
pub mod list_members;
pub mod update_member;
pub mod upload_avatar;

/// Use cases of the service, one [`tower::Service`] implementation per request type
///
/// Ports are owned through `Arc`s and may be trait objects.
pub struct DomainLogic<D: ?Sized, S: ?Sized> {
    database: Arc<D>,
    storage: Arc<S>,
}

impl<D: ?Sized, S: ?Sized> DomainLogic<D, S> {
    pub fn new(database: Arc<D>, storage: Arc<S>) -> Self {
        Self { database, storage }
    }
}

impl<D: ?Sized, S: ?Sized> Clone for DomainLogic<D, S> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            storage: self.storage.clone(),
        }
    }
}

pub type CommandFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database port error: {0}")]
    Database(#[from] crate::ports::database::Error),
    #[error("storage port error: {0}")]
    Storage(#[from] crate::ports::storage::Error),

    /// The request was rejected before reaching any port
    #[error("{0}")]
    Validation(Cow<'static, str>),
}

/// Member fields as submitted by the staff form
///
/// Any `nextPayment` sent along is ignored: the date is always recomputed from the plan.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub status: Status,
    pub checkins_this_month: Option<u32>,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
}

impl MemberInput {
    /// Validate the input and compute the next payment date from `now`
    pub fn into_draft(self, now: DateTime<Utc>) -> Result<MemberDraft, Error> {
        let name = required(self.name, "name")?;
        let phone = required(self.phone, "phone")?;
        let plan = required(self.plan, "plan")?;

        Ok(MemberDraft {
            next_payment: renewal::compute_next_payment_date(&plan, now),
            name,
            phone,
            email: non_blank(self.email),
            plan,
            status: self.status,
            checkins_this_month: self.checkins_this_month,
            avatar_url: non_blank(self.avatar_url),
            notes: non_blank(self.notes),
        })
    }
}

fn required(value: String, field: &'static str) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required").into()));
    }
    Ok(value.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse a member identifier taken from a request path
pub fn parse_member_id(raw: Option<&str>) -> Result<Uuid, Error> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(Error::Validation("missing member id".into()));
    }
    Uuid::parse_str(raw).map_err(|_| Error::Validation(format!("invalid member id: {raw}").into()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    pub(crate) fn input(name: &str, phone: &str, plan: &str) -> MemberInput {
        MemberInput {
            name: name.to_string(),
            phone: phone.to_string(),
            plan: plan.to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    fn test_into_draft_normalizes() {
        let now = Utc::now();
        let mut member = input("  Lan  ", " 0901 ", "3 tháng - Basic");
        member.email = Some("   ".to_string());
        member.avatar_url = Some("".to_string());
        member.notes = Some(" thích yoga ".to_string());

        let res = member.into_draft(now);

        assert_that!(res).is_ok().matches(|draft| {
            draft.name == "Lan"
                && draft.phone == "0901"
                && draft.email.is_none()
                && draft.avatar_url.is_none()
                && draft.notes.as_deref() == Some("thích yoga")
                && draft.status == Status::Active
                && draft.next_payment == renewal::compute_next_payment_date("3 tháng", now)
        });
    }

    #[rstest]
    #[case(input("", "0901", "1 tháng - Flex"), "name is required")]
    #[case(input("Lan", "  ", "1 tháng - Flex"), "phone is required")]
    #[case(input("Lan", "0901", ""), "plan is required")]
    fn test_into_draft_required(#[case] member: MemberInput, #[case] message: &str) {
        let res = member.into_draft(Utc::now());

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Validation(msg) if msg == message));
    }

    #[rstest]
    fn test_input_from_json() {
        let res: Result<MemberInput, _> = serde_json::from_str(
            r#"{
                "name": "Lan",
                "phone": "0901",
                "plan": "12 tháng - Premium",
                "status": "overdue",
                "checkinsThisMonth": 4,
                "avatarUrl": "https://example.com/a.png",
                "nextPayment": "2020-01-01T00:00:00Z"
            }"#,
        );

        assert_that!(res).is_ok().matches(|member| {
            member.status == Status::Overdue
                && member.checkins_this_month == Some(4)
                && member.avatar_url.as_deref() == Some("https://example.com/a.png")
        });
    }

    #[rstest]
    fn test_input_rejects_negative_checkins() {
        let res: Result<MemberInput, _> =
            serde_json::from_str(r#"{"name": "Lan", "phone": "0901", "checkinsThisMonth": -1}"#);

        assert_that!(res).is_err();
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("  "))]
    #[case(Some("not-a-uuid"))]
    fn test_parse_member_id_invalid(#[case] raw: Option<&str>) {
        assert_that!(parse_member_id(raw))
            .is_err()
            .matches(|err| matches!(err, Error::Validation(_)));
    }

    #[rstest]
    fn test_parse_member_id() {
        let id = Uuid::new_v4();

        assert_that!(parse_member_id(Some(id.to_string().as_str())))
            .is_ok()
            .is_equal_to(id);
    }
}
