use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod renewal;

use renewal::RenewalInfo;

/// Gym member record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Unique identifier for the `Member`
    pub id: Uuid,
    pub name: String,
    /// Contact phone number, unique across members
    pub phone: String,
    /// Contact email, unique across members when present
    pub email: Option<String>,
    /// Plan label, e.g. "12 tháng - Premium"
    ///
    /// The duration is encoded in the label itself, see [`renewal::plan_months`].
    pub plan: String,
    /// Date of the next membership payment
    pub next_payment: DateTime<Utc>,
    pub status: Status,
    pub checkins_this_month: u32,
    /// Public URL of the profile photo
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Build a new `Member` from a draft, with a fresh identifier
    pub fn from_draft(draft: MemberDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            phone: draft.phone,
            email: draft.email,
            plan: draft.plan,
            next_payment: draft.next_payment,
            status: draft.status,
            checkins_this_month: draft.checkins_this_month.unwrap_or_default(),
            avatar_url: draft.avatar_url,
            notes: draft.notes,
            created_at,
        }
    }

    /// Overwrite the editable fields with the ones from `draft`
    ///
    /// The check-in counter is only replaced when the draft carries one.
    pub fn apply(&mut self, draft: MemberDraft) {
        self.name = draft.name;
        self.phone = draft.phone;
        self.email = draft.email;
        self.plan = draft.plan;
        self.next_payment = draft.next_payment;
        self.status = draft.status;
        if let Some(checkins) = draft.checkins_this_month {
            self.checkins_this_month = checkins;
        }
        self.avatar_url = draft.avatar_url;
        self.notes = draft.notes;
    }

    /// Whether `query` appears in the name, phone or email, ignoring case
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.phone.to_lowercase().contains(&query)
            || self
                .email
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(&query)
    }

    pub fn renewal_info(&self, reference: DateTime<Utc>) -> RenewalInfo {
        renewal::renewal_info_for(self.next_payment, reference)
    }
}

/// Validated member fields, as written by the create and update paths
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberDraft {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub plan: String,
    pub next_payment: DateTime<Utc>,
    pub status: Status,
    /// `None` keeps the stored count on update and starts at 0 on create
    pub checkins_this_month: Option<u32>,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
}

/// Membership status, as set by staff
///
/// This is never derived from the payment date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
    Overdue,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
            Status::Overdue => "overdue",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown member status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            "overdue" => Ok(Status::Overdue),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Criteria for narrowing down the member list
#[derive(Clone, Debug, Default)]
pub struct MemberFilter {
    /// Free text matched against name, phone and email
    pub query: Option<String>,
    /// Only keep members with this status
    pub status: Option<Status>,
}

impl MemberFilter {
    pub fn matches(&self, member: &Member) -> bool {
        let query_match = match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => member.matches_query(query),
        };
        let status_match = self.status.map_or(true, |status| member.status == status);

        query_match && status_match
    }
}

/// Dashboard counters over all members
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub overdue: usize,
    /// Sum of check-ins for the current month
    pub checkins_this_month: u64,
}

impl MemberStats {
    pub fn from_members<'a>(members: impl IntoIterator<Item = &'a Member>) -> Self {
        members
            .into_iter()
            .fold(Self::default(), |mut stats, member| {
                stats.total += 1;
                match member.status {
                    Status::Active => stats.active += 1,
                    Status::Inactive => stats.inactive += 1,
                    Status::Overdue => stats.overdue += 1,
                }
                stats.checkins_this_month += u64::from(member.checkins_this_month);
                stats
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    pub(crate) fn draft(name: &str, phone: &str, email: Option<&str>) -> MemberDraft {
        MemberDraft {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.map(str::to_string),
            plan: renewal::PLANS[0].to_string(),
            next_payment: Utc::now(),
            status: Status::Active,
            checkins_this_month: None,
            avatar_url: None,
            notes: None,
        }
    }

    #[fixture]
    fn member() -> Member {
        Member::from_draft(
            draft("Nguyễn Văn An", "0901234567", Some("An@Example.com")),
            Utc::now(),
        )
    }

    #[rstest]
    #[case("nguyễn", true)]
    #[case("0901", true)]
    #[case("an@example", true)]
    #[case("EXAMPLE.COM", true)]
    #[case("trần", false)]
    fn test_matches_query(member: Member, #[case] query: &str, #[case] expected: bool) {
        assert_that!(member.matches_query(query)).is_equal_to(expected);
    }

    #[rstest]
    #[case(MemberFilter::default(), true)]
    #[case(MemberFilter { query: Some("  ".to_string()), status: None }, true)]
    #[case(MemberFilter { query: None, status: Some(Status::Active) }, true)]
    #[case(MemberFilter { query: None, status: Some(Status::Overdue) }, false)]
    #[case(MemberFilter { query: Some("090".to_string()), status: Some(Status::Active) }, true)]
    #[case(MemberFilter { query: Some("xyz".to_string()), status: Some(Status::Active) }, false)]
    fn test_filter(member: Member, #[case] filter: MemberFilter, #[case] expected: bool) {
        assert_that!(filter.matches(&member)).is_equal_to(expected);
    }

    #[rstest]
    fn test_from_draft_defaults_checkins(member: Member) {
        assert_that!(member.checkins_this_month).is_equal_to(0);
    }

    #[rstest]
    fn test_apply_keeps_checkins_when_absent(mut member: Member) {
        member.checkins_this_month = 7;
        let mut update = draft("Nguyễn Văn An", "0900000000", None);
        update.status = Status::Inactive;

        member.apply(update);

        assert_that!(member.checkins_this_month).is_equal_to(7);
        assert_that!(member.phone.as_str()).is_equal_to("0900000000");
        assert_that!(member.email).is_none();
        assert_that!(member.status).is_equal_to(Status::Inactive);
    }

    #[rstest]
    fn test_stats() {
        let mut members = vec![
            Member::from_draft(draft("A", "1", None), Utc::now()),
            Member::from_draft(draft("B", "2", None), Utc::now()),
            Member::from_draft(draft("C", "3", None), Utc::now()),
        ];
        members[0].checkins_this_month = 4;
        members[1].status = Status::Overdue;
        members[1].checkins_this_month = 2;
        members[2].status = Status::Inactive;

        let stats = MemberStats::from_members(&members);

        assert_that!(stats).is_equal_to(MemberStats {
            total: 3,
            active: 1,
            inactive: 1,
            overdue: 1,
            checkins_this_month: 6,
        });
    }

    #[rstest]
    #[case("active", Status::Active)]
    #[case("inactive", Status::Inactive)]
    #[case("overdue", Status::Overdue)]
    fn test_status_from_str(#[case] input: &str, #[case] expected: Status) {
        assert_that!(input.parse::<Status>()).is_ok().is_equal_to(expected);
        assert_that!(expected.to_string().as_str()).is_equal_to(input);
    }

    #[rstest]
    fn test_status_from_str_unknown() {
        assert_that!("paused".parse::<Status>()).is_err();
    }
}
