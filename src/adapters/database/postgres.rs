use crate::{
    domain::{Member, MemberDraft, Status},
    ports::database::{DatabasePort, Error},
};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

const POSTGRES_UNIQUE_VIOLATION: &str = "23505";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS members (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT NOT NULL CONSTRAINT members_phone_key UNIQUE,
    email TEXT CONSTRAINT members_email_key UNIQUE,
    plan TEXT NOT NULL,
    next_payment TIMESTAMPTZ NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    checkins_this_month INTEGER NOT NULL DEFAULT 0 CHECK (checkins_this_month >= 0),
    avatar_url TEXT,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS members_created_at_idx ON members (created_at DESC);
"#;

const MEMBER_COLUMNS: &str = "id, name, phone, email, plan, next_payment, status, \
    checkins_this_month, avatar_url, notes, created_at";

/// PostgreSQL member store
///
/// The pool is owned by the adapter and shared by cloning.
#[derive(Clone, Debug)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and make sure the `members` table exists
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let database = Self::new(pool);
        database.migrate().await?;

        Ok(database)
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::debug!("members schema ready");
        Ok(())
    }
}

#[async_trait::async_trait]
impl DatabasePort for PostgresDatabase {
    async fn list_members(&self) -> Result<Vec<Member>, Error> {
        let rows: Vec<MemberRow> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Member::try_from).collect()
    }

    async fn create_member(&self, draft: MemberDraft) -> Result<Member, Error> {
        let row: MemberRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO members (id, name, phone, email, plan, next_payment, status,
                                 checkins_this_month, avatar_url, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.plan)
        .bind(draft.next_payment)
        .bind(draft.status.as_str())
        .bind(checkins_to_db(draft.checkins_this_month.unwrap_or_default())?)
        .bind(&draft.avatar_url)
        .bind(&draft.notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Member::try_from(row)
    }

    async fn update_member(&self, member_id: Uuid, draft: MemberDraft) -> Result<Member, Error> {
        let checkins = draft
            .checkins_this_month
            .map(checkins_to_db)
            .transpose()?;

        let row: Option<MemberRow> = sqlx::query_as(&format!(
            r#"
            UPDATE members
            SET name = $2, phone = $3, email = $4, plan = $5, next_payment = $6, status = $7,
                checkins_this_month = COALESCE($8, checkins_this_month),
                avatar_url = $9, notes = $10
            WHERE id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(member_id)
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.plan)
        .bind(draft.next_payment)
        .bind(draft.status.as_str())
        .bind(checkins)
        .bind(&draft.avatar_url)
        .bind(&draft.notes)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(Error::MemberDoesNotExist(member_id))
            .and_then(Member::try_from)
    }

    async fn delete_member(&self, member_id: Uuid) -> Result<(), Error> {
        let res = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(Error::MemberDoesNotExist(member_id));
        }
        Ok(())
    }
}

/// Row as stored in the `members` table
#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    name: String,
    phone: String,
    email: Option<String>,
    plan: String,
    next_payment: DateTime<Utc>,
    status: String,
    checkins_this_month: i32,
    avatar_url: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = Error;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let status: Status = row
            .status
            .parse()
            .map_err(|err| Error::Adapter(Box::new(err)))?;
        let checkins_this_month = u32::try_from(row.checkins_this_month)
            .map_err(|err| Error::Adapter(Box::new(err)))?;

        Ok(Member {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            plan: row.plan,
            next_payment: row.next_payment,
            status,
            checkins_this_month,
            avatar_url: row.avatar_url,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

fn checkins_to_db(checkins: u32) -> Result<i32, Error> {
    i32::try_from(checkins).map_err(|err| Error::Adapter(Box::new(err)))
}

/// Map a violated unique constraint to the member field it protects
fn constraint_field(constraint: &str) -> String {
    match constraint {
        "members_phone_key" => "phone".to_string(),
        "members_email_key" => "email".to_string(),
        other => other
            .strip_prefix("members_")
            .and_then(|rest| rest.strip_suffix("_key"))
            .unwrap_or(other)
            .to_string(),
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(POSTGRES_UNIQUE_VIOLATION) {
                let fields = db_err
                    .constraint()
                    .map(constraint_field)
                    .map(|field| vec![field])
                    .unwrap_or_else(|| vec!["email".to_string(), "phone".to_string()]);
                return Self::Conflict { fields };
            }
        }

        Self::Adapter(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case("members_phone_key", "phone")]
    #[case("members_email_key", "email")]
    #[case("members_nickname_key", "nickname")]
    #[case("some_other_index", "some_other_index")]
    fn test_constraint_field(#[case] constraint: &str, #[case] expected: &str) {
        assert_that!(constraint_field(constraint).as_str()).is_equal_to(expected);
    }

    #[rstest]
    fn test_row_with_unknown_status() {
        let row = MemberRow {
            id: Uuid::new_v4(),
            name: "Lan".to_string(),
            phone: "0901".to_string(),
            email: None,
            plan: "1 tháng - Flex".to_string(),
            next_payment: Utc::now(),
            status: "paused".to_string(),
            checkins_this_month: 0,
            avatar_url: None,
            notes: None,
            created_at: Utc::now(),
        };

        assert_that!(Member::try_from(row))
            .is_err()
            .matches(|err| matches!(err, Error::Adapter(_)));
    }

    #[rstest]
    fn test_row_with_negative_checkins() {
        let row = MemberRow {
            id: Uuid::new_v4(),
            name: "Lan".to_string(),
            phone: "0901".to_string(),
            email: None,
            plan: "1 tháng - Flex".to_string(),
            next_payment: Utc::now(),
            status: "active".to_string(),
            checkins_this_month: -1,
            avatar_url: None,
            notes: None,
            created_at: Utc::now(),
        };

        assert_that!(Member::try_from(row)).is_err();
    }

    #[rstest]
    fn test_non_database_error_is_adapter_error() {
        let err: Error = sqlx::Error::RowNotFound.into();

        assert_that!(matches!(err, Error::Adapter(_))).is_true();
    }
}
