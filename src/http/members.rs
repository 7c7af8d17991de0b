use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower::Service;

use crate::{
    commands::{
        create_member::CreateMemberRequest, delete_member::DeleteMemberRequest,
        list_members::{ListMembersRequest, MemberSummary},
        update_member::UpdateMemberRequest, MemberInput,
    },
    domain::{renewal, Member, MemberFilter, MemberStats, Status},
};

use super::{error::ApiError, AppState};

/// Query string of `GET /api/members`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Free-text search
    pub q: Option<String>,
    /// `active`, `inactive`, `overdue` or `all`, in any case
    pub status: Option<String>,
}

impl ListParams {
    fn into_filter(self) -> Result<MemberFilter, ApiError> {
        let status = self.status.map(|status| status.trim().to_lowercase());
        let status = match status.as_deref() {
            None | Some("") | Some("all") => None,
            Some(status) => Some(
                status
                    .parse::<Status>()
                    .map_err(|err| ApiError::bad_request(err.to_string()))?,
            ),
        };

        Ok(MemberFilter {
            query: self.q,
            status,
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<MemberSummary>>, ApiError> {
    let Query(params) = params?;
    let filter = params.into_filter()?;
    let res = state
        .logic
        .clone()
        .call(ListMembersRequest { filter })
        .await?;

    Ok(Json(res.members))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<MemberStats>, ApiError> {
    let res = state
        .logic
        .clone()
        .call(ListMembersRequest::default())
        .await?;

    Ok(Json(res.stats))
}

pub async fn create(
    State(state): State<AppState>,
    input: Result<Json<MemberInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let Json(input) = input?;
    let member = state
        .logic
        .clone()
        .call(CreateMemberRequest { input })
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update(
    State(state): State<AppState>,
    member_id: Result<Path<String>, PathRejection>,
    input: Result<Json<MemberInput>, JsonRejection>,
) -> Result<Json<Member>, ApiError> {
    let Path(member_id) = member_id?;
    let Json(input) = input?;
    let member = state
        .logic
        .clone()
        .call(UpdateMemberRequest { member_id, input })
        .await?;

    Ok(Json(member))
}

pub async fn delete(
    State(state): State<AppState>,
    member_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(member_id) = member_id?;
    delete_member(state, Some(member_id)).await
}

/// `DELETE /api/members` without an identifier
pub async fn delete_without_id(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    delete_member(state, None).await
}

async fn delete_member(state: AppState, member_id: Option<String>) -> Result<Json<Value>, ApiError> {
    state
        .logic
        .clone()
        .call(DeleteMemberRequest { member_id })
        .await?;

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Serialize)]
pub struct PlanEntry {
    pub label: &'static str,
    pub months: u32,
}

pub async fn plans() -> Json<Vec<PlanEntry>> {
    Json(
        renewal::PLANS
            .iter()
            .map(|&label| PlanEntry {
                label,
                months: renewal::plan_months(label),
            })
            .collect(),
    )
}
