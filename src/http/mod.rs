//! JSON API over the member commands
//!
//! Handlers only translate between HTTP and [`commands`](crate::commands); every rule lives in
//! the commands and the domain.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    commands::{upload_avatar::MAX_AVATAR_BYTES, DomainLogic},
    ports::{database::DatabasePort, storage::StoragePort},
};

pub mod error;
pub mod members;
pub mod upload;

pub type SharedDatabase = dyn DatabasePort + Send + Sync;
pub type SharedStorage = dyn StoragePort + Send + Sync;

/// Room for the multipart envelope around the largest accepted photo
const UPLOAD_BODY_LIMIT: usize = MAX_AVATAR_BYTES + 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub logic: DomainLogic<SharedDatabase, SharedStorage>,
}

impl AppState {
    pub fn new(logic: DomainLogic<SharedDatabase, SharedStorage>) -> Self {
        Self { logic }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/plans", get(members::plans))
        .route(
            "/api/members",
            get(members::list)
                .post(members::create)
                .delete(members::delete_without_id),
        )
        .route("/api/members/stats", get(members::stats))
        .route(
            "/api/members/{id}",
            patch(members::update).delete(members::delete),
        )
        .route(
            "/api/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
