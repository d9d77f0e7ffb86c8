//! # Handlers
//!
//! Coordinates the flow between HTTP requests and the board service.
//! Read endpoints are public; only mutations are gated, and that gating
//! lives in the service.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domains::{DomainError, Identity};
use services::{Command, Dispatched, Requester, SubmitPost};

use crate::cookies;
use crate::dto::{PostView, RoleView, SubmitRequest, SubmitResponse, TopicRequest, TopicResponse};
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::state::AppState;

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// `POST /api/posts`: ordinary post or moderation command.
///
/// Sets the identity cookie on success.
pub async fn submit_post(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SubmitRequest>,
) -> ApiResult<Response> {
    let command = Command::parse(&req.content).map(|c| c.label());

    let submitted = state
        .board
        .submit(SubmitPost {
            name: req.name,
            seed: req.seed,
            content: req.content,
        })
        .await
        .map_err(|err| {
            record_failure(&state, command, &err);
            ApiError::from(err)
        })?;

    let status = match &submitted.outcome {
        Dispatched::Posted { pruned, .. } => {
            state.metrics.post_stored(*pruned);
            StatusCode::CREATED
        }
        Dispatched::Command(outcome) => {
            state.metrics.command(outcome.command(), "ok");
            StatusCode::OK
        }
    };

    let cookie = cookies::set_cookie(&state.cookies, &submitted.identity, state.secure_cookies);
    let body = SubmitResponse::new(submitted.identity, submitted.outcome);
    let mut response = (status, Json(body)).into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

fn record_failure(state: &AppState, command: Option<&str>, err: &DomainError) {
    if matches!(err, DomainError::RateLimited(_)) {
        state.metrics.rate_limited();
        return;
    }
    if let Some(command) = command {
        let outcome = ApiError(err.clone()).code().to_ascii_lowercase();
        state.metrics.command(command, &outcome);
    }
}

/// `POST /api/topic`: board-wide topic rewrite. The seed may be omitted
/// when the identity cookie from an earlier post is present.
pub async fn update_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<TopicRequest>,
) -> ApiResult<Json<TopicResponse>> {
    let remembered = cookies::remembered_identity(&state.cookies, &headers);
    let requester = Requester::resolve(req.seed, remembered);
    let updated = state.board.update_topic(requester, &req.topic).await?;
    Ok(Json(updated.into()))
}

/// `GET /api/topic`
pub async fn current_topic(State(state): State<AppState>) -> ApiResult<Json<TopicResponse>> {
    let topic = state.board.current_topic().await?;
    Ok(Json(TopicResponse {
        topic,
        rewritten: None,
    }))
}

/// `GET /api/posts`: newest first, numbered as `/del` addresses them.
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<PostView>>> {
    let posts = state.board.list_posts().await?;
    Ok(Json(PostView::listing(posts)))
}

/// `GET /api/roles`
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<Vec<RoleView>>> {
    let roles = state.board.list_roles().await?;
    Ok(Json(roles.into_iter().map(RoleView::from).collect()))
}

/// `GET /api/admins`
pub async fn list_admins(State(state): State<AppState>) -> ApiResult<Json<Vec<Identity>>> {
    Ok(Json(state.board.list_admins().await?))
}

pub async fn health() -> &'static str {
    "ok"
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
