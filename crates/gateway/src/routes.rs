use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use autoloop_core::traits::Page;
use autoloop_core::types::{ActivityRecord, AgentDefinition, AgentSnapshot, Args, ChatRecord};

use crate::{ApiError, AppState};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub(crate) struct ActionBody {
    connection: String,
    action: String,
    #[serde(default)]
    args: Args,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatQuery {
    user: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatBody {
    text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatHistoryQuery {
    user: String,
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityQuery {
    initiator: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

const MAX_PAGE_SIZE: usize = 100;

fn page_of(page: Option<usize>, limit: Option<usize>) -> Page {
    Page {
        page: page.unwrap_or(1).max(1),
        limit: limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE),
    }
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub(crate) async fn create_agent(
    State(state): State<AppState>,
    Json(definition): Json<AgentDefinition>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.supervisor.create(definition).await?;
    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

pub(crate) async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSnapshot>> {
    Json(state.supervisor.list().await)
}

pub(crate) async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentSnapshot>> {
    Ok(Json(state.supervisor.snapshot(&id).await?))
}

pub(crate) async fn remove_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.supervisor.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn load_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentSnapshot>> {
    state.supervisor.load(&id).await?;
    Ok(Json(state.supervisor.snapshot(&id).await?))
}

pub(crate) async fn start_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentSnapshot>> {
    state.supervisor.start(&id).await?;
    Ok(Json(state.supervisor.snapshot(&id).await?))
}

pub(crate) async fn stop_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentSnapshot>> {
    state.supervisor.stop(&id).await?;
    Ok(Json(state.supervisor.snapshot(&id).await?))
}

pub(crate) async fn perform_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActionBody>,
) -> ApiResult<Json<Value>> {
    let result = state
        .supervisor
        .perform_action(&id, &body.connection, &body.action, body.args)
        .await?;
    Ok(Json(json!({"result": result})))
}

pub(crate) async fn configure_connection(
    State(state): State<AppState>,
    Path((id, connection)): Path<(String, String)>,
    Json(params): Json<Args>,
) -> ApiResult<Json<Value>> {
    let configured = state
        .supervisor
        .configure_connection(&id, &connection, params)
        .await?;
    Ok(Json(json!({"configured": configured})))
}

pub(crate) async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ChatQuery>,
    Json(body): Json<ChatBody>,
) -> ApiResult<Json<Value>> {
    let reply = state.supervisor.chat(&id, &query.user, &body.text).await?;
    Ok(Json(json!({"reply": reply})))
}

/// Both directions of the conversation between `id` and a user, newest first.
pub(crate) async fn list_chats(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ChatHistoryQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let page = page_of(query.page, query.limit);
    // Each side contributes at most everything up to the end of the requested page.
    let window = Page {
        page: 1,
        limit: page.offset().saturating_add(page.limit),
    };
    let mut messages = Vec::new();
    for (sender, receiver) in [(&query.user, &id), (&id, &query.user)] {
        let side = state
            .sink
            .find(
                ChatRecord::COLLECTION,
                json!({"sender": sender, "receiver": receiver}),
                Some("timestamp"),
                window,
            )
            .await?;
        messages.extend(side);
    }
    messages.sort_by_key(|m| std::cmp::Reverse(m["timestamp"].as_i64().unwrap_or(i64::MIN)));
    Ok(Json(
        messages
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect(),
    ))
}

pub(crate) async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let filter = match query.initiator {
        Some(initiator) => json!({"initiator": initiator}),
        None => json!({}),
    };
    let page = page_of(query.page, query.limit);
    let records = state
        .sink
        .find(ActivityRecord::COLLECTION, filter, Some("timestamp"), page)
        .await?;
    Ok(Json(records))
}
