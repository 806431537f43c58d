//! WebSocket server + REST endpoints for the ticket dashboard.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message as WsFrame, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::error::TicketError;
use crate::llm::check_ollama_status;
use crate::pipeline::processor::TriageProcessor;
use crate::pipeline::types::{Message, Status, TriageMode};
use crate::tickets::filter::TicketFilter;
use crate::tickets::model::{TicketAction, TicketEvent};
use crate::tickets::sort::{SortDirection, SortField};
use crate::tickets::store::TicketStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TicketStore>,
    pub processor: Arc<TriageProcessor>,
    /// Messages re-classified by `/api/tickets/retriage`.
    pub inbox: Arc<Vec<Message>>,
    /// Mode used when a request doesn't name one.
    pub default_mode: TriageMode,
    /// Ollama runtime probed by `/api/ai/status`.
    pub ollama_base_url: String,
    pub http: reqwest::Client,
}

/// Build the Axum router with ticket WebSocket and REST routes.
pub fn ticket_routes(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/tickets", get(list_tickets))
        .route("/api/tickets/{id}/status", post(set_status))
        .route("/api/tickets/reset", post(reset_all))
        .route("/api/tickets/resolve", post(resolve_all))
        .route("/api/tickets/retriage", post(retriage))
        .route("/api/summary", get(summary))
        .route("/api/triage", post(triage_message))
        .route("/api/ai/status", get(ai_status))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "support-triage",
        "mode": state.default_mode,
        "ai_provider": state.processor.remote_name(),
    }))
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.store))
}

async fn send_event(socket: &mut WebSocket, event: &TicketEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(WsFrame::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize ticket event");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, store: Arc<TicketStore>) {
    info!("WebSocket client connected");

    // Subscribe before the snapshot so no update slips between them
    let mut rx = store.subscribe();

    let sync = TicketEvent::TicketsSync {
        tickets: store.all().await,
    };
    if !send_event(&mut socket, &sync).await {
        warn!("Failed to send initial sync, client disconnected");
        return;
    }
    if let Some(info) = store.last_rate_limit().await {
        let notice = info.describe();
        if !send_event(&mut socket, &TicketEvent::RateLimited { info, notice }).await {
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("Client disconnected during send");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind broadcast");
                        let sync = TicketEvent::TicketsSync {
                            tickets: store.all().await,
                        };
                        if !send_event(&mut socket, &sync).await {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(WsFrame::Text(text))) => {
                        handle_client_message(&text, &store).await;
                    }
                    Some(Ok(WsFrame::Ping(data))) => {
                        if socket.send(WsFrame::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsFrame::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("WebSocket connection closed");
}

async fn handle_client_message(text: &str, store: &TicketStore) {
    match serde_json::from_str::<TicketAction>(text) {
        Ok(TicketAction::SetStatus { id, status }) => {
            if let Err(e) = store.set_status(&id, status).await {
                warn!(ticket_id = %id, error = %e, "Status change via WS failed");
            }
        }
        Ok(TicketAction::ResetAll) => {
            store.reset_all().await;
        }
        Ok(TicketAction::ResolveAll) => {
            store.resolve_all().await;
        }
        Err(e) => {
            debug!(error = %e, text = text, "Unrecognized WS message from client");
        }
    }
}

// ── Tickets ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    category: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
}

fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, String>
where
    T: std::str::FromStr<Err = String>,
{
    match value {
        None | Some("") | Some("All") | Some("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

impl ListQuery {
    fn parse(&self) -> Result<(TicketFilter, SortField, SortDirection), String> {
        let filter = TicketFilter {
            category: parse_opt(self.category.as_deref())?,
            priority: parse_opt(self.priority.as_deref())?,
            status: parse_opt(self.status.as_deref())?,
        };
        let field = parse_opt(self.sort.as_deref())?.unwrap_or_default();
        let direction = parse_opt(self.direction.as_deref())?.unwrap_or_default();
        Ok((filter, field, direction))
    }
}

async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match query.parse() {
        Ok((filter, field, direction)) => {
            let tickets = state.store.list(&filter, field, direction).await;
            Json(tickets).into_response()
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

#[derive(Deserialize)]
struct StatusRequest {
    status: String,
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Response {
    let status: Status = match body.status.parse() {
        Ok(status) => status,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.store.set_status(&id, status).await {
        Ok(ticket) => Json(ticket).into_response(),
        Err(e @ TicketError::NotFound { .. }) => {
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
    }
}

async fn reset_all(State(state): State<AppState>) -> impl IntoResponse {
    let count = state.store.reset_all().await;
    Json(serde_json::json!({"status": Status::New, "count": count}))
}

async fn resolve_all(State(state): State<AppState>) -> impl IntoResponse {
    let count = state.store.resolve_all().await;
    Json(serde_json::json!({"status": Status::Resolved, "count": count}))
}

#[derive(Deserialize)]
struct RetriageRequest {
    mode: Option<TriageMode>,
}

async fn retriage(
    State(state): State<AppState>,
    Json(body): Json<RetriageRequest>,
) -> impl IntoResponse {
    let mode = body.mode.unwrap_or(state.default_mode);
    info!(mode = %mode, count = state.inbox.len(), "Re-triaging inbox");

    let batch = state
        .processor
        .triage_batch(state.inbox.as_ref().clone(), mode)
        .await;

    state.store.clear_rate_limit().await;
    let rate_limited = batch.rate_limits.len();
    let count = batch.tickets.len();
    state.store.replace_all(batch.tickets).await;
    if let Some(info) = batch.rate_limits.into_iter().last() {
        state.store.record_rate_limit(info).await;
    }

    Json(serde_json::json!({
        "mode": mode,
        "count": count,
        "rate_limited": rate_limited,
    }))
}

// ── Summary ─────────────────────────────────────────────────────────────

async fn summary(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state.store.summary().await;
    let rate_limit = state.store.last_rate_limit().await;
    let notice = rate_limit.as_ref().map(|info| info.describe());
    Json(serde_json::json!({
        "summary": summary,
        "rate_limit": rate_limit,
        "notice": notice,
    }))
}

// ── Single-message triage ───────────────────────────────────────────────

#[derive(Deserialize)]
struct TriageRequest {
    #[serde(default)]
    message: String,
    mode: Option<TriageMode>,
}

async fn triage_message(
    State(state): State<AppState>,
    Json(body): Json<TriageRequest>,
) -> Response {
    if body.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message is required");
    }

    let mode = body.mode.unwrap_or(state.default_mode);
    let outcome = state.processor.triage_traced(&body.message, mode).await;
    if let Some(ref info) = outcome.rate_limit {
        state.store.record_rate_limit(info.clone()).await;
    }

    Json(serde_json::json!({
        "category": outcome.result.category,
        "priority": outcome.result.priority,
        "source": outcome.source,
        "rate_limit": outcome.rate_limit,
    }))
    .into_response()
}

// ── AI runtime status ───────────────────────────────────────────────────

async fn ai_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = check_ollama_status(&state.http, &state.ollama_base_url).await;
    Json(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use crate::pipeline::types::{Category, Priority};

    fn message(id: &str, body: &str, hour: u32) -> Message {
        Message {
            id: id.into(),
            customer_name: format!("Customer {id}"),
            email: format!("{id}@example.com"),
            body: body.into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap(),
        }
    }

    async fn app() -> (Router, Arc<TicketStore>) {
        let inbox = vec![
            message("1", "URGENT: app crashed", 9),
            message("2", "could you add dark mode", 10),
            message("3", "invoice wrong amount", 11),
        ];
        let processor = Arc::new(TriageProcessor::keyword_only());
        let store = TicketStore::new();
        store.replace_all(processor.keyword_tickets(inbox.clone())).await;

        let state = AppState {
            store: store.clone(),
            processor,
            inbox: Arc::new(inbox),
            default_mode: TriageMode::Keyword,
            ollama_base_url: "http://127.0.0.1:9".into(),
            http: reqwest::Client::new(),
        };
        (ticket_routes(state), store)
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app().await;
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["mode"], "keyword");
    }

    #[tokio::test]
    async fn list_defaults_to_priority_desc() {
        let (app, _) = app().await;
        let resp = app
            .oneshot(Request::get("/api/tickets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        let ids: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        // Two High tickets, most recent first, then the Low one
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let (app, _) = app().await;
        let resp = app
            .oneshot(
                Request::get("/api/tickets?category=Feature%20Request")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        let tickets = json.as_array().unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0]["priority"], "Low");
    }

    #[tokio::test]
    async fn list_rejects_unknown_values() {
        let (app, _) = app().await;
        for uri in [
            "/api/tickets?sort=name",
            "/api/tickets?direction=up",
            "/api/tickets?priority=Urgent",
        ] {
            let resp = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn status_change_and_not_found() {
        let (app, store) = app().await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/tickets/2/status",
                serde_json::json!({"status": "In Progress"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(store.get("2").await.unwrap().status(), Status::InProgress);

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/tickets/99/status",
                serde_json::json!({"status": "Resolved"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(post_json(
                "/api/tickets/2/status",
                serde_json::json!({"status": "Done"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bulk_actions_update_summary() {
        let (app, _) = app().await;

        let resp = app
            .clone()
            .oneshot(post_json("/api/tickets/resolve", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["count"], 3);

        let resp = app
            .clone()
            .oneshot(Request::get("/api/summary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["summary"]["resolution_rate"], 100);
        assert!(json["rate_limit"].is_null());

        app.clone()
            .oneshot(post_json("/api/tickets/reset", serde_json::json!({})))
            .await
            .unwrap();
        let resp = app
            .oneshot(Request::get("/api/summary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["summary"]["by_status"]["new"], 3);
    }

    #[tokio::test]
    async fn triage_endpoint_classifies() {
        let (app, _) = app().await;
        let resp = app
            .oneshot(post_json(
                "/api/triage",
                serde_json::json!({"message": "Refund my invoice ASAP"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["category"], Category::Billing.as_str());
        assert_eq!(json["priority"], Priority::High.as_str());
        assert_eq!(json["source"], "keyword");
    }

    #[tokio::test]
    async fn triage_requires_message() {
        let (app, _) = app().await;
        for body in [serde_json::json!({"message": "   "}), serde_json::json!({})] {
            let resp = app
                .clone()
                .oneshot(post_json("/api/triage", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(resp).await["error"], "Message is required");
        }
    }

    #[tokio::test]
    async fn retriage_resets_statuses() {
        let (app, store) = app().await;
        store.resolve_all().await;

        let resp = app
            .oneshot(post_json(
                "/api/tickets/retriage",
                serde_json::json!({"mode": "keyword"}),
            ))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["mode"], "keyword");
        assert_eq!(store.summary().await.by_status.new, 3);
    }

    #[tokio::test]
    async fn ai_status_reports_unreachable_runtime() {
        let (app, _) = app().await;
        let resp = app
            .oneshot(Request::get("/api/ai/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["isRunning"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn ws_client_actions_apply() {
        let (_, store) = app().await;
        handle_client_message(
            r#"{"action": "set_status", "id": "1", "status": "Resolved"}"#,
            &store,
        )
        .await;
        assert_eq!(store.get("1").await.unwrap().status(), Status::Resolved);

        handle_client_message(r#"{"action": "reset_all"}"#, &store).await;
        assert_eq!(store.get("1").await.unwrap().status(), Status::New);

        // Garbage is ignored
        handle_client_message("not json", &store).await;
    }
}
