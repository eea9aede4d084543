//! REST API endpoint handlers for the Waggle server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/tick` | Trigger a round now (shared-secret guarded) |
//! | `GET` | `/api/status` | Driver status |
//! | `GET` | `/api/notifications` | Owner's notifications, prefs-filtered |
//! | `GET` | `/api/agents/{id}/report` | Daily activity report for one agent |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use uuid::Uuid;
use waggle_core::RoundOutcome;
use waggle_types::{AgentId, Notification, OwnerId};

use crate::error::ApiError;
use crate::state::ApiState;

/// Header carrying the shared-secret trigger token.
pub const TRIGGER_TOKEN_HEADER: &str = "x-waggle-token";

/// Default page size for notification listings.
const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// POST /api/tick
// ---------------------------------------------------------------------------

/// Response body of the trigger endpoint.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct TickResponse {
    /// `"completed"` or `"skipped"`.
    pub outcome: String,
    /// Total actions taken, when the round completed.
    pub actions: Option<u32>,
    /// Agents processed, when the round completed.
    pub agents_processed: Option<u32>,
}

/// Trigger a scheduling round immediately.
///
/// Requires the shared-secret token in the `x-waggle-token` header; a
/// missing or mismatched token yields `401` without touching the driver.
/// If a round is already in flight the request reports `skipped`.
pub async fn trigger_tick(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<TickResponse>, ApiError> {
    let token = headers
        .get(TRIGGER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if token != state.trigger_token {
        return Err(ApiError::Unauthorized);
    }

    match state.driver.try_run_round().await? {
        RoundOutcome::Completed(summary) => Ok(Json(TickResponse {
            outcome: String::from("completed"),
            actions: Some(summary.counts.total()),
            agents_processed: Some(summary.agents_processed),
        })),
        RoundOutcome::Skipped => Ok(Json(TickResponse {
            outcome: String::from("skipped"),
            actions: None,
            agents_processed: None,
        })),
    }
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Response body of the status endpoint.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    /// Whether a round is executing right now.
    pub round_in_flight: bool,
    /// Rounds completed since process start.
    pub rounds_completed: u64,
}

/// Report driver status.
pub async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        round_in_flight: state.driver.is_running(),
        rounds_completed: state.driver.rounds_completed(),
    })
}

// ---------------------------------------------------------------------------
// GET /api/notifications
// ---------------------------------------------------------------------------

/// Query parameters for the notifications endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct NotificationsQuery {
    /// The owner whose notifications to list.
    pub owner_id: String,
    /// Maximum number to return (default 50).
    pub limit: Option<u32>,
}

/// Response body of the notifications endpoint.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct NotificationsResponse {
    /// Notifications the owner's preferences allow, newest first.
    pub notifications: Vec<Notification>,
    /// Unread count across all kinds (preferences do not hide unread
    /// state, only the listing).
    pub unread_count: u32,
}

/// List an owner's notifications, filtered by their preferences.
///
/// Suppression is read-side only: opted-out kinds are written normally
/// and simply omitted here, so re-enabling a preference reveals the
/// history.
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let owner_id = parse_owner_id(&query.owner_id)?;
    let limit = query.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);

    let prefs = state.store.notification_prefs(owner_id).await?;
    let notifications = state
        .store
        .list_notifications(owner_id, limit)
        .await?
        .into_iter()
        .filter(|n| prefs.allows(n.kind))
        .collect();
    let unread_count = state.store.unread_notification_count(owner_id).await?;

    Ok(Json(NotificationsResponse {
        notifications,
        unread_count,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/notifications/unread-count
// ---------------------------------------------------------------------------

/// Query parameters for the unread-count endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct UnreadCountQuery {
    /// The owner whose unread notifications to count.
    pub owner_id: String,
}

/// Response body of the unread-count endpoint.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct UnreadCountResponse {
    /// Unread notifications across all kinds, preferences ignored.
    pub unread_count: u32,
}

/// Count an owner's unread notifications.
///
/// Unlike the listing, this count is never filtered by preferences:
/// an opted-out kind still counts as unread until marked read.
pub async fn unread_count(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<UnreadCountQuery>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let owner_id = parse_owner_id(&query.owner_id)?;
    let unread_count = state.store.unread_notification_count(owner_id).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

// ---------------------------------------------------------------------------
// GET /api/agents/{id}/report
// ---------------------------------------------------------------------------

/// Response body of the report endpoint.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ReportResponse {
    /// The agent the report describes.
    pub agent_id: AgentId,
    /// The synthesized daily report.
    pub report: String,
}

/// Compose today's activity report for one agent.
pub async fn agent_report(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    let agent_id = AgentId::from(
        Uuid::parse_str(&id).map_err(|e| ApiError::InvalidQuery(format!("invalid agent id: {e}")))?,
    );
    let report = state
        .driver
        .scheduler()
        .agent_report(agent_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no report available for agent {agent_id}")))?;
    Ok(Json(ReportResponse { agent_id, report }))
}

fn parse_owner_id(raw: &str) -> Result<OwnerId, ApiError> {
    Uuid::parse_str(raw)
        .map(OwnerId::from)
        .map_err(|e| ApiError::InvalidQuery(format!("invalid owner id: {e}")))
}
