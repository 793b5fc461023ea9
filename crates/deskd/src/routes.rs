//! API routes for deskd.

use crate::aggregate::{self, BucketMinutes, BucketVolume, Strategic};
use crate::api_error::ApiError;
use crate::auth::Session;
use crate::dashboard::{buckets_for, parse_date_param, Period};
use crate::search::{search_entities, EntityKind, SearchHits};
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use desk_common::filter::{Sort, CAMPAIGN_SORT, COMPANY_SORT};
use desk_common::{
    Campaign, Company, DeskError, ListQuery, Page, Ticket, TicketFilter, TicketStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

type AppStateArc = Arc<AppState>;

/// Raw string-keyed query parameters; typing happens in the parsers.
type Params = HashMap<String, String>;

fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str)
}

// ============================================================================
// List Routes
// ============================================================================

pub fn list_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/tickets/list", get(list_tickets))
        .route("/api/companies/list", get(list_companies))
        .route("/api/campaigns/list", get(list_campaigns))
}

async fn list_tickets(
    State(state): State<AppStateArc>,
    _session: Session,
    Query(params): Query<Params>,
) -> Result<Json<Page<Ticket>>, ApiError> {
    let query = ListQuery::from_params(param(&params, "offset"), param(&params, "limit"));
    let filter = TicketFilter::from_params(
        param(&params, "search"),
        param(&params, "quick"),
        param(&params, "sort"),
    );

    let page = state.store.list_tickets(query, &filter).await?;
    Ok(Json(page))
}

async fn list_companies(
    State(state): State<AppStateArc>,
    _session: Session,
    Query(params): Query<Params>,
) -> Result<Json<Page<Company>>, ApiError> {
    let query = ListQuery::from_params(param(&params, "offset"), param(&params, "limit"));
    let sort = Sort::parse(param(&params, "sort"), COMPANY_SORT);

    let page = state
        .store
        .list_companies(query, param(&params, "search"), sort)
        .await?;
    Ok(Json(page))
}

async fn list_campaigns(
    State(state): State<AppStateArc>,
    _session: Session,
    Query(params): Query<Params>,
) -> Result<Json<Page<Campaign>>, ApiError> {
    let query = ListQuery::from_params(param(&params, "offset"), param(&params, "limit"));
    let sort = Sort::parse(param(&params, "sort"), CAMPAIGN_SORT);

    let page = state
        .store
        .list_campaigns(query, param(&params, "search"), sort)
        .await?;
    Ok(Json(page))
}

// ============================================================================
// Dashboard Routes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub period: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Present for director/admin sessions only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategic: Option<Strategic>,
    pub volume: Vec<BucketVolume>,
    pub time_spent: Vec<BucketMinutes>,
}

pub fn dashboard_routes() -> Router<AppStateArc> {
    Router::new().route("/api/dashboard/filtered", get(dashboard_filtered))
}

async fn dashboard_filtered(
    State(state): State<AppStateArc>,
    session: Session,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    let period = Period::parse(param(&params, "period"));
    let include_old = param(&params, "include_old") == Some("true");

    let (mut start, mut end) = period.window(Utc::now());
    if let Some(override_start) = parse_date_param(param(&params, "start_date"), false) {
        start = override_start;
    }
    if let Some(override_end) = parse_date_param(param(&params, "end_date"), true) {
        end = override_end;
    }
    if start > end {
        return Err(ApiError(DeskError::Validation(
            "start_date is after end_date".to_string(),
        )));
    }

    let buckets = buckets_for(start, end);

    // Chart blocks degrade to empty on storage failure so a wobbly
    // backend empties a widget instead of breaking the whole dashboard.
    let volume = match aggregate::volume_by_bucket(&state.store, &buckets).await {
        Ok(series) => series,
        Err(e) => {
            warn!("Volume aggregation failed, returning empty block: {e}");
            Vec::new()
        }
    };
    let time_spent = match aggregate::resolution_minutes_by_bucket(&state.store, &buckets).await {
        Ok(series) => series,
        Err(e) => {
            warn!("Time-spent aggregation failed, returning empty block: {e}");
            Vec::new()
        }
    };

    let strategic = if session.role.sees_strategic() {
        match aggregate::strategic_summary(&state.store, start, end, include_old).await {
            Ok(block) => Some(block),
            Err(e) => {
                warn!("Strategic summary failed, omitting block: {e}");
                None
            }
        }
    } else {
        None
    };

    let body = DashboardResponse {
        period: period.as_str().to_string(),
        start,
        end,
        strategic,
        volume,
        time_spent,
    };

    Ok((
        [(
            header::CACHE_CONTROL,
            "private, s-maxage=30, stale-while-revalidate=60",
        )],
        Json(body),
    )
        .into_response())
}

// ============================================================================
// Search Routes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    #[serde(flatten)]
    pub hits: SearchHits,
}

pub fn search_routes() -> Router<AppStateArc> {
    Router::new().route("/api/search", get(search))
}

async fn search(
    State(state): State<AppStateArc>,
    _session: Session,
    Query(params): Query<Params>,
) -> Result<Json<SearchResponse>, ApiError> {
    let kind = param(&params, "kind")
        .and_then(EntityKind::parse)
        .ok_or_else(|| {
            ApiError(DeskError::Validation(
                "kind must be one of ticket, company, contact, campaign".to_string(),
            ))
        })?;
    let query = param(&params, "q").unwrap_or("");

    let hits = search_entities(&state.store, kind, query).await?;
    Ok(Json(SearchResponse {
        total: hits.len(),
        hits,
    }))
}

// ============================================================================
// Webhook Routes
// ============================================================================

/// Inbound tracker event: a ticket changed status upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub key: String,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct WebhookOutcome {
    result: &'static str,
}

pub fn webhook_routes() -> Router<AppStateArc> {
    Router::new().route("/api/webhooks/jira", post(jira_webhook))
}

async fn jira_webhook(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Query(params): Query<Params>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let caller = caller_ip(&headers);
    let token = header_str(&headers, "x-webhook-token").or_else(|| param(&params, "token"));
    let signature = header_str(&headers, "x-hub-signature-256");

    state.validator.validate(&caller, token, signature, &body)?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError(DeskError::Validation(format!("Unparsable payload: {e}"))))?;
    let status = TicketStatus::parse(&event.status).ok_or_else(|| {
        ApiError(DeskError::Validation(format!(
            "Unknown status '{}'",
            event.status
        )))
    })?;
    let at = event.timestamp.unwrap_or_else(Utc::now);

    if state.store.update_ticket_status(&event.key, status, at).await? {
        info!("Webhook: {} -> {}", event.key, status);
        Ok((StatusCode::OK, Json(WebhookOutcome { result: "updated" })).into_response())
    } else {
        // Cross-reference miss is advisory: report it, don't fail the caller
        warn!("Webhook for unmatched ticket key {}", event.key);
        Ok((
            StatusCode::ACCEPTED,
            Json(WebhookOutcome {
                result: "unmatched",
            }),
        )
            .into_response())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Caller identity for rate limiting: first X-Forwarded-For hop when
/// behind a proxy, "unknown" otherwise.
fn caller_ip(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
