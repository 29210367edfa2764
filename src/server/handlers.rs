use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::classify::{Classifier, InferenceEndpoint};
use crate::feed::{flatten, FeedConfig, FeedError, GraphClient};
use crate::gazetteer::{Gazetteer, GazetteerEntry};
use crate::report::{self, RowFilter};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── Filter parsing ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RowsQuery {
    pub q: Option<String>,
    pub neighborhood: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_date(label: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| {
                api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid {} date '{}': {}", label, s, e),
                )
            }),
    }
}

fn row_filter(params: &RowsQuery) -> Result<RowFilter, ApiError> {
    Ok(RowFilter {
        query: params.q.clone().filter(|s| !s.trim().is_empty()),
        neighborhood: params.neighborhood.clone().filter(|s| !s.trim().is_empty()),
        from: parse_date("from", params.from.as_deref())?,
        to: parse_date("to", params.to.as_deref())?,
    })
}

// ─── GET /api/records ────────────────────────────────────────────

pub async fn records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RowsQuery>,
) -> Result<Response, Response> {
    let start = Instant::now();
    let filter = row_filter(&params).map_err(|e| e.into_response())?;

    let rows = state.rows.read().unwrap();
    let hits: Vec<_> = report::filter_rows(&rows, &filter)
        .into_iter()
        .cloned()
        .collect();

    eprintln!(
        "[{}] GET /api/records -> {} of {} rows ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        hits.len(),
        rows.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(Json(hits).into_response())
}

// ─── GET /api/summary/... ────────────────────────────────────────

pub async fn summary_neighborhoods(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RowsQuery>,
) -> Result<Response, Response> {
    let filter = row_filter(&params).map_err(|e| e.into_response())?;
    let rows = state.rows.read().unwrap();
    let hits = report::filter_rows(&rows, &filter);
    let summary = report::summarize_by_neighborhood(&hits);

    eprintln!(
        "[{}] GET /api/summary/neighborhoods -> {} groups",
        Utc::now().format("%H:%M:%S"),
        summary.len(),
    );
    Ok(Json(summary).into_response())
}

pub async fn summary_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RowsQuery>,
) -> Result<Response, Response> {
    let filter = row_filter(&params).map_err(|e| e.into_response())?;
    let rows = state.rows.read().unwrap();
    let hits = report::filter_rows(&rows, &filter);
    let summary = report::summarize_by_category(&hits);

    eprintln!(
        "[{}] GET /api/summary/categories -> {} groups",
        Utc::now().format("%H:%M:%S"),
        summary.len(),
    );
    Ok(Json(summary).into_response())
}

// ─── GET /api/neighborhoods ──────────────────────────────────────

pub async fn neighborhoods(State(state): State<Arc<AppState>>) -> Json<Vec<GazetteerEntry>> {
    let snapshot = state.gazetteer.read().unwrap().clone();
    Json(snapshot.entries().cloned().collect())
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

pub async fn resolve_probe(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, Response> {
    let start = Instant::now();
    let text = params.text.as_deref().unwrap_or("").trim();
    if text.is_empty() {
        return Err(
            api_error(StatusCode::BAD_REQUEST, "Missing 'text' parameter").into_response()
        );
    }

    let resolution = state.resolver().resolve(text);

    eprintln!(
        "[{}] GET /api/resolve -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        resolution
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("no match"),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(match resolution {
        Some(r) => ResolveResponse {
            matched: true,
            name: Some(r.name),
            stage: Some(r.stage.to_string()),
            score: Some(r.score),
        },
        None => ResolveResponse {
            matched: false,
            name: None,
            stage: None,
            score: None,
        },
    }))
}

// ─── POST /api/refresh ───────────────────────────────────────────

#[derive(Serialize)]
pub struct RefreshResponse {
    pub records: usize,
    pub geotagged: usize,
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<RefreshResponse>, Response> {
    let start = Instant::now();

    // Reload the gazetteer first, as a snapshot swap. Failure keeps the
    // current snapshot and aborts the cycle.
    if let Some(ref path) = state.gazetteer_path {
        match Gazetteer::from_json_file(path) {
            Ok(fresh) => {
                *state.gazetteer.write().unwrap() = Arc::new(fresh);
            }
            Err(e) => {
                return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                    .into_response());
            }
        }
    }

    let config = FeedConfig::from_env().map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, e.to_string()).into_response()
    })?;
    let client = GraphClient::new(config);

    let bundle = client
        .fetch_posts_with_comments(state.limit_posts, state.limit_comments)
        .map_err(|e| {
            let status = match e {
                FeedError::Empty => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            api_error(status, e.to_string()).into_response()
        })?;

    let records = flatten(&bundle);
    let complaint = state
        .complaint_url
        .as_ref()
        .map(|u| InferenceEndpoint::new(u.clone()));
    let category = state
        .category_url
        .as_ref()
        .map(|u| InferenceEndpoint::new(u.clone()));

    let resolver = state.resolver();
    let rows = report::analyze(
        records,
        &resolver,
        complaint.as_ref().map(|c| c as &dyn Classifier),
        category.as_ref().map(|c| c as &dyn Classifier),
    );

    let geotagged = rows.iter().filter(|r| !r.neighborhood.is_empty()).count();
    let total = rows.len();

    // Wholesale replacement; no incremental merge.
    *state.rows.write().unwrap() = rows;

    eprintln!(
        "[{}] POST /api/refresh -> {} records, {} geotagged ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        total,
        geotagged,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(RefreshResponse {
        records: total,
        geotagged,
    }))
}
