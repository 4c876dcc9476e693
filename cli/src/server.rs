use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use macrolog_core::aggregate::MultiplierOutcome;
use macrolog_core::day::DayTransition;
use macrolog_core::error::{CoreError, FieldError};
use macrolog_core::models::{
    DaySummary, DayType, Food, FoodEntrySnapshot, FoodPatch, NewFood, Settings, Targets,
};
use macrolog_core::service::{HISTORY_DAYS, LogOutcome, today};

use crate::commands::Service;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB
const MAX_HISTORY_DAYS: usize = 366;

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<Service>>,
    api_key: Option<String>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, Service> {
        self.svc
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct FoodListQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
struct LogEntryRequest {
    food_id: String,
    #[serde(default = "default_multiplier")]
    multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct DayTypeRequest {
    day_type: String,
}

#[derive(Deserialize)]
struct UpdateEntryRequest {
    multiplier: f64,
    /// Treat zero or negative as removal instead of rejecting it.
    #[serde(default)]
    remove_nonpositive: bool,
}

#[derive(Deserialize)]
struct HistoryQuery {
    days: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String, Vec<FieldError>),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            Self::BadRequest(msg, fields) => (StatusCode::BAD_REQUEST, msg, fields),
            Self::Internal(err) => {
                error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Vec::new(),
                )
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: message,
                fields,
            }),
        )
            .into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => Self::BadRequest(v.to_string(), v.fields),
            CoreError::FoodNotFound(_) | CoreError::EntryNotFound(_) => {
                Self::NotFound(err.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CoreError>() {
            Ok(core) => core.into(),
            Err(other) => Self::Internal(other),
        }
    }
}

fn parse_date_param(raw: &str) -> Result<NaiveDate, ApiError> {
    if raw == "today" {
        return Ok(today());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(
            format!("Invalid date '{raw}'. Use YYYY-MM-DD or today"),
            Vec::new(),
        )
    })
}

fn parse_day_type(raw: &str) -> Result<DayType, ApiError> {
    raw.parse::<DayType>()
        .map_err(|e| CoreError::from(e).into())
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            warn!(path = %request.uri().path(), "rejected request without valid API key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                    fields: Vec::new(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn list_foods(
    State(state): State<AppState>,
    Query(params): Query<FoodListQuery>,
) -> Result<Json<Vec<Food>>, ApiError> {
    let svc = state.svc();
    let foods = match params.search.as_deref() {
        Some(q) => svc.search_foods(q)?,
        None => svc.list_foods()?,
    };
    Ok(Json(foods))
}

async fn create_food(
    State(state): State<AppState>,
    Json(req): Json<NewFood>,
) -> Result<(StatusCode, Json<Food>), ApiError> {
    let food = state.svc().add_food(req)?;
    Ok((StatusCode::CREATED, Json(food)))
}

async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<FoodPatch>,
) -> Result<Json<Food>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest(
            "Nothing to update".to_string(),
            Vec::new(),
        ));
    }
    Ok(Json(state.svc().edit_food(&id, patch)?))
}

async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Food>>, ApiError> {
    Ok(Json(state.svc().delete_food(&id)?))
}

async fn log_entry(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(req): Json<LogEntryRequest>,
) -> Result<(StatusCode, Json<LogOutcome>), ApiError> {
    let date = parse_date_param(&date)?;
    let outcome = state.svc().log_food(date, &req.food_id, req.multiplier)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DaySummary>, ApiError> {
    let date = parse_date_param(&date)?;
    Ok(Json(state.svc().day_summary(date)?))
}

async fn set_day_type(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(req): Json<DayTypeRequest>,
) -> Result<Json<DayTransition>, ApiError> {
    let date = parse_date_param(&date)?;
    let day_type = parse_day_type(&req.day_type)?;
    Ok(Json(state.svc().toggle_day_type(date, day_type)?))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<MultiplierOutcome>, ApiError> {
    let svc = state.svc();
    let outcome = if req.remove_nonpositive {
        svc.set_multiplier_or_remove(&id, req.multiplier)?
    } else {
        MultiplierOutcome::Updated(svc.set_multiplier(&id, req.multiplier)?)
    };
    Ok(Json(outcome))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FoodEntrySnapshot>, ApiError> {
    Ok(Json(state.svc().remove_entry(&id)?))
}

async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<DaySummary>>, ApiError> {
    let days = params
        .days
        .unwrap_or(HISTORY_DAYS)
        .clamp(1, MAX_HISTORY_DAYS);
    Ok(Json(state.svc().history(days)?))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, ApiError> {
    Ok(Json(state.svc().settings()?))
}

async fn set_targets(
    State(state): State<AppState>,
    Path(day_type): Path<String>,
    Json(targets): Json<Targets>,
) -> Result<Json<Settings>, ApiError> {
    let day_type = parse_day_type(&day_type)?;
    Ok(Json(state.svc().update_targets(day_type, targets)?))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/foods", get(list_foods).post(create_food))
        .route("/api/foods/{id}", put(update_food).delete(delete_food))
        .route("/api/days/{date}", get(get_day))
        .route("/api/days/{date}/entries", post(log_entry))
        .route("/api/days/{date}/day-type", put(set_day_type))
        .route("/api/entries/{id}", put(update_entry).delete(delete_entry))
        .route("/api/history", get(get_history))
        .route("/api/settings", get(get_settings))
        .route("/api/targets/{day_type}", put(set_targets))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    svc: Service,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        let head = key.get(..4).unwrap_or_default();
        let tail = key.get(key.len().saturating_sub(4)..).unwrap_or_default();
        eprintln!("API key: {head}...{tail} (see api_key file in data directory)");
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!(%bind, port, "server started");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
