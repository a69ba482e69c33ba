//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    EntryRequest, EntryResponse, HabitImpactResponse, InsightsResponse, PatternObservationRequest,
    PatternQuery, PatternResponse, PredictionResponse, RecordEntryResponse, ScoreResponse,
    WeatherPayload, WeatherSnapshotResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{NaiveDate, Utc};
use mood_journal_core::domain::EntryDraft;
use mood_journal_core::error::JournalError;
use mood_journal_core::journal::ResubmitPolicy;
use std::sync::Arc;
use tracing::error;
use utoipa::OpenApi;
use uuid::Uuid;

const DEFAULT_PATTERN_LIMIT: usize = 10;
const MAX_PATTERN_LIMIT: usize = 100;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        create_entry_handler,
        put_entry_handler,
        list_entries_handler,
        list_patterns_handler,
        record_observation_handler,
        score_handler,
        prediction_handler,
        insights_handler,
    ),
    components(
        schemas(
            EntryRequest,
            EntryResponse,
            RecordEntryResponse,
            WeatherPayload,
            WeatherSnapshotResponse,
            PatternObservationRequest,
            PatternResponse,
            ScoreResponse,
            PredictionResponse,
            HabitImpactResponse,
            InsightsResponse,
        )
    ),
    tags(
        (name = "Mood Journal API", description = "Daily habit and mood journal with weather insights.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

fn error_response(e: JournalError) -> (StatusCode, String) {
    let status = match &e {
        JournalError::InvalidEntry(_) | JournalError::InvalidObservation(_) => {
            StatusCode::BAD_REQUEST
        }
        JournalError::DuplicateEntry(_) | JournalError::PersistenceConflict(_) => {
            StatusCode::CONFLICT
        }
        JournalError::WeatherUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        JournalError::Port(_) => {
            error!("Storage failure: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };
    (status, e.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}

async fn record(
    app_state: &AppState,
    user_id: Uuid,
    date: NaiveDate,
    body: EntryRequest,
    policy: ResubmitPolicy,
) -> Result<RecordEntryResponse, (StatusCode, String)> {
    let draft = EntryDraft::new(date, body.mood_rating, body.habits(), body.notes)
        .map_err(error_response)?;
    let outcome = app_state
        .journal
        .record_entry(user_id, draft, policy)
        .await
        .map_err(error_response)?;
    Ok(RecordEntryResponse::from(&outcome))
}

/// Record a daily entry. Only one entry per day is accepted here.
#[utoipa::path(
    post,
    path = "/entries",
    request_body = EntryRequest,
    responses(
        (status = 201, description = "Entry recorded", body = RecordEntryResponse),
        (status = 400, description = "Invalid entry"),
        (status = 409, description = "An entry for this date already exists"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<EntryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());
    let response = record(&app_state, user_id, date, body, ResubmitPolicy::Reject).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Record or replace the entry for a given date.
#[utoipa::path(
    put,
    path = "/entries/{date}",
    request_body = EntryRequest,
    responses(
        (status = 200, description = "Entry recorded", body = RecordEntryResponse),
        (status = 400, description = "Invalid entry"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("date" = NaiveDate, Path, description = "The day the entry is for (YYYY-MM-DD)."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn put_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<EntryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let response = record(&app_state, user_id, date, body, ResubmitPolicy::Overwrite).await?;
    Ok(Json(response))
}

/// List all entries, most recent first.
#[utoipa::path(
    get,
    path = "/entries",
    responses(
        (status = 200, description = "The user's entries", body = [EntryResponse]),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_entries_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = app_state
        .journal
        .entries(user_id)
        .await
        .map_err(error_response)?;
    let body: Vec<EntryResponse> = entries.iter().map(EntryResponse::from).collect();
    Ok(Json(body))
}

/// The user's most established weather/mood patterns.
#[utoipa::path(
    get,
    path = "/patterns",
    responses(
        (status = 200, description = "Patterns by sample count, descending", body = [PatternResponse]),
        (status = 500, description = "Internal server error")
    ),
    params(
        PatternQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_patterns_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<PatternQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PATTERN_LIMIT)
        .min(MAX_PATTERN_LIMIT);
    let patterns = app_state
        .journal
        .top_patterns(user_id, limit)
        .await
        .map_err(error_response)?;
    let body: Vec<PatternResponse> = patterns.iter().map(PatternResponse::from).collect();
    Ok(Json(body))
}

/// Feed one weather observation and its mood impact into the user's patterns.
#[utoipa::path(
    post,
    path = "/patterns/observations",
    request_body = PatternObservationRequest,
    responses(
        (status = 200, description = "The updated bucket", body = PatternResponse),
        (status = 400, description = "Invalid observation"),
        (status = 409, description = "The bucket could not be updated after retrying"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn record_observation_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<PatternObservationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let pattern = app_state
        .journal
        .update_pattern(user_id, body.weather.into(), body.mood_impact)
        .await
        .map_err(error_response)?;
    Ok(Json(PatternResponse::from(&pattern)))
}

/// Score a weather reading without storing anything.
#[utoipa::path(
    post,
    path = "/weather/score",
    request_body = WeatherPayload,
    responses(
        (status = 200, description = "The weather impact score", body = ScoreResponse),
        (status = 400, description = "Temperature or humidity missing or invalid")
    )
)]
pub async fn score_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<WeatherPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = app_state
        .journal
        .score_reading(body.into())
        .map_err(error_response)?;
    Ok(Json(ScoreResponse::from(result)))
}

/// Predict today's weather impact using current conditions and personal patterns.
#[utoipa::path(
    get,
    path = "/weather/prediction",
    responses(
        (status = 200, description = "Prediction and recommendation", body = PredictionResponse),
        (status = 503, description = "Weather data unavailable"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn prediction_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let prediction = app_state
        .journal
        .predict_current(user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(PredictionResponse::from(prediction)))
}

/// Mood trends across habits and weather.
#[utoipa::path(
    get,
    path = "/insights",
    responses(
        (status = 200, description = "Trend summary", body = InsightsResponse),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn insights_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let trends = app_state
        .journal
        .trends(user_id, DEFAULT_PATTERN_LIMIT)
        .await
        .map_err(error_response)?;
    Ok(Json(InsightsResponse::from(&trends)))
}
