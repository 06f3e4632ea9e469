use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{FilterCriteria, PlaceId, Progress, RatingSession, Recommendation, SessionFlow, Stars},
    routes::AppState,
    services::{filter, rating_collector, RefreshRequest},
};

#[derive(Debug, Deserialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum CreateSessionRequest {
    General {
        #[serde(default)]
        count: Option<usize>,
    },
    Filtered {
        #[serde(default)]
        criteria: FilterCriteria,
        #[serde(default)]
        count: Option<usize>,
    },
    Category {
        #[serde(default)]
        categories: Vec<String>,
        selection: Vec<PlaceId>,
    },
}

#[derive(Debug, Deserialize)]
pub struct StageRatingsRequest {
    pub ratings: BTreeMap<PlaceId, Stars>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionRecommendationsRequest {
    #[serde(default)]
    pub count: Option<usize>,
}

impl SessionRecommendationsRequest {
    /// Parses an optional JSON body; an empty body means defaults
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))
    }
}

#[derive(Debug, Serialize)]
pub struct SessionRecommendationsResponse {
    pub session_id: Uuid,
    pub rated: BTreeMap<PlaceId, Stars>,
    pub recommendations: Vec<Recommendation>,
}

/// Starts a rating session in one of the three flows
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<RatingSession>)> {
    let catalog = state.catalog().await;

    let session = match request {
        CreateSessionRequest::General { count } => {
            let pool = catalog.place_ids();
            let sample =
                rating_collector::sample_to_rate(&catalog, &pool, count, &mut rand::thread_rng())?;
            RatingSession::new(SessionFlow::General { count }, sample.place_ids, sample.truncated)
        }
        CreateSessionRequest::Filtered { criteria, count } => {
            let outcome = filter::filter_restaurants(&catalog, &criteria)?;
            let sample = rating_collector::sample_to_rate(
                &catalog,
                &outcome.place_ids,
                count,
                &mut rand::thread_rng(),
            )?;
            RatingSession::new(
                SessionFlow::Filtered { criteria, count },
                sample.place_ids,
                sample.truncated,
            )
        }
        CreateSessionRequest::Category {
            categories,
            selection,
        } => {
            let selected =
                rating_collector::select_from_categories(&catalog, &categories, &selection)?;
            RatingSession::new(SessionFlow::Category { categories }, selected, false)
        }
    };

    tracing::info!(
        request_id = %request_id,
        session_id = %session.id,
        to_rate = session.target,
        truncated = session.truncated,
        "Rating session created"
    );

    let session = state.insert_session(session).await;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RatingSession>> {
    Ok(Json(state.session(id).await?))
}

/// Discards a session so the user can start over
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.remove_session(id).await?;
    tracing::info!(session_id = %id, "Rating session discarded");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stage_ratings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<StageRatingsRequest>,
) -> AppResult<Json<RatingSession>> {
    let session = state
        .with_session(id, |session| {
            session.stage(request.ratings)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(session))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Progress>> {
    let progress = state.with_session(id, |session| session.submit()).await?;

    tracing::info!(
        session_id = %id,
        rated = progress.rated,
        target = progress.target,
        completed = progress.completed,
        "Ratings submitted"
    );

    Ok(Json(progress))
}

/// Retrains with the session's ratings and returns the top restaurants
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<SessionRecommendationsResponse>> {
    let request = SessionRecommendationsRequest::from_body(&body)?;

    let session = state.session(id).await?;
    if !session.completed {
        return Err(AppError::Conflict(format!(
            "Session {} has {} of {} restaurants rated; finish rating first",
            id,
            session.rated.len(),
            session.target
        )));
    }

    tracing::info!(
        request_id = %request_id,
        session_id = %id,
        "Generating session recommendations"
    );

    let catalog = state.catalog().await;
    let recommendations = state
        .engine
        .recommend(
            catalog,
            RefreshRequest {
                reviewer_id: session.reviewer_id(),
                ratings: session.rated.clone(),
                count: request.count,
                candidate_ids: None,
            },
        )
        .await?;

    let stored = recommendations.clone();
    state
        .with_session(id, move |session| {
            session.recommendations = Some(stored);
            session.touch();
            Ok(())
        })
        .await?;

    Ok(Json(SessionRecommendationsResponse {
        session_id: id,
        rated: session.rated,
        recommendations,
    }))
}
