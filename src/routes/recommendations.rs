use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    cached,
    db::CacheKey,
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Candidate, Recommendation},
    routes::AppState,
    services::persist,
};

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

/// Handler for personalized recommendations
///
/// Cache-backed: a hit returns the memoized list for this (user, limit)
/// pair, a miss runs the full pipeline and caches the result.
pub async fn for_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Candidate>>> {
    let limit = state.engine.clamp_limit(params.limit);

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit,
        "Generating recommendations"
    );

    let key = CacheKey::UserRecommendations {
        user_id: user_id.clone(),
        limit,
    };
    let candidates: Vec<Candidate> = cached!(&state.cache, key, state.cache_ttl, async {
        state.engine.recommend(&user_id, limit).await
    })?;

    Ok(Json(candidates))
}

/// Handler that generates recommendations and persists them
///
/// Returns the rows that are now effective in storage; under max-score-wins
/// a returned row may carry a previously stored higher score.
pub async fn generate_and_save(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let limit = state.engine.clamp_limit(params.limit);

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit,
        "Generating and persisting recommendations"
    );

    let candidates = state.engine.recommend(&user_id, limit).await?;
    let persisted =
        persist::persist_candidates(state.recommendations.as_ref(), &user_id, &candidates).await;

    tracing::info!(
        request_id = %request_id,
        generated = candidates.len(),
        persisted = persisted.len(),
        "Recommendations persisted"
    );

    Ok(Json(persisted))
}

/// Handler for the global popularity ranking
pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Candidate>>> {
    let limit = state.engine.clamp_limit(params.limit);

    let key = CacheKey::Popular(limit);
    let candidates: Vec<Candidate> = cached!(&state.cache, key, state.cache_ttl, async {
        state.engine.popular(limit).await
    })?;

    Ok(Json(candidates))
}

/// Handler for the global trending ranking
pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Candidate>>> {
    let limit = state.engine.clamp_limit(params.limit);

    let key = CacheKey::Trending(limit);
    let candidates: Vec<Candidate> = cached!(&state.cache, key, state.cache_ttl, async {
        state.engine.trending(limit).await
    })?;

    Ok(Json(candidates))
}
