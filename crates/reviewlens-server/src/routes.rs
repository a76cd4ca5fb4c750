//! HTTP routes and handlers

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use reviewlens_core::{Classification, Error, KeywordCount, Sentiment};
use reviewlens_models::ModelInfo;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::errors::ApiError;
use crate::state::AppState;
use crate::store::{FeedbackRecord, ModelSwitch, NewFeedback, StoredReview};

/// Model switches returned alongside `/model/info`
const INFO_HISTORY_LIMIT: usize = 10;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/reviews", post(create_review))
        .route("/reviews/search-by-keyword", get(search_by_keyword))
        .route("/reviews/:id", put(update_review).delete(delete_review))
        .route("/analyze-batch", post(analyze_batch))
        .route("/analyze-length-filter", post(analyze_length_filter))
        .route("/feedback", post(submit_feedback))
        .route("/feedbacks", get(list_feedbacks))
        .route("/keywords/top-positive", get(top_positive_keywords))
        .route("/keywords/top-negative", get(top_negative_keywords))
        .route("/keywords/top3", get(top_keywords))
        .route("/model/switch", post(switch_model))
        .route("/model/info", get(model_info))
        .route("/models", get(list_models))
        .fallback(fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    review_text: String,
}

#[derive(Debug, Serialize)]
struct ReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    review_text: String,
    sentiment: Sentiment,
    /// Confidence percentage with two decimals
    probability: f64,
    model: String,
    /// Store fault, reported without discarding the classification
    #[serde(skip_serializing_if = "Option::is_none")]
    persistence: Option<String>,
}

impl ReviewResponse {
    fn new(review_text: String, result: &Classification) -> Self {
        Self {
            id: None,
            review_text,
            sentiment: result.label,
            probability: result.percent(),
            model: result.model.clone(),
            persistence: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    review_text: String,
    sentiment: String,
    feedback: String,
}

#[derive(Debug, Serialize)]
struct FeedbackResponse {
    message: &'static str,
    original_sentiment: Sentiment,
    corrected_sentiment: Sentiment,
    feedback: &'static str,
    /// Confidence of the post-update prediction, percent
    probability: f64,
    /// Probability of the corrected label before the update, percent
    confidence_before: f64,
    sentiment_after: Sentiment,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    persistence: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordQuery {
    keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ModelSwitchRequest {
    model_name: String,
}

#[derive(Debug, Serialize)]
struct ModelInfoResponse {
    current_model: String,
    #[serde(flatten)]
    info: ModelInfo,
    history: Vec<ModelSwitch>,
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "current_model": state.engine.registry().current_name(),
        "metrics": state.metrics.snapshot(),
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => String::new().into_response(),
    }
}

async fn create_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    debug!(len = request.review_text.len(), "Classifying review");

    let result = classify(&state, request.review_text.clone()).await?;
    let mut response = ReviewResponse::new(request.review_text, &result);

    match state
        .store
        .insert_review(&response.review_text, result.label, response.probability)
        .await
    {
        Ok(review) => response.id = Some(review.id),
        Err(e) => response.persistence = Some(persistence_fault(&state, &e)),
    }

    Ok(Json(response))
}

async fn analyze_batch(
    State(state): State<AppState>,
    Json(requests): Json<Vec<ReviewRequest>>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    debug!(count = requests.len(), "Classifying review batch");

    let texts: Vec<String> = requests.into_iter().map(|r| r.review_text).collect();
    let engine = state.engine.clone();
    let started = Instant::now();

    let (texts, results) = run_blocking(&state, move || {
        let results = engine.classify_batch(&texts)?;
        Ok((texts, results))
    })
    .await?;

    let per_item = elapsed_us(started) / (results.len().max(1) as u64);
    for result in &results {
        state
            .metrics
            .record_classification(result.label.as_str(), per_item);
    }

    Ok(Json(
        texts
            .into_iter()
            .zip(results.iter())
            .map(|(text, result)| ReviewResponse::new(text, result))
            .collect(),
    ))
}

async fn analyze_length_filter(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let min_length = state.config.reviews.min_length;
    let length = request.review_text.chars().count();

    if length < min_length {
        return Err(ApiError::InvalidRequest(format!(
            "review is too short: {length} characters, minimum is {min_length}"
        )));
    }

    Ok(Json(json!({
        "message": "review length accepted",
        "length": length,
    })))
}

async fn search_by_keyword(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<StoredReview>>, ApiError> {
    let keyword = query.keyword.unwrap_or_default();
    if keyword.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "query parameter 'keyword' must not be empty".to_string(),
        ));
    }

    let reviews = state
        .store
        .search_reviews(&keyword, state.config.reviews.search_limit)
        .await
        .map_err(|e| core_error(&state, e))?;

    debug!(keyword = %keyword, found = reviews.len(), "Searched reviews");
    Ok(Json(reviews))
}

async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let review = state
        .store
        .update_review(id, &request.review_text)
        .await
        .map_err(|e| core_error(&state, e))?
        .ok_or_else(|| ApiError::NotFound(format!("review {id} not found")))?;

    Ok(Json(json!({
        "message": "review updated",
        "review": review,
    })))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state
        .store
        .delete_review(id)
        .await
        .map_err(|e| core_error(&state, e))?;

    if !removed {
        return Err(ApiError::NotFound(format!("review {id} not found")));
    }

    Ok(Json(json!({
        "message": "review deleted",
        "id": id,
    })))
}

async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    debug!(
        sentiment = %request.sentiment,
        feedback = %request.feedback,
        "Applying feedback"
    );

    let engine = state.engine.clone();
    let text = request.review_text.clone();
    let outcome = run_blocking(&state, move || {
        engine.feedback(&text, &request.sentiment, &request.feedback)
    })
    .await?;

    state.metrics.record_feedback(outcome.verdict.as_str());

    let mut response = FeedbackResponse {
        message: "feedback applied and model updated",
        original_sentiment: outcome.original,
        corrected_sentiment: outcome.corrected,
        feedback: outcome.verdict.as_str(),
        probability: outcome.after.percent(),
        confidence_before: reviewlens_core::to_percent(outcome.confidence_before),
        sentiment_after: outcome.after.label,
        model: outcome.after.model.clone(),
        persistence: None,
    };

    let record = NewFeedback {
        review_text: request.review_text,
        original_sentiment: outcome.original,
        corrected_sentiment: outcome.corrected,
        feedback: outcome.verdict,
        probability: response.probability,
    };
    if let Err(e) = state.store.record_feedback(record).await {
        response.persistence = Some(persistence_fault(&state, &e));
    }

    Ok(Json(response))
}

async fn list_feedbacks(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<FeedbackRecord>>, ApiError> {
    let limit = query
        .limit
        .map(clamp_limit)
        .unwrap_or(state.config.reviews.feedback_limit);

    let records = state
        .store
        .recent_feedback(limit)
        .await
        .map_err(|e| core_error(&state, e))?;

    Ok(Json(records))
}

async fn top_positive_keywords(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.keywords.label_limit);
    let window = state.config.keywords.label_window;
    let keywords = keywords_over(&state, Some(Sentiment::Positive), window, limit).await?;
    Ok(Json(json!({ "top_positive_keywords": keywords })))
}

async fn top_negative_keywords(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.keywords.label_limit);
    let window = state.config.keywords.label_window;
    let keywords = keywords_over(&state, Some(Sentiment::Negative), window, limit).await?;
    Ok(Json(json!({ "top_negative_keywords": keywords })))
}

async fn top_keywords(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.keywords.overall_limit);
    let window = state.config.keywords.overall_window;
    let keywords = keywords_over(&state, None, window, limit).await?;
    Ok(Json(json!({ "top_keywords": keywords })))
}

async fn switch_model(
    State(state): State<AppState>,
    Json(request): Json<ModelSwitchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let registry = state.engine.registry().clone();
    let name = request.model_name.clone();
    let version = run_blocking(&state, move || registry.load(&name)).await?;

    state.metrics.record_model_swap(version.name());
    info!(model = %version.name(), "Switched active model");

    let mut body = json!({
        "message": format!("switched to model '{}'", version.name()),
        "current_model": version.name(),
        "info": version.info(),
    });
    if let Err(e) = state.store.record_model_switch(version.name()).await {
        body["persistence"] = json!(persistence_fault(&state, &e));
    }

    Ok(Json(body))
}

async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfoResponse>, ApiError> {
    let info = state
        .engine
        .registry()
        .info()
        .ok_or_else(|| core_error(&state, Error::model_not_found("no model is loaded")))?;

    let history = state
        .store
        .model_history(INFO_HISTORY_LIMIT)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read model history");
            Vec::new()
        });

    Ok(Json(ModelInfoResponse {
        current_model: info.name.clone(),
        info,
        history,
    }))
}

async fn list_models(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let models = state
        .engine
        .registry()
        .available_models()
        .map_err(|e| core_error(&state, e))?;

    Ok(Json(json!({
        "current_model": state.engine.registry().current_name(),
        "models": models,
    })))
}

async fn fallback() -> Response {
    ApiError::NotFound("route not found".to_string()).into_response()
}

/// Classify one document off the async runtime and record its latency
async fn classify(state: &AppState, text: String) -> Result<Classification, ApiError> {
    let engine = state.engine.clone();
    let started = Instant::now();
    let result = run_blocking(state, move || engine.classify(&text)).await?;

    state
        .metrics
        .record_classification(result.label.as_str(), elapsed_us(started));
    Ok(result)
}

/// Rank keywords over the latest stored reviews
async fn keywords_over(
    state: &AppState,
    sentiment: Option<Sentiment>,
    window: usize,
    limit: i64,
) -> Result<Vec<KeywordCount>, ApiError> {
    let texts = state
        .store
        .recent_texts(sentiment, window)
        .await
        .map_err(|e| core_error(state, e))?;

    let extractor = state.keywords.clone();
    run_blocking(state, move || extractor.aggregate_top_keywords(&texts, limit)).await
}

/// Run CPU-bound core work on the blocking pool
async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> reviewlens_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(work).await.map_err(|e| {
        state.metrics.record_error("internal");
        ApiError::Internal(format!("worker task failed: {e}"))
    })?;

    joined.map_err(|e| core_error(state, e))
}

fn core_error(state: &AppState, err: Error) -> ApiError {
    state.metrics.record_error(err.kind());
    ApiError::from(err)
}

/// Log and count a store fault, returning the message for the response
fn persistence_fault(state: &AppState, err: &Error) -> String {
    warn!(error = %err, "Failed to persist result");
    state.metrics.record_error(err.kind());
    err.to_string()
}

/// Negative limits select nothing
fn clamp_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

fn elapsed_us(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
}
