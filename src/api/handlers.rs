use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    validate_composition, Blend, CatalogEntry, FlavorComponent, NewBlend, GUEST_AUTHOR,
};
use crate::services::{aggregator, recommendation};

use super::viewer::Viewer;
use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct BlendResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub components: Vec<FlavorComponent>,
    pub average_intensity: u8,
    pub like_count: u32,
    pub created_at: DateTime<Utc>,
    /// Derived natural-language summary
    pub description: String,
}

impl From<&Blend> for BlendResponse {
    fn from(blend: &Blend) -> Self {
        Self {
            id: blend.id,
            title: blend.title.clone(),
            author: blend.author.clone(),
            components: blend.components.clone(),
            average_intensity: blend.average_intensity,
            like_count: blend.like_count,
            created_at: blend.created_at,
            description: aggregator::describe(&blend.components),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBlendRequest {
    pub title: String,
    /// Overrides the viewer's display name when given
    pub author: Option<String>,
    pub components: Vec<FlavorComponent>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub mood: Option<String>,
    pub strength: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct FlavorSearchParams {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFlavorRequest {
    pub name: String,
    pub intensity: u8,
    #[serde(default)]
    pub taste_tags: String,
}

#[derive(Debug, Deserialize)]
pub struct AddModerationWordRequest {
    pub word: String,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Get all persisted blends, in submission order
pub async fn list_blends(State(state): State<AppState>) -> AppResult<Json<Vec<BlendResponse>>> {
    let blends = state.store.load_all().await?;
    Ok(Json(blends.iter().map(BlendResponse::from).collect()))
}

/// Submit a finalized composition
pub async fn create_blend(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(request): Json<CreateBlendRequest>,
) -> AppResult<(StatusCode, Json<BlendResponse>)> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".to_string()));
    }
    state.moderation.read().await.check(title)?;
    validate_composition(&request.components)?;

    let author = request
        .author
        .as_deref()
        .or(viewer.name.as_deref())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(GUEST_AUTHOR)
        .to_string();

    let blend = state
        .store
        .append(NewBlend {
            title: title.to_string(),
            author,
            average_intensity: aggregator::average_intensity(&request.components),
            components: request.components,
        })
        .await?;

    tracing::info!(blend_id = %blend.id, title = %blend.title, "blend created");
    Ok((StatusCode::CREATED, Json(BlendResponse::from(&blend))))
}

/// Personalized feed: filter by mood tag and target strength
pub async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<Vec<BlendResponse>>> {
    let strength = params.strength.unwrap_or(5);
    if !(1..=10).contains(&strength) {
        return Err(AppError::InvalidInput(
            "strength must be in [1,10]".to_string(),
        ));
    }
    let mood = params.mood.as_deref().unwrap_or(recommendation::ALL_MOODS);

    let blends = state.store.load_all().await?;
    let matches = recommendation::filter_by_mood_and_strength(&blends, mood, strength);
    Ok(Json(matches.iter().map(BlendResponse::from).collect()))
}

/// Toggle the current viewer's like on a blend
pub async fn toggle_like(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BlendResponse>> {
    // The likes map write lock is held across the store update so one
    // viewer's toggles apply strictly in sequence.
    let mut likes = state.likes.write().await;
    let viewer_likes = likes.entry(viewer.id.clone()).or_default();
    let currently_liked = viewer_likes.contains(&id);

    let updated = state
        .store
        .update(
            id,
            Box::new(move |blend| recommendation::apply_like_toggle(blend, currently_liked)),
        )
        .await?;

    if currently_liked {
        viewer_likes.remove(&id);
    } else {
        viewer_likes.insert(id);
    }

    Ok(Json(BlendResponse::from(&updated)))
}

/// Catalog read shape for the builder
pub async fn list_flavors(
    State(state): State<AppState>,
    Query(params): Query<FlavorSearchParams>,
) -> Json<Vec<CatalogEntry>> {
    let catalog = state.catalog.read().await;
    Json(catalog.list_flavors(params.search.as_deref().unwrap_or("")))
}

/// Admin: add a brand to the catalog
pub async fn create_brand(
    State(state): State<AppState>,
    Json(request): Json<CreateBrandRequest>,
) -> AppResult<StatusCode> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidInput("brand name must not be empty".to_string()));
    }
    let mut catalog = state.catalog.write().await;
    // A duplicate id is a silent no-op, matching the builder rules
    match catalog.add_brand(&request.name) {
        Some(_) => Ok(StatusCode::CREATED),
        None => Ok(StatusCode::OK),
    }
}

/// Admin: add a flavor under an existing brand
pub async fn create_flavor(
    State(state): State<AppState>,
    Path(brand): Path<String>,
    Json(request): Json<CreateFlavorRequest>,
) -> AppResult<StatusCode> {
    let mut catalog = state.catalog.write().await;
    catalog.add_flavor(&brand, &request.name, request.intensity, &request.taste_tags)?;
    Ok(StatusCode::CREATED)
}

/// Admin: list moderation words
pub async fn list_moderation(State(state): State<AppState>) -> Json<Vec<String>> {
    let moderation = state.moderation.read().await;
    Json(moderation.words().map(str::to_string).collect())
}

/// Admin: add a moderation word (lowercased, trimmed) and persist the list
pub async fn add_moderation_word(
    State(state): State<AppState>,
    Json(request): Json<AddModerationWordRequest>,
) -> AppResult<(StatusCode, Json<Vec<String>>)> {
    if request.word.trim().is_empty() {
        return Err(AppError::InvalidInput("word must not be empty".to_string()));
    }
    let mut moderation = state.moderation.write().await;
    let inserted = moderation.insert(&request.word);
    if inserted {
        state.store.save_moderation(&moderation).await?;
    }
    let status = if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(moderation.words().map(str::to_string).collect())))
}

/// Admin: remove a moderation word and persist the list
pub async fn remove_moderation_word(
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let mut moderation = state.moderation.write().await;
    if !moderation.remove(&word) {
        return Err(AppError::NotFound(format!(
            "word \"{word}\" is not in the moderation list"
        )));
    }
    state.store.save_moderation(&moderation).await?;
    Ok(Json(moderation.words().map(str::to_string).collect()))
}
