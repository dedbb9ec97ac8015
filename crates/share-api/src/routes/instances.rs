//! Remote-driven page instances.
//!
//! Each instance is one mounted page. Player callbacks and user actions are
//! posted as events and applied in arrival order under the instance lock.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use share_core::{
    PageEvent, PageView, PlaybackId, PlaybackPage, PlayerEvent, RouteResolution, RouteState,
    StartTimeOffset,
};

use crate::error::ApiError;
use crate::state::{AppState, PageInstance};

#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub playback_id: String,
    pub time: Option<String>,
}

#[derive(Serialize)]
pub struct PageResponse {
    pub id: Uuid,
    pub playback_id: PlaybackId,
    pub view: PageView,
}

#[derive(Serialize)]
pub struct PageSummary {
    pub id: Uuid,
    pub playback_id: PlaybackId,
    pub state: String,
    pub report_open: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct DeletePageResponse {
    pub message: String,
    pub id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", post(create_page).get(list_pages))
        .route("/pages/{id}", get(get_page).delete(delete_page))
        .route("/pages/{id}/events", post(post_event))
}

fn parse_page_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("Invalid page ID: {}", id)))
}

fn get_instance(state: &AppState, id: Uuid) -> Result<Arc<PageInstance>, ApiError> {
    state
        .instances
        .get(&id)
        .map(|r| Arc::clone(r.value()))
        .ok_or_else(|| ApiError::NotFound(format!("Page {} not found", id)))
}

/// Leave fallback once the cache holds the generated page.
fn resolve_if_ready(state: &AppState, instance: &PageInstance, page: &mut PlaybackPage) {
    if *page.route() != RouteState::Fallback {
        return;
    }
    if let Some(generated) = state.pages.get(&instance.playback_id) {
        page.resolve_route(generated.display.clone());
    }
}

/// POST /api/v1/pages
async fn create_page(
    State(state): State<AppState>,
    Json(body): Json<CreatePageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let playback_id = PlaybackId::parse(body.playback_id)?;
    let start_time = StartTimeOffset::from_query(body.time.as_deref());

    let page = match state
        .pages
        .get_or_generate(&playback_id, |id| state.generate(id))?
    {
        RouteResolution::Fallback => {
            let mut page =
                PlaybackPage::fallback(state.config.clone(), state.diagnostics.clone());
            page.set_start_time(start_time);
            page
        }
        RouteResolution::Resolved { page, .. } => PlaybackPage::resolved(
            page.display.clone(),
            start_time,
            state.config.clone(),
            state.diagnostics.clone(),
        ),
    };

    let view = page.view();
    let id = Uuid::new_v4();
    state.instances.insert(
        id,
        Arc::new(PageInstance {
            id,
            playback_id: playback_id.clone(),
            created_at: Utc::now(),
            page: Mutex::new(page),
        }),
    );
    info!(page_id = %id, playback_id = %playback_id, "Page instance created");

    Ok((
        StatusCode::CREATED,
        Json(PageResponse {
            id,
            playback_id,
            view,
        }),
    ))
}

/// GET /api/v1/pages
async fn list_pages(State(state): State<AppState>) -> Json<Vec<PageSummary>> {
    let instances: Vec<_> = state
        .instances
        .iter()
        .map(|e| Arc::clone(e.value()))
        .collect();

    let mut summaries = Vec::with_capacity(instances.len());
    for instance in instances {
        let page = instance.page.lock().await;
        summaries.push(PageSummary {
            id: instance.id,
            playback_id: instance.playback_id.clone(),
            state: page.session().state().to_string(),
            report_open: page.report().is_open(),
            created_at: instance.created_at.to_rfc3339(),
        });
    }
    Json(summaries)
}

/// GET /api/v1/pages/:id
async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    let id = parse_page_id(&id)?;
    let instance = get_instance(&state, id)?;

    let mut page = instance.page.lock().await;
    resolve_if_ready(&state, &instance, &mut page);

    Ok(Json(PageResponse {
        id,
        playback_id: instance.playback_id.clone(),
        view: page.view(),
    }))
}

/// POST /api/v1/pages/:id/events
async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<PageEvent>,
) -> Result<Json<PageResponse>, ApiError> {
    let id = parse_page_id(&id)?;
    let instance = get_instance(&state, id)?;

    let mut page = instance.page.lock().await;
    resolve_if_ready(&state, &instance, &mut page);

    if matches!(event, PageEvent::Player(PlayerEvent::Error { .. })) && page.player_mounted() {
        state.record_playback_error();
    }
    page.handle(event);

    Ok(Json(PageResponse {
        id,
        playback_id: instance.playback_id.clone(),
        view: page.view(),
    }))
}

/// DELETE /api/v1/pages/:id
async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletePageResponse>, ApiError> {
    let id = parse_page_id(&id)?;

    let (_, instance) = state
        .instances
        .remove(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Page {} not found", id)))?;

    instance.page.lock().await.teardown();
    info!(page_id = %id, "Page instance torn down");

    Ok(Json(DeletePageResponse {
        message: "Page torn down and deleted".into(),
        id,
    }))
}
