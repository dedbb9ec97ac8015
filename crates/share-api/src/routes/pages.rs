//! The shareable page route and the static-generation contract.

use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use share_core::{
    render_html, PlaybackId, PlaybackPage, RouteResolution, StartTimeOffset, StaticPaths,
};

use crate::error::ApiError;
use crate::state::AppState;

pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-page-cache");

/// First `time` value of the query; later repeats are ignored.
fn time_param(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "time")
        .map(|(_, value)| value.as_str())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v/{id}", get(show_page))
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/static-paths", get(static_paths))
}

/// GET /api/v1/static-paths
async fn static_paths(State(state): State<AppState>) -> Json<StaticPaths> {
    Json(StaticPaths::from_policy(state.pages.policy()))
}

/// GET /v/:id
async fn show_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = PlaybackId::parse(id).map_err(|e| ApiError::NotFound(e.to_string()))?;
    let start_time = StartTimeOffset::from_query(time_param(&params));

    let resolution = state.pages.get_or_generate(&id, |id| state.generate(id))?;

    let (generated, cache) = match resolution {
        RouteResolution::Fallback => {
            let page = PlaybackPage::fallback(state.config.clone(), state.diagnostics.clone());
            let html = render_html(&page.view());
            return Ok((
                [(CACHE_CONTROL, HeaderValue::from_static("no-store"))],
                Html(html),
            )
                .into_response());
        }
        RouteResolution::Resolved { page, cache } => (page, cache),
    };

    let today = Utc::now().date_naive();
    let etag = generated.variant_etag(start_time, today);
    let etag_value =
        HeaderValue::from_str(&etag).map_err(|e| ApiError::Internal(e.to_string()))?;
    let cache_value = HeaderValue::from_static(cache.as_str());

    let not_modified = headers
        .get(IF_NONE_MATCH)
        .is_some_and(|v| v.as_bytes() == etag.as_bytes());
    if not_modified {
        return Ok((
            StatusCode::NOT_MODIFIED,
            [(ETAG, etag_value), (CACHE_STATUS_HEADER, cache_value)],
        )
            .into_response());
    }

    let page = PlaybackPage::resolved(
        generated.display.clone(),
        start_time,
        state.config.clone(),
        state.diagnostics.clone(),
    );
    let html = render_html(&page.view_on(today));

    Ok((
        [(ETAG, etag_value), (CACHE_STATUS_HEADER, cache_value)],
        Html(html),
    )
        .into_response())
}
