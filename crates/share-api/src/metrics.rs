use std::fmt::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::state::AppState;

const SESSION_STATES: [&str; 4] = ["fallback_loading", "loading", "loaded", "error"];

/// Escape a label value for the OpenMetrics text format.
fn escape_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut out = String::with_capacity(2048);

    let instances: Vec<_> = state
        .instances
        .iter()
        .map(|e| (*e.key(), Arc::clone(e.value())))
        .collect();

    // fmt::Write into a String does not fail.
    let _ = writeln!(out, "# TYPE share_player_cached_pages gauge");
    let _ = writeln!(
        out,
        "# HELP share_player_cached_pages Number of generated pages held in the route cache"
    );
    let _ = writeln!(out, "share_player_cached_pages {}", state.pages.len());

    let _ = writeln!(out, "# TYPE share_player_instances gauge");
    let _ = writeln!(
        out,
        "# HELP share_player_instances Number of live page instances"
    );
    let _ = writeln!(out, "share_player_instances {}", instances.len());

    let _ = writeln!(out, "# TYPE share_player_session_state stateset");
    let _ = writeln!(
        out,
        "# HELP share_player_session_state Playback session state per page instance"
    );
    for (id, instance) in &instances {
        let page = instance.page.lock().await;
        let current = page.session().state().to_string();
        let playback_id = escape_label(instance.playback_id.as_str());
        for variant in SESSION_STATES {
            let _ = writeln!(
                out,
                "share_player_session_state{{page_id=\"{}\",playback_id=\"{}\",state=\"{}\"}} {}",
                id,
                playback_id,
                variant,
                u8::from(current == variant)
            );
        }
    }

    let _ = writeln!(out, "# TYPE share_player_report_open gauge");
    let _ = writeln!(
        out,
        "# HELP share_player_report_open Whether the report form is open per page instance"
    );
    for (id, instance) in &instances {
        let open = instance.page.lock().await.report().is_open();
        let _ = writeln!(
            out,
            "share_player_report_open{{page_id=\"{}\"}} {}",
            id,
            u8::from(open)
        );
    }

    let _ = writeln!(out, "# TYPE share_player_playback_errors counter");
    let _ = writeln!(
        out,
        "# HELP share_player_playback_errors Player errors reported across all pages"
    );
    let _ = writeln!(
        out,
        "share_player_playback_errors_total {}",
        state.playback_errors.load(Ordering::Relaxed)
    );

    let _ = writeln!(out, "# EOF");

    (
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        out,
    )
}
