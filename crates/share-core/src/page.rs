//! One page instance: route state, playback session and report flow.
//!
//! The player is mounted exactly when the route has resolved and the report
//! form is closed. Opening the report unmounts the player; closing it
//! remounts the player, which resets the session to LOADING.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{PageConfig, FALLBACK_META_TITLE};
use crate::diagnostics::DiagnosticSink;
use crate::poster::{DisplayData, PlaybackId};
use crate::presentation::present_error;
use crate::report::ReportFlowController;
use crate::session::{PlaybackSession, PlayerEvent, SessionState, VideoSize};
use crate::snippet::showcase_snippet;
use crate::start_time::StartTimeOffset;

pub const FALLBACK_LOADING_TEXT: &str = "Loading player...";
pub const LOADING_TEXT: &str = "Loading player";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteState {
    Fallback,
    Resolved(DisplayData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportAction {
    OpenReport,
    CloseReport,
    ToggleReport,
    CopyShareLink,
}

/// Anything that can happen to a page after it is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageEvent {
    Player(PlayerEvent),
    Report(ReportAction),
}

impl From<PlayerEvent> for PageEvent {
    fn from(event: PlayerEvent) -> Self {
        Self::Player(event)
    }
}

impl From<ReportAction> for PageEvent {
    fn from(action: ReportAction) -> Self {
        Self::Report(action)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub playback_id: PlaybackId,
    pub poster: String,
    pub start_time: StartTimeOffset,
}

/// Data handed to the report-form collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFormView {
    pub playback_id: PlaybackId,
    /// Event that closes the form again.
    pub close: ReportAction,
}

/// Everything the page renders for its current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub state: SessionState,
    pub meta_title: String,
    pub image: Option<String>,
    pub centered: bool,
    pub loading_text: Option<&'static str>,
    pub error_banner: Option<String>,
    pub player: Option<PlayerView>,
    /// The content wrapper stays hidden until the player is ready.
    pub content_visible: bool,
    pub report_toggle: Option<&'static str>,
    pub report_form: Option<ReportFormView>,
    pub share_url: Option<String>,
    pub copied: bool,
    pub size: Option<VideoSize>,
    pub snippet: Option<String>,
}

pub struct PlaybackPage {
    route: RouteState,
    start_time: StartTimeOffset,
    session: PlaybackSession,
    report: ReportFlowController,
    config: PageConfig,
}

impl fmt::Debug for PlaybackPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackPage")
            .field("route", &self.route)
            .field("start_time", &self.start_time)
            .field("session", &self.session)
            .field("report", &self.report)
            .finish()
    }
}

impl PlaybackPage {
    pub fn fallback(config: PageConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            route: RouteState::Fallback,
            start_time: StartTimeOffset::default(),
            session: PlaybackSession::pending(sink),
            report: ReportFlowController::new(),
            config,
        }
    }

    pub fn resolved(
        display: DisplayData,
        start_time: StartTimeOffset,
        config: PageConfig,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let mut page = Self::fallback(config, sink);
        page.start_time = start_time;
        page.resolve_route(display);
        page
    }

    /// Leave fallback once generation for the route has finished.
    pub fn resolve_route(&mut self, display: DisplayData) {
        if let RouteState::Resolved(current) = &self.route {
            debug!(playback_id = %current.playback_id, "Route already resolved");
            return;
        }
        self.session.resolve(display.playback_id.clone());
        if self.report.is_open() {
            self.session.unmount();
        }
        self.route = RouteState::Resolved(display);
    }

    pub fn route(&self) -> &RouteState {
        &self.route
    }

    pub fn playback_id(&self) -> Option<&PlaybackId> {
        match &self.route {
            RouteState::Resolved(d) => Some(&d.playback_id),
            RouteState::Fallback => None,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn report(&self) -> &ReportFlowController {
        &self.report
    }

    pub fn set_start_time(&mut self, start_time: StartTimeOffset) {
        self.start_time = start_time;
    }

    pub fn is_torn_down(&self) -> bool {
        self.report.is_disposed()
    }

    pub fn player_mounted(&self) -> bool {
        self.session.is_mounted()
    }

    pub fn handle(&mut self, event: PageEvent) {
        if self.is_torn_down() {
            debug!(?event, "Ignoring event after teardown");
            return;
        }
        match event {
            PageEvent::Player(event) => {
                self.session.handle(event);
            }
            PageEvent::Report(action) => self.handle_report(action),
        }
    }

    fn handle_report(&mut self, action: ReportAction) {
        if self.route == RouteState::Fallback {
            debug!(?action, "Ignoring report action during fallback");
            return;
        }
        match action {
            ReportAction::OpenReport => self.open_report(),
            ReportAction::CloseReport => self.close_report(),
            ReportAction::ToggleReport => {
                if self.report.is_open() {
                    self.close_report();
                } else {
                    self.open_report();
                }
            }
            ReportAction::CopyShareLink => {
                if let Err(e) = self.report.copy_share_link(self.config.copy_reset) {
                    warn!(error = %e, "Could not schedule clipboard reset");
                }
            }
        }
    }

    fn open_report(&mut self) {
        self.report.open();
        self.session.unmount();
    }

    fn close_report(&mut self) {
        self.report.close();
        self.session.remount();
    }

    /// Release owned resources before the instance is discarded.
    pub fn teardown(&mut self) {
        self.report.dispose_on_teardown();
        self.session.unmount();
    }

    pub fn view(&self) -> PageView {
        self.view_on(Utc::now().date_naive())
    }

    /// The view as rendered on `today`, which dates the showcase snippet.
    pub fn view_on(&self, today: NaiveDate) -> PageView {
        let display = match &self.route {
            RouteState::Fallback => return self.fallback_view(),
            RouteState::Resolved(display) => display,
        };

        let state = self.session.state().clone();
        let loading = state.is_loading();
        let error_banner = state
            .error_message()
            .map(|msg| present_error(Some(msg)).to_string());

        let player = (self.session.is_mounted() && error_banner.is_none()).then(|| PlayerView {
            playback_id: display.playback_id.clone(),
            poster: display.poster.clone(),
            start_time: self.start_time,
        });

        let report_form = self.report.is_open().then(|| ReportFormView {
            playback_id: display.playback_id.clone(),
            close: ReportAction::CloseReport,
        });

        let size = self.session.size();

        PageView {
            content_visible: state == SessionState::Loaded,
            state,
            meta_title: self.config.meta_title.clone(),
            image: Some(display.poster.clone()),
            centered: loading,
            loading_text: loading.then_some(LOADING_TEXT),
            error_banner,
            player,
            report_toggle: (!self.report.is_open()).then(|| self.report.toggle_label()),
            report_form,
            share_url: Some(display.share_url.clone()),
            copied: self.report.is_copied(),
            size,
            snippet: Some(showcase_snippet(
                &display.playback_id,
                size,
                today,
            )),
        }
    }

    fn fallback_view(&self) -> PageView {
        PageView {
            state: SessionState::FallbackLoading,
            meta_title: FALLBACK_META_TITLE.to_string(),
            image: None,
            centered: true,
            loading_text: Some(FALLBACK_LOADING_TEXT),
            error_banner: None,
            player: None,
            content_visible: false,
            report_toggle: None,
            report_form: None,
            share_url: None,
            copied: false,
            size: None,
            snippet: None,
        }
    }
}

impl Drop for PlaybackPage {
    fn drop(&mut self) {
        self.teardown();
    }
}
