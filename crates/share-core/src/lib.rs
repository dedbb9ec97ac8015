#![forbid(unsafe_code)]

pub mod config;
pub mod diagnostics;
pub mod page;
pub mod poster;
pub mod presentation;
pub mod render;
pub mod report;
pub mod session;
pub mod snippet;
pub mod start_time;
pub mod static_paths;

pub use config::PageConfig;
pub use diagnostics::{
    diagnostic_channel, ChannelSink, DiagnosticSink, PlayerDiagnostic, TracingSink,
};
pub use page::{
    PageEvent, PageView, PlaybackPage, PlayerView, ReportAction, ReportFormView, RouteState,
};
pub use poster::{poster_url, share_url, DisplayData, InvalidPlaybackId, PlaybackId};
pub use presentation::present_error;
pub use render::render_html;
pub use report::{DeferredTimer, ReportFlowController, TimerError};
pub use session::{
    transition, PlaybackSession, PlaybackUnavailable, PlayerEvent, SessionState, VideoSize,
};
pub use snippet::showcase_snippet;
pub use start_time::StartTimeOffset;
pub use static_paths::{
    CacheStatus, GeneratedPage, OnDemandPolicy, PageCache, RouteError, RouteResolution,
    StaticPathPolicy, StaticPaths,
};
