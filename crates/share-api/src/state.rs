use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use share_core::{
    DiagnosticSink, DisplayData, GeneratedPage, OnDemandPolicy, PageCache, PageConfig,
    PlaybackId, PlaybackPage, StaticPathPolicy, TracingSink,
};

/// A live page driven remotely through the events API.
pub struct PageInstance {
    pub id: Uuid,
    pub playback_id: PlaybackId,
    pub created_at: DateTime<Utc>,
    pub page: Mutex<PlaybackPage>,
}

#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<PageCache>,
    pub instances: Arc<DashMap<Uuid, Arc<PageInstance>>>,
    pub config: PageConfig,
    pub diagnostics: Arc<dyn DiagnosticSink>,
    pub playback_errors: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_policy(Arc::new(OnDemandPolicy))
    }

    pub fn with_policy(policy: Arc<dyn StaticPathPolicy>) -> Self {
        Self {
            pages: Arc::new(PageCache::new(policy)),
            instances: Arc::new(DashMap::new()),
            config: PageConfig::default(),
            diagnostics: Arc::new(TracingSink),
            playback_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Page generator bound to this state's configuration.
    pub fn generate(&self, id: &PlaybackId) -> GeneratedPage {
        GeneratedPage::new(DisplayData::resolve(id.clone(), &self.config))
    }

    pub fn record_playback_error(&self) {
        self.playback_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Tear down and drop every live page instance.
    pub async fn teardown_all(&self) -> usize {
        let entries: Vec<_> = self
            .instances
            .iter()
            .map(|e| (*e.key(), Arc::clone(e.value())))
            .collect();

        for (id, instance) in &entries {
            instance.page.lock().await.teardown();
            self.instances.remove(id);
        }
        entries.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
