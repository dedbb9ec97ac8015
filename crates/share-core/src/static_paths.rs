//! Static-generation contract and the on-demand page cache.
//!
//! No page is built ahead of time. The first request for an id generates the
//! page synchronously and stores it; every later request is served from the
//! cache. A request that races an in-flight generation gets the fallback
//! placeholder instead of blocking.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::poster::{DisplayData, PlaybackId};
use crate::start_time::StartTimeOffset;

/// Decides which ids exist before the first request.
pub trait StaticPathPolicy: Send + Sync {
    fn enumerate_prebuilt_ids(&self) -> Vec<PlaybackId>;

    fn allow_on_demand_generation(&self) -> bool;
}

/// Nothing prebuilt, everything generated on first request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnDemandPolicy;

impl StaticPathPolicy for OnDemandPolicy {
    fn enumerate_prebuilt_ids(&self) -> Vec<PlaybackId> {
        Vec::new()
    }

    fn allow_on_demand_generation(&self) -> bool {
        true
    }
}

/// Wire form of the contract handed to the hosting framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPaths {
    pub paths: Vec<PlaybackId>,
    pub fallback: bool,
}

impl StaticPaths {
    pub fn from_policy(policy: &dyn StaticPathPolicy) -> Self {
        Self {
            paths: policy.enumerate_prebuilt_ids(),
            fallback: policy.allow_on_demand_generation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("No page for playback id {0}")]
    NotFound(String),
}

/// A page artifact stored in the cache.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPage {
    pub display: DisplayData,
    pub generated_at: DateTime<Utc>,
    pub etag: String,
}

impl GeneratedPage {
    pub fn new(display: DisplayData) -> Self {
        let etag = compute_etag(&display);
        Self {
            display,
            generated_at: Utc::now(),
            etag,
        }
    }

    /// Validator for one rendering of this page. The body also depends on the
    /// start offset and on the submission date in the snippet.
    pub fn variant_etag(&self, start_time: StartTimeOffset, date: NaiveDate) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.etag.as_bytes());
        hasher.update(start_time.seconds().to_bits().to_be_bytes());
        hasher.update(date.to_string().as_bytes());
        format!("\"{}\"", hex::encode(&hasher.finalize()[..16]))
    }
}

fn compute_etag(display: &DisplayData) -> String {
    let mut hasher = Sha256::new();
    hasher.update(display.playback_id.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(display.poster.as_bytes());
    hasher.update([0]);
    hasher.update(display.share_url.as_bytes());
    format!("\"{}\"", hex::encode(&hasher.finalize()[..16]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub enum RouteResolution {
    /// Generation for this id is still in flight.
    Fallback,
    Resolved {
        page: Arc<GeneratedPage>,
        cache: CacheStatus,
    },
}

#[derive(Debug)]
enum Slot {
    Pending,
    Ready(Arc<GeneratedPage>),
}

/// Cache-on-miss store of generated pages, keyed by playback id.
pub struct PageCache {
    pages: DashMap<PlaybackId, Slot>,
    policy: Arc<dyn StaticPathPolicy>,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl PageCache {
    pub fn new(policy: Arc<dyn StaticPathPolicy>) -> Self {
        Self {
            pages: DashMap::new(),
            policy,
        }
    }

    /// Generate every prebuilt id up front.
    pub fn prebuild(&self, generate: impl Fn(&PlaybackId) -> GeneratedPage) -> usize {
        let ids = self.policy.enumerate_prebuilt_ids();
        for id in &ids {
            self.pages
                .insert(id.clone(), Slot::Ready(Arc::new(generate(id))));
        }
        info!(count = ids.len(), "Prebuilt pages");
        ids.len()
    }

    pub fn policy(&self) -> &dyn StaticPathPolicy {
        self.policy.as_ref()
    }

    /// Look up a generated page without generating it.
    pub fn get(&self, id: &PlaybackId) -> Option<Arc<GeneratedPage>> {
        match self.pages.get(id)?.value() {
            Slot::Ready(page) => Some(Arc::clone(page)),
            Slot::Pending => None,
        }
    }

    pub fn is_pending(&self, id: &PlaybackId) -> bool {
        matches!(self.pages.get(id).as_deref(), Some(Slot::Pending))
    }

    /// Number of pages that finished generating.
    pub fn len(&self) -> usize {
        self.pages
            .iter()
            .filter(|e| matches!(e.value(), Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serve a hit, or generate synchronously on a miss and store the result.
    pub fn get_or_generate(
        &self,
        id: &PlaybackId,
        generate: impl FnOnce(&PlaybackId) -> GeneratedPage,
    ) -> Result<RouteResolution, RouteError> {
        match self.pages.entry(id.clone()) {
            Entry::Occupied(entry) => {
                return Ok(match entry.get() {
                    Slot::Ready(page) => RouteResolution::Resolved {
                        page: Arc::clone(page),
                        cache: CacheStatus::Hit,
                    },
                    Slot::Pending => {
                        debug!(playback_id = %id, "Generation in flight, serving fallback");
                        RouteResolution::Fallback
                    }
                });
            }
            Entry::Vacant(entry) => {
                if !self.policy.allow_on_demand_generation() {
                    return Err(RouteError::NotFound(id.to_string()));
                }
                entry.insert(Slot::Pending);
            }
        }

        // The entry guard is released above so concurrent lookups see Pending.
        let guard = PendingGuard {
            pages: &self.pages,
            id,
            armed: true,
        };
        let page = Arc::new(generate(id));
        guard.complete(Arc::clone(&page));

        info!(playback_id = %id, etag = %page.etag, "Generated page on demand");
        Ok(RouteResolution::Resolved {
            page,
            cache: CacheStatus::Miss,
        })
    }

    /// Reserve `id` as in flight, e.g. for a generator running elsewhere.
    /// Returns false if the id already has a slot.
    pub fn mark_pending(&self, id: &PlaybackId) -> bool {
        match self.pages.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Slot::Pending);
                true
            }
        }
    }

    /// Store a page produced outside [`get_or_generate`](Self::get_or_generate),
    /// replacing a pending reservation if there is one.
    pub fn complete(&self, page: GeneratedPage) -> Arc<GeneratedPage> {
        let page = Arc::new(page);
        self.pages.insert(
            page.display.playback_id.clone(),
            Slot::Ready(Arc::clone(&page)),
        );
        page
    }
}

/// Clears a Pending slot if generation unwinds before completing.
struct PendingGuard<'a> {
    pages: &'a DashMap<PlaybackId, Slot>,
    id: &'a PlaybackId,
    armed: bool,
}

impl PendingGuard<'_> {
    fn complete(mut self, page: Arc<GeneratedPage>) {
        self.pages.insert(self.id.clone(), Slot::Ready(page));
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pages.remove(self.id);
        }
    }
}
