use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Title shown once the route has resolved.
pub const DEFAULT_META_TITLE: &str = "Remotion Showcase Upload";

/// Title shown while the page is still being generated.
pub const FALLBACK_META_TITLE: &str = "View this video";

/// Configuration shared by every page instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Public origin used to build share links, stored without a trailing slash.
    pub host_url: String,
    /// `<title>` of a resolved page.
    pub meta_title: String,
    /// How long the "copied" affordance stays visible (default: 2000ms).
    pub copy_reset: Duration,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            host_url: "http://localhost:8080".into(),
            meta_title: DEFAULT_META_TITLE.into(),
            copy_reset: Duration::from_millis(2000),
        }
    }
}

impl PageConfig {
    pub fn with_host_url(mut self, host_url: impl Into<String>) -> Self {
        let host_url = host_url.into();
        self.host_url = host_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_meta_title(mut self, title: impl Into<String>) -> Self {
        self.meta_title = title.into();
        self
    }

    pub fn with_copy_reset(mut self, ms: u64) -> Self {
        self.copy_reset = Duration::from_millis(ms);
        self
    }
}
