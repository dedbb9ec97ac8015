//! Display data derived from a playback id.
//!
//! Both URLs are pure functions of the id. The poster template is consumed by
//! link unfurlers and must keep its exact shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PageConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Playback id must not be empty")]
pub struct InvalidPlaybackId;

/// Opaque key naming a remote video resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaybackId(String);

impl PlaybackId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidPlaybackId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidPlaybackId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlaybackId {
    type Error = InvalidPlaybackId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PlaybackId> for String {
    fn from(id: PlaybackId) -> Self {
        id.0
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn poster_url(id: &PlaybackId) -> String {
    format!("https://image.mux.com/{}/thumbnail.png", id)
}

pub fn share_url(host_url: &str, id: &PlaybackId) -> String {
    format!("{}/v/{}", host_url, id)
}

/// Everything a resolved page needs to render before the player reports in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayData {
    pub playback_id: PlaybackId,
    pub poster: String,
    pub share_url: String,
}

impl DisplayData {
    pub fn resolve(id: PlaybackId, config: &PageConfig) -> Self {
        Self {
            poster: poster_url(&id),
            share_url: share_url(&config.host_url, &id),
            playback_id: id,
        }
    }
}
