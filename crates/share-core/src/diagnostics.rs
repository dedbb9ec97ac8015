//! Diagnostic sink for raw player failures.
//!
//! The user only ever sees a fixed message; the untouched event detail goes
//! here. [`TracingSink`] logs it, [`ChannelSink`] pushes it through an mpsc
//! channel for whoever wants to collect it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::error;

use crate::poster::PlaybackId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDiagnostic {
    pub playback_id: PlaybackId,
    pub timestamp: DateTime<Utc>,
    /// The player's error event, exactly as received.
    pub detail: serde_json::Value,
}

impl PlayerDiagnostic {
    pub fn new(playback_id: PlaybackId, detail: serde_json::Value) -> Self {
        Self {
            playback_id,
            timestamp: Utc::now(),
            detail,
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn player_error(&self, diagnostic: PlayerDiagnostic);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn player_error(&self, diagnostic: PlayerDiagnostic) {
        error!(
            playback_id = %diagnostic.playback_id,
            detail = %diagnostic.detail,
            "Error"
        );
    }
}

#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PlayerDiagnostic>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<PlayerDiagnostic>) -> Self {
        Self { tx }
    }
}

impl DiagnosticSink for ChannelSink {
    fn player_error(&self, diagnostic: PlayerDiagnostic) {
        // A closed receiver only means nobody is collecting any more.
        let _ = self.tx.send(diagnostic);
    }
}

pub fn diagnostic_channel() -> (ChannelSink, mpsc::UnboundedReceiver<PlayerDiagnostic>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_detail_unchanged() {
        let (sink, mut rx) = diagnostic_channel();
        let detail = serde_json::json!({ "code": 4, "message": "MEDIA_ERR_SRC_NOT_SUPPORTED" });
        sink.player_error(PlayerDiagnostic::new(
            PlaybackId::parse("abc").unwrap(),
            detail.clone(),
        ));

        let got = rx.try_recv().unwrap();
        assert_eq!(got.playback_id.as_str(), "abc");
        assert_eq!(got.detail, detail);
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = diagnostic_channel();
        drop(rx);
        sink.player_error(PlayerDiagnostic::new(
            PlaybackId::parse("abc").unwrap(),
            serde_json::Value::Null,
        ));
    }
}
