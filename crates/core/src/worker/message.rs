//! Messages posted to the worker by its clients.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LifecycleSignal, ServiceWorker};
use crate::Error;
use crate::cache::CacheStorage;
use crate::network::Network;

/// A message payload the worker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Message {
    /// Activate a waiting worker immediately.
    SkipWaiting,
    /// Fetch every manifest resource not yet cached.
    DownloadOffline,
}

impl FromStr for Message {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "skipWaiting" | "skip-waiting" | "skip_waiting" => Ok(Message::SkipWaiting),
            "downloadOffline" | "download-offline" | "download_offline" => Ok(Message::DownloadOffline),
            other => Err(Error::UnknownMessage(other.to_string())),
        }
    }
}

/// Result of handling a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    SkippedWaiting,
    Downloaded { fetched: Vec<String> },
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    pub async fn handle_message(&self, message: Message) -> Result<MessageOutcome, Error> {
        tracing::debug!(?message, "message received");
        match message {
            Message::SkipWaiting => {
                self.emit(LifecycleSignal::SkipWaiting);
                Ok(MessageOutcome::SkippedWaiting)
            }
            Message::DownloadOffline => {
                let fetched = self.download_offline().await?;
                Ok(MessageOutcome::Downloaded { fetched })
            }
        }
    }
}
