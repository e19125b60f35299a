//! Transport seam between the connection manager and the network.
//!
//! A [`FeedTransport`] opens one subscription and hands back a stream of
//! [`FeedMessage`]s. The manager owns whatever the transport returns;
//! dropping the stream closes the connection. [`HttpFeed`] is the
//! production implementation: a plain `GET` whose `text/event-stream` body
//! is decoded with [`SseDecoder`].

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::sse::{SseDecoder, SseFrame};

/// A message received on the feed, classified by SSE event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// The `connected` handshake.
    Connected,
    /// An `activity` frame carrying a raw JSON payload.
    Activity(String),
    /// Any other event name.
    Other {
        /// The unrecognised event name.
        event: String,
    },
}

impl From<SseFrame> for FeedMessage {
    fn from(frame: SseFrame) -> Self {
        match frame.event.as_str() {
            "connected" => Self::Connected,
            "activity" => Self::Activity(frame.data),
            _ => Self::Other { event: frame.event },
        }
    }
}

/// An open subscription. Ends (`None`) when the server closes the stream.
pub type FeedStream = BoxStream<'static, Result<FeedMessage, StreamError>>;

/// Something that can open a subscription to the activity feed.
pub trait FeedTransport: Send + Sync + 'static {
    /// Open a new subscription.
    fn connect(&self) -> impl Future<Output = Result<FeedStream, StreamError>> + Send;

    /// Human-readable endpoint for logging.
    fn endpoint(&self) -> &str;
}

/// Server-sent events over HTTP via `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

/// Bound on establishing the TCP/TLS connection. The response itself is a
/// long-lived stream and has no overall timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

impl HttpFeed {
    /// Create a transport for the given SSE endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self {
            client,
            url: url.into(),
        }
    }
}

impl FeedTransport for HttpFeed {
    async fn connect(&self) -> Result<FeedStream, StreamError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StreamError::Transport(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Status(status.as_u16()));
        }
        debug!(url = %self.url, "activity feed response received");

        let mut decoder = SseDecoder::new();
        let messages = response.bytes_stream().flat_map(move |chunk| {
            let batch: Vec<Result<FeedMessage, StreamError>> = match chunk {
                Ok(bytes) => decoder
                    .feed(&bytes)
                    .into_iter()
                    .map(|frame| Ok(FeedMessage::from(frame)))
                    .collect(),
                Err(e) => vec![Err(StreamError::Transport(format!(
                    "stream read failed: {e}"
                )))],
            };
            stream::iter(batch)
        });

        Ok(messages.boxed())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
