//! WebSocket Transport
//!
//! [`StreamTransport`] over `tokio-tungstenite`. Text frames are passed
//! through; close frames, end of stream and socket errors become a single
//! [`StreamFrame::Terminated`] after which the stream ends.

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::application::ports::{FrameStream, MarketDataError, StreamFrame, StreamTransport};
use crate::domain::subscription::TerminationReason;

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    /// Create a new transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<FrameStream, MarketDataError> {
        tracing::debug!(%url, "Opening WebSocket");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| MarketDataError::Stream(format!("connect failed: {e}")))?;

        Ok(into_frames(ws_stream))
    }
}

/// Map a raw message stream to [`StreamFrame`]s.
///
/// Ping/pong and binary frames are skipped; tungstenite answers pings itself.
pub fn into_frames<S>(messages: S) -> FrameStream
where
    S: Stream<Item = Result<Message, WsError>> + Send + Unpin + 'static,
{
    stream::unfold(Some(messages), |state| async move {
        let mut messages = state?;
        loop {
            let frame = match messages.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Some((StreamFrame::Text(text.as_str().to_owned()), Some(messages)));
                }
                Some(Ok(Message::Close(close))) => {
                    tracing::info!(?close, "Server sent close frame");
                    StreamFrame::Terminated(TerminationReason::NormalClose)
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => StreamFrame::Terminated(TerminationReason::Error(e.to_string())),
                None => StreamFrame::Terminated(TerminationReason::NormalClose),
            };
            return Some((frame, None));
        }
    })
    .boxed()
}
