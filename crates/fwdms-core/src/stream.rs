// ── Session event streams ──
//
// `Stream` adapter over a session's broadcast channel.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_util::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::debug;

use crate::session::SessionEvent;

/// Stream of [`SessionEvent`]s for one subscriber.
///
/// If the subscriber falls behind the channel capacity, the missed events
/// are skipped and the stream continues with the oldest retained one.
/// Ends when the session is dropped.
pub struct EventStream {
    inner: BroadcastStream<SessionEvent>,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl Stream for EventStream {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(event)) => return Poll::Ready(Some(event)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    debug!(skipped, "event subscriber lagged");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
