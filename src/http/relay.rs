//! Streaming relay of origin response bodies.
//!
//! `RelayBody` sits between the origin's body and the caller's connection.
//! hyper polls it for the next frame only after the previous one has been
//! written and flushed, so the relay never holds more than one origin frame
//! and runs at the pace of the slower side.
//!
//! # Termination
//! Only an explicit end-of-stream ends the relay. Zero-length data frames
//! are skipped and polling continues, so an empty chunk in a streaming
//! protocol does not truncate the response.
//!
//! # Failures
//! A read error after the status line has been sent cannot be reported as a
//! status; it is logged and handed to hyper, which aborts the connection.
//! The caller sees a truncated body under the origin's status code.

use axum::body::Bytes;
use axum::BoxError;
use hyper::body::{Body, Frame, SizeHint};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use crate::error::{ForwardError, Phase};
use crate::observability::metrics;

/// Body wrapper that re-frames origin data into bounded chunks.
pub struct RelayBody<B: Body> {
    inner: B,
    chunk_size: usize,
    pending: Bytes,
    relayed: u64,
    chunks: u64,
    started: Instant,
    finished: bool,
    request_id: String,
}

impl<B: Body> RelayBody<B> {
    pub fn new(inner: B, chunk_size: usize, request_id: impl Into<String>) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
            pending: Bytes::new(),
            relayed: 0,
            chunks: 0,
            started: Instant::now(),
            finished: false,
            request_id: request_id.into(),
        }
    }

    /// Bytes handed to the caller so far.
    pub fn relayed_bytes(&self) -> u64 {
        self.relayed
    }

    /// Nothing is left to relay. hyper never polls a body that reports end
    /// of stream up front (empty 429s, 204s, HEAD), so this can be true
    /// without `finish` having run.
    fn is_drained(&self) -> bool {
        self.finished || (self.pending.is_empty() && self.inner.is_end_stream())
    }

    fn next_chunk(&mut self) -> Frame<Bytes> {
        let take = self.pending.len().min(self.chunk_size);
        let chunk = self.pending.split_to(take);
        self.relayed += chunk.len() as u64;
        self.chunks += 1;
        Frame::data(chunk)
    }

    fn finish(&mut self) {
        self.finished = true;
        metrics::record_relayed_bytes(self.relayed);
        tracing::debug!(
            request_id = %self.request_id,
            bytes = self.relayed,
            chunks = self.chunks,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Relay complete"
        );
    }
}

impl<B> Body for RelayBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;

        if !this.pending.is_empty() {
            return Poll::Ready(Some(Ok(this.next_chunk())));
        }
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) if data.is_empty() => continue,
                    Ok(data) => {
                        this.pending = data;
                        return Poll::Ready(Some(Ok(this.next_chunk())));
                    }
                    // trailers
                    Err(frame) => return Poll::Ready(Some(Ok(frame))),
                },
                Some(Err(err)) => {
                    let err: BoxError = err.into();
                    let failure = ForwardError::Stream(err.to_string());
                    this.finished = true;
                    metrics::record_stream_failure();
                    tracing::error!(
                        request_id = %this.request_id,
                        phase = %Phase::RelayingBody,
                        bytes = this.relayed,
                        error = %failure,
                        "Origin body failed mid-relay, aborting response"
                    );
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    this.finish();
                    return Poll::Ready(None);
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.pending.is_empty() && self.is_drained()
    }

    fn size_hint(&self) -> SizeHint {
        let pending = self.pending.len() as u64;
        let inner = self.inner.size_hint();
        let mut hint = SizeHint::new();
        hint.set_lower(inner.lower() + pending);
        if let Some(upper) = inner.upper() {
            hint.set_upper(upper + pending);
        }
        hint
    }
}

impl<B: Body> Drop for RelayBody<B> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if self.is_drained() {
            self.finish();
        } else {
            // hyper drops the body when the caller goes away mid-stream
            tracing::warn!(
                request_id = %self.request_id,
                bytes = self.relayed,
                "Caller disconnected before end of stream"
            );
            metrics::record_relayed_bytes(self.relayed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{stream, Stream};
    use http_body_util::{BodyExt, Full, StreamBody};
    use std::convert::Infallible;
    use std::io;
    use std::sync::{Arc, Mutex};

    type FrameResult = Result<Frame<Bytes>, Infallible>;

    fn frames(parts: &[&'static str]) -> StreamBody<impl Stream<Item = FrameResult> + Unpin> {
        let frames: Vec<FrameResult> = parts
            .iter()
            .map(|p| Ok(Frame::data(Bytes::from_static(p.as_bytes()))))
            .collect();
        StreamBody::new(stream::iter(frames))
    }

    async fn collect_frames<B>(mut body: RelayBody<B>) -> Vec<Bytes>
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: Into<BoxError>,
    {
        let mut out = Vec::new();
        while let Some(frame) = body.frame().await {
            out.push(frame.unwrap().into_data().unwrap());
        }
        out
    }

    #[tokio::test]
    async fn frames_are_capped_at_chunk_size() {
        let body = RelayBody::new(Full::new(Bytes::from_static(b"abcdefghij")), 4, "test");
        let chunks = collect_frames(body).await;
        assert_eq!(chunks, ["abcd", "efgh", "ij"]);
    }

    #[tokio::test]
    async fn zero_length_frames_do_not_end_the_relay() {
        let origin = frames(&["data: one\n\n", "", "", "data: two\n\n"]);
        let body = RelayBody::new(origin, 1024, "test");
        let chunks = collect_frames(body).await;
        assert_eq!(chunks, ["data: one\n\n", "data: two\n\n"]);
    }

    #[tokio::test]
    async fn bytes_are_relayed_in_order() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let body = RelayBody::new(Full::new(Bytes::from(payload.clone())), 1024, "test");
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(collected.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn empty_body_ends_immediately() {
        let mut body = RelayBody::new(Full::new(Bytes::new()), 16, "test");
        assert!(body.frame().await.is_none());
        assert!(body.is_end_stream());
        assert_eq!(body.relayed_bytes(), 0);
    }

    #[tokio::test]
    async fn origin_errors_surface_after_partial_data() {
        let inner = StreamBody::new(stream::iter(vec![
            Ok(Frame::data(Bytes::from_static(b"partial"))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by origin")),
        ]));
        let mut body = RelayBody::new(inner, 1024, "test");

        let first = body.frame().await.unwrap().unwrap();
        assert_eq!(first.into_data().unwrap(), "partial");
        let err = body.frame().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "reset by origin");
        assert!(body.frame().await.is_none());
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_warnings() -> (LogCapture, tracing::subscriber::DefaultGuard) {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    #[test]
    fn unpolled_empty_body_is_not_a_disconnect() {
        let (logs, _guard) = capture_warnings();

        let body = RelayBody::new(Full::new(Bytes::new()), 16, "empty");
        assert!(body.is_end_stream());
        drop(body);

        assert!(!logs.contents().contains("Caller disconnected"), "{}", logs.contents());
    }

    #[tokio::test]
    async fn dropping_mid_stream_is_a_disconnect() {
        let (logs, _guard) = capture_warnings();

        let mut body = RelayBody::new(Full::new(Bytes::from_static(b"abcdef")), 2, "partial");
        let first = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(first, "ab");
        drop(body);

        assert!(logs.contents().contains("Caller disconnected"), "{}", logs.contents());
    }

    #[test]
    fn size_hint_tracks_inner_body() {
        let body = RelayBody::new(Full::new(Bytes::from_static(b"12345")), 2, "test");
        assert_eq!(body.size_hint().exact(), Some(5));
    }
}
