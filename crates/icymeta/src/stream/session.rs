//! ICY stream session
//!
//! Opens an HTTP stream with ICY metadata enabled and exposes the body as
//! `Read`. A worker thread drives the request on its own current-thread
//! runtime and pumps the body through a bounded channel, so a reader blocked
//! on the network still notices cancellation. Dropping the session aborts the
//! worker's in-flight request and closes the connection.

use std::fmt;
use std::io::{self, Read};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use reqwest::header::HeaderValue;
use reqwest::{Client, Request, Response, StatusCode};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};
use url::Url;

use crate::cancel::{CancelToken, Cancelled};
use crate::config::network::{BODY_CHANNEL_BOUND, CANCEL_POLL_MS, USER_AGENT};
use crate::config::protocol::{METADATA_REQUEST_HEADER, METAINT_HEADER};
use crate::error::{ConnectionCause, IcyError, MetaintError, RequestCause, Result};

/// Status line and the one header we care about
struct ResponseHead {
    status: StatusCode,
    metaint: Option<HeaderValue>,
}

type Handshake = std::result::Result<ResponseHead, ConnectionCause>;
type BodyChunk = io::Result<Vec<u8>>;

/// An open ICY stream, positioned at the first audio byte.
///
/// Dropping the session releases the connection.
pub struct StreamSession {
    metadata_interval: usize,
    current_chunk: Vec<u8>,
    chunk_pos: usize,
    receiver: Receiver<BodyChunk>,
    cancel: CancelToken,
    release: Option<oneshot::Sender<()>>,
    finished: bool,
}

/// Open `url` with ICY metadata requested and read the metadata interval.
pub fn open_stream(cancel: &CancelToken, url: &str) -> Result<StreamSession> {
    let request_error = |source: RequestCause| IcyError::Request {
        url: url.to_string(),
        source,
    };
    let connection_error = |source: ConnectionCause| IcyError::Connection {
        url: url.to_string(),
        source,
    };

    let target = Url::parse(url).map_err(|e| request_error(e.into()))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(request_error(RequestCause::UnsupportedScheme(
            target.scheme().to_string(),
        )));
    }

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| request_error(e.into()))?;
    let request = client
        .get(target)
        .header(METADATA_REQUEST_HEADER, "1")
        .build()
        .map_err(|e| request_error(e.into()))?;

    cancel.check().map_err(|reason| connection_error(reason.into()))?;

    let (head_tx, head_rx) = bounded::<Handshake>(1);
    let (body_tx, body_rx) = bounded::<BodyChunk>(BODY_CHANNEL_BOUND);
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let worker_cancel = cancel.clone();

    debug!(url, "opening stream");
    thread::Builder::new()
        .name("icymeta-session".to_string())
        .spawn(move || run_session(client, request, head_tx, body_tx, worker_cancel, release_rx))
        .map_err(|e| connection_error(e.into()))?;

    // From here on, dropping `session` tears the worker down.
    let mut session = StreamSession {
        metadata_interval: 0,
        current_chunk: Vec::new(),
        chunk_pos: 0,
        receiver: body_rx,
        cancel: cancel.clone(),
        release: Some(release_tx),
        finished: false,
    };

    let head = match recv_cancellable(&head_rx, cancel) {
        Ok(Some(Ok(head))) => head,
        Ok(Some(Err(ConnectionCause::Network(err)))) if err.is_builder() => {
            return Err(request_error(err.into()))
        }
        Ok(Some(Err(cause))) => return Err(connection_error(cause)),
        Ok(None) => {
            return Err(connection_error(ConnectionCause::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "session worker exited before a response arrived",
            ))))
        }
        Err(reason) => return Err(connection_error(reason.into())),
    };

    debug!(status = %head.status, metaint = ?head.metaint, "response head received");
    session.metadata_interval = parse_metaint(head.metaint.as_ref())?;

    Ok(session)
}

/// Parse the `Icy-Metaint` header into a byte count.
pub fn parse_metaint(value: Option<&HeaderValue>) -> Result<usize> {
    let Some(value) = value else {
        return Err(IcyError::Protocol {
            value: String::new(),
            reason: MetaintError::Missing,
        });
    };

    let text = value.to_str().map_err(|_| IcyError::Protocol {
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        reason: MetaintError::NotText,
    })?;

    text.parse::<usize>().map_err(|e| IcyError::Protocol {
        value: text.to_string(),
        reason: e.into(),
    })
}

impl StreamSession {
    /// Audio bytes between consecutive metadata blocks
    pub fn metadata_interval(&self) -> usize {
        self.metadata_interval
    }

    /// Create a session from a test channel (bypasses HTTP)
    #[cfg(test)]
    pub(crate) fn from_test_channel(
        receiver: Receiver<BodyChunk>,
        metadata_interval: usize,
        cancel: CancelToken,
    ) -> (Self, oneshot::Receiver<()>) {
        let (release_tx, release_rx) = oneshot::channel();
        (
            Self {
                metadata_interval,
                current_chunk: Vec::new(),
                chunk_pos: 0,
                receiver,
                cancel,
                release: Some(release_tx),
                finished: false,
            },
            release_rx,
        )
    }
}

impl Read for StreamSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.cancel.check().map_err(Cancelled::into_io)?;

        loop {
            let remaining = self.current_chunk.len() - self.chunk_pos;
            if remaining > 0 {
                let n = buf.len().min(remaining);
                buf[..n].copy_from_slice(&self.current_chunk[self.chunk_pos..self.chunk_pos + n]);
                self.chunk_pos += n;
                if self.chunk_pos >= self.current_chunk.len() {
                    self.current_chunk = Vec::new();
                    self.chunk_pos = 0;
                }
                return Ok(n);
            }

            if self.finished {
                return Ok(0);
            }

            match recv_cancellable(&self.receiver, &self.cancel).map_err(Cancelled::into_io)? {
                Some(Ok(chunk)) => {
                    self.current_chunk = chunk;
                    self.chunk_pos = 0;
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Err(err);
                }
                None => {
                    // Worker hung up: the server closed the body.
                    self.finished = true;
                    return Ok(0);
                }
            }
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            let _ = release.send(());
        }
    }
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("metadata_interval", &self.metadata_interval)
            .field("buffered", &(self.current_chunk.len() - self.chunk_pos))
            .field("finished", &self.finished)
            .finish()
    }
}

/// Block on `receiver`, waking every `CANCEL_POLL_MS` to check `cancel`.
///
/// `Ok(None)` means the sender is gone.
fn recv_cancellable<T>(
    receiver: &Receiver<T>,
    cancel: &CancelToken,
) -> std::result::Result<Option<T>, Cancelled> {
    let poll = Duration::from_millis(CANCEL_POLL_MS);
    loop {
        cancel.check()?;
        match receiver.recv_timeout(poll) {
            Ok(value) => return Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                // The worker also stops when the token fires; report that, not EOF.
                cancel.check()?;
                return Ok(None);
            }
        }
    }
}

/// Worker: run the request on a private runtime until the body ends, fails,
/// the token fires, or the session is dropped. Leaving `block_on` drops the
/// response and the runtime, which closes the socket.
fn run_session(
    client: Client,
    request: Request,
    head_tx: Sender<Handshake>,
    body_tx: Sender<BodyChunk>,
    cancel: CancelToken,
    release: oneshot::Receiver<()>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = head_tx.send(Err(ConnectionCause::Io(err)));
            return;
        }
    };

    runtime.block_on(async move {
        tokio::select! {
            _ = released(release, &cancel) => trace!("session released"),
            _ = drive_session(client, request, &head_tx, &body_tx) => {}
        }
    });
}

/// Resolves once the session is dropped or the token fires.
async fn released(release: oneshot::Receiver<()>, cancel: &CancelToken) {
    let poll = Duration::from_millis(CANCEL_POLL_MS);
    let cancelled = async {
        while !cancel.is_cancelled() {
            tokio::time::sleep(poll).await;
        }
    };

    // A dropped sender resolves `release` with an error; either way the session is gone.
    tokio::select! {
        _ = release => {}
        _ = cancelled => {}
    }
}

async fn drive_session(
    client: Client,
    request: Request,
    head_tx: &Sender<Handshake>,
    body_tx: &Sender<BodyChunk>,
) {
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => {
            let _ = head_tx.send(Err(err.into()));
            return;
        }
    };

    let head = ResponseHead {
        status: response.status(),
        metaint: response.headers().get(METAINT_HEADER).cloned(),
    };
    if head_tx.send(Ok(head)).is_err() {
        return;
    }

    pump_body(response, body_tx).await;
}

async fn pump_body(mut response: Response, body_tx: &Sender<BodyChunk>) {
    loop {
        match response.chunk().await {
            Ok(Some(bytes)) => {
                trace!(bytes = bytes.len(), "body chunk");
                if !forward(body_tx, Ok(bytes.to_vec())).await {
                    return;
                }
            }
            Ok(None) => {
                debug!("stream body ended");
                return;
            }
            Err(err) => {
                warn!(error = %err, "stream body read failed");
                let _ = forward(body_tx, Err(io::Error::other(err))).await;
                return;
            }
        }
    }
}

/// Queue a chunk for the reader without blocking the runtime.
///
/// Returns false once the reader is gone.
async fn forward(body_tx: &Sender<BodyChunk>, mut chunk: BodyChunk) -> bool {
    let poll = Duration::from_millis(CANCEL_POLL_MS);
    loop {
        match body_tx.try_send(chunk) {
            Ok(()) => return true,
            Err(TrySendError::Full(pending)) => {
                chunk = pending;
                tokio::time::sleep(poll).await;
            }
            Err(TrySendError::Disconnected(_)) => return false,
        }
    }
}
