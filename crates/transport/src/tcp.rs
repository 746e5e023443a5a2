//! TCP transport: connection lifecycle management and the inbound read loop.

use std::sync::Arc;

use async_trait::async_trait;
use proto::{TransportError, TransportEvent, wire};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Client-side transport seam consumed by the session controller.
///
/// Results cover only whether the request could be issued; connection
/// outcomes and inbound data arrive asynchronously as [`TransportEvent`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Starts a connect attempt to `addr`, tearing down any existing
    /// connection first. The outcome arrives as a `Connected` or
    /// `ConnectFailed` event.
    async fn connect(&self, addr: &str) -> Result<(), TransportError>;

    /// Closes the current connection. Emits a `Disconnected` event.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Frames `cmd` for the wire and writes it to the server.
    async fn send(&self, cmd: &str) -> Result<(), TransportError>;
}

/// Shared connection state behind the transport handle.
///
/// `generation` invalidates late arrivals: a connect attempt or read loop
/// only installs/clears state if no newer connect or disconnect has happened
/// since it was spawned.
struct Inner {
    addr: String,
    writer: Option<OwnedWriteHalf>,
    reader: Option<JoinHandle<()>>,
    /// A connect attempt has been spawned and has not yet resolved.
    connecting: bool,
    generation: u64,
}

impl Inner {
    /// Drops the current connection, if any, and invalidates any pending
    /// connect attempt. Returns whether a connection existed.
    fn teardown(&mut self) -> bool {
        if let Some(handle) = self.reader.take() {
            handle.abort();
        }
        self.connecting = false;
        self.generation += 1;
        self.writer.take().is_some()
    }
}

/// TCP implementation of [`Transport`].
///
/// All connection state lives behind one async mutex; the read loop runs as
/// a spawned task and pushes events into the session's channel.
pub struct TcpTransport {
    inner: Arc<Mutex<Inner>>,
    events: mpsc::Sender<TransportEvent>,
}

impl TcpTransport {
    /// Creates a transport that publishes notifications into `events`.
    pub fn new(events: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                addr: String::new(),
                writer: None,
                reader: None,
                connecting: false,
                generation: 0,
            })),
            events,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, addr: &str) -> Result<(), TransportError> {
        let generation;
        {
            let mut inner = self.inner.lock().await;
            if inner.teardown() {
                let _ = self
                    .events
                    .send(TransportEvent::Disconnected {
                        addr: inner.addr.clone(),
                    })
                    .await;
            }
            inner.addr = addr.to_string();
            inner.connecting = true;
            generation = inner.generation;
        }

        let addr = addr.to_string();
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        tokio::spawn(async move {
            debug!(addr = %addr, "Connect attempt started");
            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    let (read_half, write_half) = stream.into_split();
                    let mut guard = inner.lock().await;
                    if guard.generation != generation {
                        // Superseded by a newer connect/disconnect.
                        debug!(addr = %addr, "Connect attempt superseded");
                        return;
                    }
                    guard.connecting = false;
                    guard.writer = Some(write_half);
                    guard.reader = Some(tokio::spawn(read_loop(
                        read_half,
                        events.clone(),
                        addr.clone(),
                        Arc::clone(&inner),
                        generation,
                    )));
                    drop(guard);
                    info!(addr = %addr, "Connected");
                    let _ = events.send(TransportEvent::Connected { addr }).await;
                }
                Err(e) => {
                    let mut guard = inner.lock().await;
                    if guard.generation != generation {
                        // Superseded by a newer connect/disconnect.
                        debug!(addr = %addr, "Connect attempt superseded");
                        return;
                    }
                    guard.connecting = false;
                    drop(guard);
                    warn!(addr = %addr, error = %e, "Connect attempt failed");
                    let _ = events
                        .send(TransportEvent::ConnectFailed {
                            addr,
                            reason: e.to_string(),
                        })
                        .await;
                }
            }
        });

        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        let was_connecting = inner.connecting;
        let had_connection = inner.teardown();
        if !had_connection && !was_connecting {
            return Err(TransportError::NotConnected);
        }
        let addr = inner.addr.clone();
        drop(inner);
        if had_connection {
            info!(addr = %addr, "Disconnected (local request)");
            let _ = self.events.send(TransportEvent::Disconnected { addr }).await;
        } else {
            // Cancelled a pending attempt; its task resolves silently.
            debug!(addr = %addr, "Pending connect attempt cancelled");
        }
        Ok(())
    }

    async fn send(&self, cmd: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        let Some(writer) = inner.writer.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        let framed = wire::frame_command(cmd);
        if let Err(e) = writer.write_all(framed.as_bytes()).await {
            // A failed write means the connection is gone.
            inner.teardown();
            let addr = inner.addr.clone();
            drop(inner);
            warn!(addr = %addr, error = %e, "Write failed, dropping connection");
            let _ = self.events.send(TransportEvent::Disconnected { addr }).await;
            return Err(TransportError::Send(e.to_string()));
        }
        debug!(bytes = framed.len(), "Command sent");
        Ok(())
    }
}

/// Reads inbound bytes until EOF or error, splitting them into delimited
/// payloads and publishing one `Received` event per payload.
async fn read_loop(
    mut read_half: tokio::net::tcp::OwnedReadHalf,
    events: mpsc::Sender<TransportEvent>,
    addr: String,
    inner: Arc<Mutex<Inner>>,
    generation: u64,
) {
    let mut buf = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        match read_half.read(&mut buf).await {
            Ok(0) => {
                debug!(addr = %addr, "Peer closed connection");
                break;
            }
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                for payload in drain_payloads(&mut pending) {
                    if events
                        .send(TransportEvent::Received { payload })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(addr = %addr, error = %e, "Read failed");
                break;
            }
        }
    }

    let mut guard = inner.lock().await;
    if guard.generation == generation {
        guard.writer = None;
        guard.reader = None;
        guard.generation += 1;
        drop(guard);
        let _ = events.send(TransportEvent::Disconnected { addr }).await;
    }
}

/// Splits complete delimited payloads out of `pending`, leaving any trailing
/// partial payload in place for the next read. The split happens at the byte
/// level so a multibyte character straddling a read boundary stays intact;
/// only complete payloads are converted to text.
fn drain_payloads(pending: &mut Vec<u8>) -> Vec<String> {
    let delimiter = wire::MESSAGE_DELIMITER.as_bytes();
    let mut payloads = Vec::new();
    while let Some(pos) = find_delimiter(pending, delimiter) {
        let chunk: Vec<u8> = pending.drain(..pos + delimiter.len()).collect();
        let payload = String::from_utf8_lossy(&chunk[..pos]).into_owned();
        if !payload.is_empty() {
            payloads.push(payload);
        }
    }
    payloads
}

fn find_delimiter(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_payloads_splits_on_delimiter() {
        let mut pending = b"one;;;two;;;".to_vec();
        assert_eq!(drain_payloads(&mut pending), vec!["one", "two"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn drain_payloads_keeps_trailing_partial() {
        let mut pending = b"one;;;partial".to_vec();
        assert_eq!(drain_payloads(&mut pending), vec!["one"]);
        assert_eq!(pending, b"partial");

        pending.extend_from_slice(b";;;");
        assert_eq!(drain_payloads(&mut pending), vec!["partial"]);
    }

    #[test]
    fn drain_payloads_skips_empty_chunks() {
        let mut pending = b";;;;;;data;;;".to_vec();
        assert_eq!(drain_payloads(&mut pending), vec!["data"]);
    }

    #[test]
    fn multibyte_char_split_across_reads_stays_intact() {
        let bytes = "färg;;;".as_bytes();
        // Split inside the two-byte 'ä'.
        let mut pending = bytes[..2].to_vec();
        assert!(drain_payloads(&mut pending).is_empty());

        pending.extend_from_slice(&bytes[2..]);
        assert_eq!(drain_payloads(&mut pending), vec!["färg"]);
    }

    #[tokio::test]
    async fn send_without_connection_is_rejected() {
        let (tx, _rx) = mpsc::channel(8);
        let transport = TcpTransport::new(tx);
        let err = transport.send("color 255").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_rejected() {
        let (tx, _rx) = mpsc::channel(8);
        let transport = TcpTransport::new(tx);
        let err = transport.disconnect().await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn disconnect_while_connecting_cancels_the_attempt() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();

        let (tx, mut rx) = mpsc::channel(8);
        let transport = TcpTransport::new(tx);
        transport.connect(&addr).await.expect("issue connect");
        transport.disconnect().await.expect("cancel pending attempt");

        // The cancelled attempt resolves silently; a fresh connect must not
        // be blocked by it, and its outcome is the first event delivered.
        transport.connect(&addr).await.expect("issue connect");
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("an event should arrive")
            .expect("channel open");
        assert_eq!(event, TransportEvent::Connected { addr });
    }

    #[tokio::test]
    async fn superseded_failed_attempt_emits_nothing() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let live = listener.local_addr().expect("addr").to_string();

        let (tx, mut rx) = mpsc::channel(8);
        let transport = TcpTransport::new(tx);
        // Port 1 on localhost is essentially never listening; supersede the
        // attempt before it can resolve.
        transport.connect("127.0.0.1:1").await.expect("issue connect");
        transport.connect(&live).await.expect("issue connect");

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("an event should arrive")
            .expect("channel open");
        assert_eq!(event, TransportEvent::Connected { addr: live });
    }

    #[tokio::test]
    async fn connect_failure_emits_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let transport = TcpTransport::new(tx);
        // Port 1 on localhost is essentially never listening.
        transport.connect("127.0.0.1:1").await.expect("issue connect");
        match rx.recv().await {
            Some(TransportEvent::ConnectFailed { addr, .. }) => {
                assert_eq!(addr, "127.0.0.1:1");
            }
            other => panic!("expected ConnectFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_send_receive_roundtrip() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();

        let (tx, mut rx) = mpsc::channel(8);
        let transport = TcpTransport::new(tx);
        transport.connect(&addr).await.expect("issue connect");

        let (mut server_side, _) = listener.accept().await.expect("accept");
        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::Connected { addr: addr.clone() })
        );

        transport.send("strip info").await.expect("send");
        let mut buf = vec![0u8; 64];
        let n = server_side.read(&mut buf).await.expect("server read");
        assert_eq!(&buf[..n], b"CMD :strip info");

        server_side
            .write_all(b"hello;;;")
            .await
            .expect("server write");
        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::Received {
                payload: "hello".into()
            })
        );

        drop(server_side);
        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::Disconnected { addr })
        );
    }
}
