use {
    crate::Error,
    futures::{SinkExt, StreamExt},
    murmur_protocol::{
        HANDSHAKE_TIMEOUT_MS, IdentifyOk, IdentifyParams, RequestFrame, ResponseFrame, methods,
    },
    std::{path::PathBuf, sync::Arc, time::Duration},
    tokio::sync::mpsc,
    tokio_tungstenite::{Connector, connect_async_tls_with_config, tungstenite::Message},
    tracing::{debug, error, info},
};

/// Maximum reconnect backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Events sent from the connection task to the main app loop.
#[derive(Debug)]
pub enum ConnectionEvent {
    Connected(Box<IdentifyOk>),
    Disconnected,
    Error(String),
    Frame(String),
}

/// Manages the WebSocket session with the gateway: identify handshake,
/// frame forwarding, and reconnect with exponential backoff.
pub struct ConnectionManager {
    /// Send JSON text frames to the WebSocket writer task.
    write_tx: mpsc::UnboundedSender<String>,
}

impl ConnectionManager {
    /// Spawn the connection task and return immediately. Frames and lifecycle
    /// changes arrive on `event_tx`.
    pub fn spawn(
        url: String,
        identify: IdentifyParams,
        event_tx: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Self {
        let (write_tx, write_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(connection_loop(url, identify, event_tx, write_rx));

        Self { write_tx }
    }

    /// A manager with no socket behind it. Outgoing frames land on the
    /// returned receiver.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        (Self { write_tx }, write_rx)
    }

    /// Send a raw JSON string through the WebSocket.
    pub fn send_raw(&self, json: String) {
        // Fails only once the connection loop has exited.
        let _ = self.write_tx.send(json);
    }
}

/// Main connection loop with auto-reconnect.
async fn connection_loop(
    url: String,
    identify: IdentifyParams,
    event_tx: mpsc::UnboundedSender<ConnectionEvent>,
    mut write_rx: mpsc::UnboundedReceiver<String>,
) {
    let mut backoff = Duration::from_secs(1);

    loop {
        info!(url = %url, "connecting to gateway");

        match connect_and_run(&url, &identify, &event_tx, &mut write_rx).await {
            Ok(Session::Closed) => {
                debug!("connection closed cleanly");
                backoff = Duration::from_secs(1);
            },
            Ok(Session::Shutdown) => {
                debug!("app shut down, leaving connection loop");
                return;
            },
            Err(e) => {
                error!(error = %e, "connection error");
                let _ = event_tx.send(ConnectionEvent::Error(e.to_string()));
                if matches!(e, Error::Auth(_)) {
                    // A rejected token will be rejected again.
                    let _ = event_tx.send(ConnectionEvent::Disconnected);
                    return;
                }
            },
        }

        if event_tx.send(ConnectionEvent::Disconnected).is_err() {
            return;
        }

        info!(delay_ms = backoff.as_millis(), "reconnecting after delay");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// How a session that got past the handshake ended.
enum Session {
    Closed,
    Shutdown,
}

/// Extra CA bundle for self-hosted gateways with private certificates.
fn custom_ca_path() -> Option<PathBuf> {
    murmur_config::config_dir().map(|dir| dir.join("certs").join("ca.pem"))
}

/// Build a TLS connector trusting the system roots plus the optional
/// custom CA bundle.
fn build_tls_connector() -> Connector {
    let mut root_store = rustls::RootCertStore::empty();

    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = root_store.add(cert);
    }

    if let Some(ca_path) = custom_ca_path()
        && let Ok(pem_data) = std::fs::read(&ca_path)
    {
        let mut reader = std::io::BufReader::new(pem_data.as_slice());
        for cert in rustls_pemfile::certs(&mut reader).flatten() {
            let _ = root_store.add(cert);
        }
        debug!(path = %ca_path.display(), "loaded custom CA bundle");
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Connector::Rustls(Arc::new(config))
}

/// Single connection attempt: connect, identify, then forward frames.
async fn connect_and_run(
    url: &str,
    identify: &IdentifyParams,
    event_tx: &mpsc::UnboundedSender<ConnectionEvent>,
    write_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<Session, Error> {
    let connector = build_tls_connector();
    let (ws_stream, _response) =
        connect_async_tls_with_config(url, None, false, Some(connector)).await?;
    let (mut ws_sink, mut ws_reader) = ws_stream.split();

    let identify_id = uuid::Uuid::new_v4().to_string();
    let frame = RequestFrame::new(
        identify_id.clone(),
        methods::IDENTIFY,
        serde_json::to_value(identify)?,
    );
    ws_sink
        .send(Message::Text(serde_json::to_string(&frame)?.into()))
        .await?;

    let identified = wait_for_identify(&mut ws_reader, &identify_id).await?;
    info!(
        user = %identified.user.tag(),
        session = %identified.session_id,
        "identified with gateway"
    );
    let _ = event_tx.send(ConnectionEvent::Connected(Box::new(identified)));

    loop {
        tokio::select! {
            msg = ws_reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = event_tx.send(ConnectionEvent::Frame(text.to_string()));
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket closed by server");
                        return Ok(Session::Closed);
                    },
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(Error::WebSocket(e)),
                }
            },
            json = write_rx.recv() => {
                match json {
                    Some(text) => {
                        ws_sink.send(Message::Text(text.into())).await?;
                    },
                    None => {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        return Ok(Session::Shutdown);
                    },
                }
            },
        }
    }
}

/// Wait for the response to our `identify` request. Frames that arrive
/// before it are skipped.
async fn wait_for_identify(
    reader: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
    identify_id: &str,
) -> Result<IdentifyOk, Error> {
    let timeout = Duration::from_millis(HANDSHAKE_TIMEOUT_MS);

    let result = tokio::time::timeout(timeout, async {
        while let Some(msg) = reader.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Ok(frame) = serde_json::from_str::<ResponseFrame>(&text)
                        && frame.id == identify_id
                    {
                        return parse_identify_response(frame);
                    }
                },
                Ok(Message::Close(_)) => {
                    return Err(Error::Connection(
                        "server closed connection during identify".into(),
                    ));
                },
                Ok(_) => {},
                Err(e) => return Err(Error::WebSocket(e)),
            }
        }
        Err(Error::Connection("connection closed before identify".into()))
    })
    .await;

    result.unwrap_or_else(|_| Err(Error::Connection("identify timed out".into())))
}

fn parse_identify_response(frame: ResponseFrame) -> Result<IdentifyOk, Error> {
    if !frame.ok {
        let msg = frame
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| "token rejected".into());
        return Err(Error::Auth(msg));
    }
    let payload = frame
        .payload
        .ok_or_else(|| Error::Protocol("identify response missing payload".into()))?;
    Ok(serde_json::from_value(payload)?)
}
