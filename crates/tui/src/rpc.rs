use {
    crate::{Error, connection::ConnectionManager},
    murmur_protocol::{RPC_TIMEOUT_MS, RequestFrame, ResponseFrame},
    serde::{Serialize, de::DeserializeOwned},
    std::{collections::HashMap, sync::Arc, time::Duration},
    tokio::sync::{Mutex, oneshot},
};

/// Timeout for individual RPC calls.
const RPC_TIMEOUT: Duration = Duration::from_millis(RPC_TIMEOUT_MS);

type Pending = HashMap<String, oneshot::Sender<ResponseFrame>>;

/// Correlates RPC request/response pairs by ID.
pub struct RpcClient {
    connection: Arc<ConnectionManager>,
    pending: Arc<Mutex<Pending>>,
}

impl RpcClient {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self {
            connection,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Send an RPC request and wait for the matching response payload.
    pub async fn call(
        &self,
        method: &str,
        params: &impl Serialize,
    ) -> Result<serde_json::Value, Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let frame = RequestFrame::new(id.clone(), method, serde_json::to_value(params)?);
        let json = serde_json::to_string(&frame)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);
        self.connection.send_raw(json);

        match tokio::time::timeout(RPC_TIMEOUT, rx).await {
            Ok(Ok(response)) if response.ok => {
                Ok(response.payload.unwrap_or(serde_json::Value::Null))
            },
            Ok(Ok(response)) => Err(Error::Protocol(
                response
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| format!("'{method}' failed")),
            )),
            Ok(Err(_)) => {
                self.pending.lock().await.remove(&id);
                Err(Error::Connection(format!(
                    "connection closed during '{method}'"
                )))
            },
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(Error::Connection(format!(
                    "'{method}' timed out after {}s",
                    RPC_TIMEOUT.as_secs()
                )))
            },
        }
    }

    /// [`call`](Self::call), decoding the payload into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &impl Serialize,
    ) -> Result<T, Error> {
        let payload = self.call(method, params).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Called by the frame forwarder when a response frame arrives.
    /// Routes it to the waiting `call()` if one exists.
    pub async fn resolve_response(&self, frame: ResponseFrame) {
        if let Some(tx) = self.pending.lock().await.remove(&frame.id) {
            // The caller may have timed out and dropped the receiver.
            let _ = tx.send(frame);
        }
    }

    /// Fail every in-flight call. Used when the socket drops, since no
    /// response can arrive on a new connection.
    pub async fn fail_pending(&self) {
        self.pending.lock().await.clear();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, murmur_protocol::ErrorShape, serde_json::json};

    fn client() -> (Arc<RpcClient>, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let (connection, written) = ConnectionManager::detached();
        (Arc::new(RpcClient::new(Arc::new(connection))), written)
    }

    async fn sent_frame(written: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> RequestFrame {
        let text = written.recv().await.unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn response_is_routed_to_caller() {
        let (rpc, mut written) = client();

        let caller = {
            let rpc = Arc::clone(&rpc);
            tokio::spawn(async move {
                rpc.request::<Vec<u64>>("messages.list", &json!({"channelId": 1}))
                    .await
            })
        };

        let frame = sent_frame(&mut written).await;
        assert_eq!(frame.method, "messages.list");
        rpc.resolve_response(ResponseFrame::ok(frame.id, json!([3, 2, 1])))
            .await;

        assert_eq!(caller.await.unwrap().unwrap(), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn error_response_becomes_protocol_error() {
        let (rpc, mut written) = client();

        let caller = {
            let rpc = Arc::clone(&rpc);
            tokio::spawn(async move { rpc.call("messages.delete", &json!({})).await })
        };

        let frame = sent_frame(&mut written).await;
        rpc.resolve_response(ResponseFrame::err(
            frame.id,
            ErrorShape::new("FORBIDDEN", "missing permissions"),
        ))
        .await;

        let err = caller.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Protocol(ref m) if m == "missing permissions"));
    }

    #[tokio::test]
    async fn dropped_connection_fails_pending_calls() {
        let (rpc, mut written) = client();

        let caller = {
            let rpc = Arc::clone(&rpc);
            tokio::spawn(async move { rpc.call("channels.list", &json!({})).await })
        };

        let _ = sent_frame(&mut written).await;
        rpc.fail_pending().await;

        assert!(matches!(
            caller.await.unwrap(),
            Err(Error::Connection(_))
        ));
    }

    #[tokio::test]
    async fn unknown_response_is_ignored() {
        let (rpc, _written) = client();
        rpc.resolve_response(ResponseFrame::ok("nobody", json!(null)))
            .await;
        assert!(rpc.pending.lock().await.is_empty());
    }
}
