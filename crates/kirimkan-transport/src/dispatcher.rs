//! Send-message dispatcher.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use kirimkan_core::{
    Jid,
    traits::{DestinationRecorder, SessionSource},
};

use crate::protocol::{SendRequest, SendResponse};

/// Dependencies of the dispatcher.
#[derive(Clone)]
pub struct DispatchState {
    sessions: Arc<dyn SessionSource>,
    recorder: Option<Arc<dyn DestinationRecorder>>,
}

impl DispatchState {
    /// Dispatch through `sessions`, without recording destinations.
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionSource>) -> Self {
        Self {
            sessions,
            recorder: None,
        }
    }

    /// Record every successfully messaged destination with `recorder`.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn DestinationRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }
}

/// A response whose HTTP status always agrees with its JSON `status`.
struct Reply(StatusCode, SendResponse);

impl Reply {
    fn success(message: impl Into<String>) -> Self {
        Self(StatusCode::OK, SendResponse::success(message))
    }

    fn failed(code: StatusCode, message: impl Into<String>) -> Self {
        debug_assert!(!code.is_success());
        Self(code, SendResponse::failed(message))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

/// Handle a send-message request.
///
/// Accepts `POST` with a JSON [`SendRequest`]; every outcome is a JSON
/// [`SendResponse`].
pub async fn send_message(
    State(state): State<DispatchState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    dispatch(&state, &method, body).await.into_response()
}

async fn dispatch(
    state: &DispatchState,
    method: &Method,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    if *method != Method::POST {
        tracing::warn!("Method {method} not allowed on send-message");
        return Reply::failed(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Metode {method} tidak diizinkan"),
        );
    }

    // A literal `null` decodes to an empty request and fails validation below.
    let request = match body.map_err(|e| e.body_text()).and_then(|bytes| {
        serde_json::from_slice::<Option<SendRequest>>(&bytes).map_err(|e| e.to_string())
    }) {
        Ok(request) => request.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read JSON body: {e}");
            return Reply::failed(StatusCode::BAD_REQUEST, "JSON body tidak valid");
        }
    };

    if !request.is_complete() {
        return Reply::failed(
            StatusCode::BAD_REQUEST,
            "Nilai 'No' atau 'Pesan' tidak boleh kosong",
        );
    }

    let Some(client) = state.sessions.current() else {
        tracing::error!("WhatsApp is not connected");
        return Reply::failed(
            StatusCode::INTERNAL_SERVER_ERROR,
            "WhatsApp belum terhubung",
        );
    };

    let SendRequest { no, pesan } = request;
    let to = Jid::user(no.as_str());

    // Submission runs to completion even if the caller goes away.
    let submission = tokio::spawn(async move { client.send_text(&to, &pesan).await });
    match submission.await {
        Ok(Ok(receipt)) => {
            tracing::info!(id = %receipt.id, "Sent message to +{no}");
        }
        Ok(Err(e)) => {
            tracing::warn!("Failed to send message to {no}: {e}");
            return Reply::failed(StatusCode::BAD_REQUEST, e.to_string());
        }
        Err(e) => {
            tracing::error!("Send task for {no} did not complete: {e}");
            return Reply::failed(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    }

    if let Some(recorder) = &state.recorder {
        if let Err(e) = recorder.record_destination(&no).await {
            tracing::warn!("Destination +{no} not recorded: {e}");
        }
    }

    Reply::success(format!("Pesan berhasil dikirim ke {no}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::Request,
    };
    use futures::stream::BoxStream;
    use kirimkan_core::{
        PairingEvent,
        traits::{
            DeviceIdentity, MessageReceipt, MessagingClient, NetworkError, RecordError,
            RecordOutcome, StoreError,
        },
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{SEND_MESSAGE_PATH, Status, api_router};

    /// Client that records submissions and optionally fails them.
    #[derive(Default)]
    struct FakeClient {
        sent: Mutex<Vec<(Jid, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessagingClient for FakeClient {
        fn device(&self) -> Option<DeviceIdentity> {
            None
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn pairing_events(&self) -> Result<BoxStream<'static, PairingEvent>, NetworkError> {
            Err(NetworkError::AlreadyConnected)
        }

        async fn connect(&self) -> Result<(), NetworkError> {
            Ok(())
        }

        async fn disconnect(&self) {}

        async fn send_text(&self, to: &Jid, body: &str) -> Result<MessageReceipt, NetworkError> {
            if self.fail {
                return Err(NetworkError::Send("server returned error 463".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.clone(), body.to_string()));
            Ok(MessageReceipt {
                id: "3EB0C767D26A1D".to_string(),
                timestamp: 1_700_000_000,
            })
        }
    }

    /// Session source with a fixed session, counting lookups.
    struct FixedSession {
        client: Option<Arc<FakeClient>>,
        lookups: AtomicUsize,
    }

    impl FixedSession {
        fn new(client: Option<Arc<FakeClient>>) -> Arc<Self> {
            Arc::new(Self {
                client,
                lookups: AtomicUsize::new(0),
            })
        }
    }

    impl SessionSource for FixedSession {
        fn current(&self) -> Option<Arc<dyn MessagingClient>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.client
                .clone()
                .map(|c| c as Arc<dyn MessagingClient>)
        }
    }

    /// Recorder that always fails, counting calls.
    #[derive(Default)]
    struct CountingRecorder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DestinationRecorder for CountingRecorder {
        async fn record_destination(&self, _identifier: &str) -> Result<RecordOutcome, RecordError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RecordError::Unavailable(StoreError::Unavailable(
                "connection refused".to_string(),
            )))
        }
    }

    async fn call(app: Router, method: Method, body: &str) -> (StatusCode, SendResponse) {
        let request = Request::builder()
            .method(method)
            .uri(SEND_MESSAGE_PATH)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_success() {
        let client = Arc::new(FakeClient::default());
        let app = api_router(DispatchState::new(FixedSession::new(Some(client.clone()))));

        let (status, body) = call(
            app,
            Method::POST,
            r#"{"no": "6281234567890", "pesan": "hello"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            SendResponse::success("Pesan berhasil dikirim ke 6281234567890")
        );
        assert_eq!(
            client.sent.lock().unwrap().as_slice(),
            &[(Jid::user("6281234567890"), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_wrong_method() {
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let sessions = FixedSession::new(Some(Arc::new(FakeClient::default())));
            let recorder = Arc::new(CountingRecorder::default());
            let app = api_router(
                DispatchState::new(sessions.clone()).with_recorder(recorder.clone()),
            );

            let (status, body) = call(app, method.clone(), "").await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body.status, Status::Failed);
            assert_eq!(body.message, format!("Metode {method} tidak diizinkan"));
            assert_eq!(sessions.lookups.load(Ordering::SeqCst), 0);
            assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_invalid_json() {
        for payload in ["", "{", r#"{"no": 628, "pesan": "hi"}"#, "true"] {
            let client = Arc::new(FakeClient::default());
            let sessions = FixedSession::new(Some(client.clone()));
            let recorder = Arc::new(CountingRecorder::default());
            let app = api_router(
                DispatchState::new(sessions.clone()).with_recorder(recorder.clone()),
            );
            let (status, body) = call(app, Method::POST, payload).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, SendResponse::failed("JSON body tidak valid"));
            assert_eq!(sessions.lookups.load(Ordering::SeqCst), 0);
            assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
            assert!(client.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_fields() {
        for payload in [
            r#"{"no": "", "pesan": "hi"}"#,
            r#"{"no": "628", "pesan": ""}"#,
            r"{}",
            "null",
        ] {
            let client = Arc::new(FakeClient::default());
            let sessions = FixedSession::new(Some(client.clone()));
            let recorder = Arc::new(CountingRecorder::default());
            let app = api_router(
                DispatchState::new(sessions.clone()).with_recorder(recorder.clone()),
            );
            let (status, body) = call(app, Method::POST, payload).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                body,
                SendResponse::failed("Nilai 'No' atau 'Pesan' tidak boleh kosong")
            );
            assert_eq!(sessions.lookups.load(Ordering::SeqCst), 0);
            assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
            assert!(client.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_no_session() {
        let app = api_router(DispatchState::new(FixedSession::new(None)));
        let (status, body) = call(app, Method::POST, r#"{"no": "628", "pesan": "hi"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, SendResponse::failed("WhatsApp belum terhubung"));
    }

    #[tokio::test]
    async fn test_send_failure_skips_recording() {
        let client = Arc::new(FakeClient {
            fail: true,
            ..FakeClient::default()
        });
        let recorder = Arc::new(CountingRecorder::default());
        let state =
            DispatchState::new(FixedSession::new(Some(client))).with_recorder(recorder.clone());

        let (status, body) = call(
            api_router(state),
            Method::POST,
            r#"{"no": "628", "pesan": "hi"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.status, Status::Failed);
        assert_eq!(body.message, "Send failed: server returned error 463");
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recording_failure_keeps_success() {
        let client = Arc::new(FakeClient::default());
        let recorder = Arc::new(CountingRecorder::default());
        let state =
            DispatchState::new(FixedSession::new(Some(client))).with_recorder(recorder.clone());

        let (status, body) = call(
            api_router(state),
            Method::POST,
            r#"{"no": "628", "pesan": "hi"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, Status::Success);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
    }
}
