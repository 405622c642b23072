//! Streaming OCR sessions over a WebSocket.
//!
//! The handshake authenticates with the `token` query parameter. Once open,
//! every binary frame is one image and yields exactly one text frame, either
//! the extracted text or an error message. Frames are handled strictly in
//! turn: the next frame is not read before the previous answer is written.

use std::ops::ControlFlow;
use std::time::Instant;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use lectio_ocr::OcrService;
use uuid::Uuid;

use crate::extract::{Json, Query};
use crate::handler::request::StreamQueryParams;
use crate::handler::response::ErrorResponse;
use crate::handler::{ErrorKind, Result};
use crate::middleware::DEFAULT_MAX_BODY_SIZE;
use crate::service::{ServiceState, TokenService};

/// Tracing target for streaming sessions.
const TRACING_TARGET: &str = "lectio_server::handler::websocket";

/// Reply to any frame that is not an image.
const BINARY_ONLY_MESSAGE: &str = "Only binary data (images) is supported.";

/// Per-connection context.
#[derive(Debug, Clone)]
struct SessionContext {
    /// Unique connection identifier for logging.
    connection_id: Uuid,
    /// Subject of the token presented at the handshake.
    subject: String,
}

impl SessionContext {
    fn new(subject: String) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            subject,
        }
    }
}

#[derive(Debug, Default)]
struct SessionCounters {
    images: u64,
    recognized: u64,
    failed: u64,
    rejected: u64,
}

/// Runs OCR on one image and renders the single reply frame.
async fn recognize_frame(
    ctx: &SessionContext,
    ocr: &OcrService,
    image: axum::body::Bytes,
    counters: &mut SessionCounters,
) -> String {
    counters.images += 1;
    let size = image.len();

    match ocr.recognize(image).await {
        Ok(text) => {
            counters.recognized += 1;
            tracing::debug!(
                target: TRACING_TARGET,
                connection_id = %ctx.connection_id,
                size,
                text_len = text.len(),
                "image recognized"
            );
            text
        }
        Err(err) => {
            counters.failed += 1;
            tracing::warn!(
                target: TRACING_TARGET,
                connection_id = %ctx.connection_id,
                size,
                error = %err,
                "recognition failed"
            );
            crate::Error::from(err).message().to_owned()
        }
    }
}

/// Handles one inbound frame, writing at most one reply.
async fn process_frame(
    ctx: &SessionContext,
    socket: &mut WebSocket,
    ocr: &OcrService,
    message: Message,
    counters: &mut SessionCounters,
) -> ControlFlow<(), ()> {
    let reply = match message {
        Message::Binary(image) => recognize_frame(ctx, ocr, image, counters).await,
        Message::Text(text) => {
            counters.rejected += 1;
            tracing::debug!(
                target: TRACING_TARGET,
                connection_id = %ctx.connection_id,
                message_length = text.len(),
                "received text frame, rejecting"
            );
            BINARY_ONLY_MESSAGE.to_owned()
        }
        Message::Close(close_frame) => {
            match close_frame {
                Some(cf) => tracing::info!(
                    target: TRACING_TARGET,
                    connection_id = %ctx.connection_id,
                    close_code = cf.code,
                    close_reason = %cf.reason,
                    "client sent close frame"
                ),
                None => tracing::info!(
                    target: TRACING_TARGET,
                    connection_id = %ctx.connection_id,
                    "client sent close frame"
                ),
            }
            return ControlFlow::Break(());
        }
        Message::Ping(_) | Message::Pong(_) => return ControlFlow::Continue(()),
    };

    if let Err(err) = socket.send(Message::Text(Utf8Bytes::from(reply))).await {
        tracing::debug!(
            target: TRACING_TARGET,
            connection_id = %ctx.connection_id,
            error = %err,
            "failed to send reply, client disconnected"
        );
        return ControlFlow::Break(());
    }

    ControlFlow::Continue(())
}

/// Runs the session until the peer closes or the connection fails.
///
/// The socket and the OCR handle are dropped on every exit path.
async fn handle_session(mut socket: WebSocket, subject: String, ocr: OcrService) {
    let start_time = Instant::now();
    let ctx = SessionContext::new(subject);
    let mut counters = SessionCounters::default();

    tracing::info!(
        target: TRACING_TARGET,
        connection_id = %ctx.connection_id,
        subject = %ctx.subject,
        "streaming session opened"
    );

    while let Some(received) = socket.next().await {
        let message = match received {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    connection_id = %ctx.connection_id,
                    error = %err,
                    "error receiving from websocket"
                );
                break;
            }
        };

        if process_frame(&ctx, &mut socket, &ocr, message, &mut counters)
            .await
            .is_break()
        {
            break;
        }
    }

    tracing::info!(
        target: TRACING_TARGET,
        connection_id = %ctx.connection_id,
        subject = %ctx.subject,
        duration_ms = start_time.elapsed().as_millis(),
        images = counters.images,
        recognized = counters.recognized,
        failed = counters.failed,
        rejected = counters.rejected,
        "streaming session closed"
    );
}

/// Authenticates the handshake and upgrades to a streaming session.
#[tracing::instrument(skip_all)]
async fn stream_handler(
    State(token_service): State<TokenService>,
    State(ocr): State<OcrService>,
    Query(params): Query<StreamQueryParams>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let token = params
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::debug!(target: TRACING_TARGET, "handshake without token");
            ErrorKind::MissingAuthToken
                .with_message("JWT token not provided")
                .with_resource("authentication")
        })?;

    let subject = token_service.verify(&token).map_err(|err| {
        tracing::debug!(target: TRACING_TARGET, error = %err, "handshake token rejected");
        ErrorKind::MalformedAuthToken
            .with_message("Invalid JWT token")
            .with_resource("authentication")
    })?;

    tracing::debug!(target: TRACING_TARGET, subject = %subject, "websocket upgrade authorized");

    Ok(ws
        .max_message_size(DEFAULT_MAX_BODY_SIZE)
        .on_upgrade(move |socket| handle_session(socket, subject, ocr)))
}

fn stream_handler_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Open streaming OCR session")
        .description(
            "Upgrades to a WebSocket authenticated by the `token` query parameter. Each binary \
             frame is an image and is answered by one text frame with the extracted text or an \
             error message. Text frames are answered with a fixed diagnostic.",
        )
        .response::<101, ()>()
        .response::<401, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with the streaming route.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/ws", get_with(stream_handler, stream_handler_docs))
        .with_path_items(|item| item.tag("WebSocket"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum_test::WsMessage;
    use lectio_ocr::ErrorKind as OcrErrorKind;
    use lectio_ocr::mock::MockOcrProvider;

    use super::*;
    use crate::handler::test::{bearer, create_test_server_with_ocr, create_test_server_with_state};
    use crate::service::test_state;

    #[tokio::test]
    async fn replies_alternate_with_ocr_outcome() -> anyhow::Result<()> {
        let provider = MockOcrProvider::alternating("HELLO", OcrErrorKind::UpstreamUnavailable);
        let (server, state, _dir) = create_test_server_with_ocr(provider.clone())?;
        let token = bearer(&state, "1")?;

        let mut ws = server
            .get_websocket("/ws")
            .add_query_param("token", &token)
            .await
            .into_websocket()
            .await;

        for round in 0..4u8 {
            ws.send_message(WsMessage::Binary(vec![round, 1, 2].into())).await;
            let reply = ws.receive_text().await;
            if round % 2 == 0 {
                assert_eq!(reply, "HELLO");
            } else {
                assert_eq!(reply, "Could not connect to OCR server");
            }
        }

        assert_eq!(provider.calls(), 4);
        ws.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn text_frame_gets_diagnostic_and_session_continues() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server_with_ocr(MockOcrProvider::text("HELLO"))?;
        let token = bearer(&state, "1")?;

        let mut ws = server
            .get_websocket("/ws")
            .add_query_param("token", &token)
            .await
            .into_websocket()
            .await;

        ws.send_text("hello?").await;
        assert_eq!(ws.receive_text().await, BINARY_ONLY_MESSAGE);

        ws.send_message(WsMessage::Binary(vec![1, 2, 3].into())).await;
        assert_eq!(ws.receive_text().await, "HELLO");
        Ok(())
    }

    #[tokio::test]
    async fn deadline_is_reported_as_failed_operation() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let provider = MockOcrProvider::text("late").with_delay(Duration::from_millis(200));
        let ocr = OcrService::new(provider).with_deadline(Duration::from_millis(20));
        let state = test_state(ocr, &dir.path().join("static").join("images"));
        let server = create_test_server_with_state(state.clone())?;
        let token = bearer(&state, "1")?;

        let mut ws = server
            .get_websocket("/ws")
            .add_query_param("token", &token)
            .await
            .into_websocket()
            .await;

        ws.send_message(WsMessage::Binary(vec![1].into())).await;
        assert_eq!(ws.receive_text().await, "Could not perform OCR operation");
        Ok(())
    }

    #[tokio::test]
    async fn handshake_requires_valid_token() -> anyhow::Result<()> {
        let (server, _state, _dir) = create_test_server_with_ocr(MockOcrProvider::text("HELLO"))?;

        let response = server.get_websocket("/ws").await;
        response.assert_status_unauthorized();
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            "JWT token not provided"
        );

        let response = server
            .get_websocket("/ws")
            .add_query_param("token", "")
            .await;
        response.assert_status_unauthorized();

        let response = server
            .get_websocket("/ws")
            .add_query_param("token", "not.a.token")
            .await;
        response.assert_status_unauthorized();
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            "Invalid JWT token"
        );
        Ok(())
    }
}
