//! OCR-only handler. Nothing is persisted.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use lectio_ocr::OcrService;

use crate::extract::{AuthState, Json, Multipart};
use crate::handler::response::{ErrorResponse, ExtractedText};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for OCR-only operations.
const TRACING_TARGET: &str = "lectio_server::handler::ocr";

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// Recognizes the text in an uploaded image and returns it.
#[tracing::instrument(skip_all, fields(subject = %auth_state.subject()))]
async fn extract_text(
    auth_state: AuthState,
    State(ocr): State<OcrService>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ExtractedText>)> {
    let image = multipart
        .read_file(IMAGE_FIELD)
        .await?
        .filter(|image| !image.content.is_empty())
        .ok_or_else(|| {
            ErrorKind::BadRequest
                .with_message("File not provided")
                .with_resource("image")
        })?;

    let size = image.content.len();
    let extracted_text = ocr.recognize(image.content).await.map_err(crate::Error::from)?;

    tracing::debug!(
        target: TRACING_TARGET,
        size,
        text_len = extracted_text.len(),
        "text extracted",
    );

    Ok((StatusCode::OK, Json(ExtractedText { extracted_text })))
}

fn extract_text_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Extract text")
        .description("Runs OCR on the `image` field and returns the text without storing anything.")
        .response::<200, Json<ExtractedText>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
        .response::<504, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with the OCR-only route.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/ocr", post_with(extract_text, extract_text_docs))
        .with_path_items(|item| item.tag("OCR"))
}

#[cfg(test)]
mod tests {
    use axum_test::multipart::{MultipartForm, Part};
    use lectio_ocr::ErrorKind as OcrErrorKind;
    use lectio_ocr::mock::MockOcrProvider;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{bearer, create_test_server, create_test_server_with_ocr};

    #[tokio::test]
    async fn returns_text_without_persisting() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server("HELLO")?;
        let token = bearer(&state, "1")?;

        let form = MultipartForm::new().add_part("image", Part::bytes(vec![1, 2, 3]).file_name("a.png"));
        let response = server.post("/api/ocr").authorization_bearer(&token).multipart(form).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({"extractedText": "HELLO"}));

        let listed = server
            .get("/api/text-readings")
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(listed, json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn upstream_errors_map_to_gateway_statuses() -> anyhow::Result<()> {
        let cases = [
            (OcrErrorKind::RecognitionFailed, StatusCode::BAD_GATEWAY),
            (OcrErrorKind::UpstreamUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (OcrErrorKind::UpstreamTimeout, StatusCode::GATEWAY_TIMEOUT),
        ];

        for (kind, status) in cases {
            let (server, state, _dir) = create_test_server_with_ocr(MockOcrProvider::failing(kind))?;
            let token = bearer(&state, "1")?;

            let form = MultipartForm::new().add_part("image", Part::bytes(vec![1]).file_name("a.png"));
            server
                .post("/api/ocr")
                .authorization_bearer(&token)
                .multipart(form)
                .await
                .assert_status(status);
        }
        Ok(())
    }
}
