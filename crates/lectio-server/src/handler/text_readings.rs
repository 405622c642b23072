//! Text reading handlers.
//!
//! Submissions go through [`SubmissionService`] so that a stored image and
//! its record are created and removed together. Reads and text updates talk
//! to the [`ResultStore`] directly.
//!
//! [`ResultStore`]: crate::service::ResultStore

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;

use crate::extract::{AuthState, Json, Multipart, Path, ValidateJson};
use crate::handler::request::{TextReadingPathParams, UpdateTextReading};
use crate::handler::response::{Deleted, ErrorResponse, TextReading, TextReadings};
use crate::handler::{ErrorKind, Result};
use crate::service::{
    ImageStorage, ServiceState, SharedResultStore, SubmissionService, content_type_for,
};

/// Tracing target for text reading operations.
const TRACING_TARGET: &str = "lectio_server::handler::text_readings";

/// Multipart field carrying the uploaded image.
const FILE_FIELD: &str = "file";

/// Recognizes an uploaded image and stores it with the extracted text.
#[tracing::instrument(skip_all, fields(subject = %auth_state.subject()))]
async fn create_text_reading(
    auth_state: AuthState,
    State(submission): State<SubmissionService>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<TextReading>)> {
    let file = multipart
        .read_file(FILE_FIELD)
        .await?
        .filter(|file| !file.content.is_empty())
        .ok_or_else(|| {
            ErrorKind::BadRequest
                .with_message("File not provided")
                .with_resource("text_reading")
        })?;

    let file_name = file.file_name.unwrap_or_default();
    tracing::debug!(
        target: TRACING_TARGET,
        file_name = %file_name,
        file_size = file.content.len(),
        "submitting image",
    );

    let reading = submission.submit(file.content, &file_name).await?;

    Ok((StatusCode::CREATED, Json(reading.into())))
}

fn create_text_reading_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Submit image")
        .description(
            "Runs OCR on the `file` field, stores the image and records the extracted text. \
             Nothing is stored when recognition fails.",
        )
        .response::<201, Json<TextReading>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
        .response::<504, Json<ErrorResponse>>()
}

/// Lists all text readings.
#[tracing::instrument(skip_all)]
async fn list_text_readings(
    State(results): State<SharedResultStore>,
) -> Result<(StatusCode, Json<TextReadings>)> {
    let readings: TextReadings = results
        .list()
        .await?
        .into_iter()
        .map(TextReading::from)
        .collect();

    tracing::debug!(target: TRACING_TARGET, count = readings.len(), "text readings listed");

    Ok((StatusCode::OK, Json(readings)))
}

fn list_text_readings_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List text readings")
        .description("Returns every stored text reading, oldest first.")
        .response::<200, Json<TextReadings>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Returns a single text reading.
#[tracing::instrument(skip_all, fields(reading_id = path_params.id))]
async fn read_text_reading(
    State(results): State<SharedResultStore>,
    Path(path_params): Path<TextReadingPathParams>,
) -> Result<(StatusCode, Json<TextReading>)> {
    let reading = results
        .get(path_params.id)
        .await?
        .ok_or_else(text_reading_not_found)?;

    Ok((StatusCode::OK, Json(reading.into())))
}

fn read_text_reading_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get text reading")
        .response::<200, Json<TextReading>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Replaces the extracted text of a reading.
#[tracing::instrument(skip_all, fields(reading_id = path_params.id))]
async fn update_text_reading(
    State(results): State<SharedResultStore>,
    Path(path_params): Path<TextReadingPathParams>,
    ValidateJson(request): ValidateJson<UpdateTextReading>,
) -> Result<(StatusCode, Json<TextReading>)> {
    let reading = results
        .update_text(path_params.id, request.ocr_text)
        .await?
        .ok_or_else(text_reading_not_found)?;

    tracing::info!(target: TRACING_TARGET, "text reading updated");

    Ok((StatusCode::OK, Json(reading.into())))
}

fn update_text_reading_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update text reading")
        .description("Replaces the recognized text. The stored image is left untouched.")
        .response::<200, Json<TextReading>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a reading together with its stored image.
#[tracing::instrument(skip_all, fields(reading_id = path_params.id))]
async fn delete_text_reading(
    State(submission): State<SubmissionService>,
    Path(path_params): Path<TextReadingPathParams>,
) -> Result<(StatusCode, Json<Deleted>)> {
    submission.delete(path_params.id).await?;

    Ok((StatusCode::OK, Json(Deleted::text_reading())))
}

fn delete_text_reading_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete text reading")
        .description("Removes the stored image, then the record. A missing image is tolerated.")
        .response::<200, Json<Deleted>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Downloads the image a reading was extracted from.
#[tracing::instrument(skip_all, fields(reading_id = path_params.id))]
async fn download_image(
    State(results): State<SharedResultStore>,
    State(image_storage): State<ImageStorage>,
    Path(path_params): Path<TextReadingPathParams>,
) -> Result<(StatusCode, HeaderMap, Vec<u8>)> {
    let reading = results
        .get(path_params.id)
        .await?
        .ok_or_else(text_reading_not_found)?;

    let content = image_storage
        .read(&reading.file_path)
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                target: TRACING_TARGET,
                file_path = %reading.file_path,
                "record references a missing image",
            );
            ErrorKind::NotFound
                .with_message("Image file not found")
                .with_resource("image")
        })?;

    let file_name = std::path::Path::new(&reading.file_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&reading.file_path)),
    );
    if let Ok(disposition) = HeaderValue::from_str(&format!("inline; filename=\"{file_name}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    tracing::debug!(target: TRACING_TARGET, size = content.len(), "image downloaded");

    Ok((StatusCode::OK, headers, content))
}

fn download_image_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Download image")
        .description("Returns the stored image with a content type guessed from its extension.")
        .response::<200, Vec<u8>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

fn text_reading_not_found() -> crate::handler::Error<'static> {
    ErrorKind::NotFound
        .with_message("TextReading not found")
        .with_resource("text_reading")
}

/// Returns a [`Router`] with all text reading routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api/text-readings",
            post_with(create_text_reading, create_text_reading_docs)
                .get_with(list_text_readings, list_text_readings_docs),
        )
        .api_route(
            "/api/text-readings/{id}",
            get_with(read_text_reading, read_text_reading_docs)
                .put_with(update_text_reading, update_text_reading_docs)
                .delete_with(delete_text_reading, delete_text_reading_docs),
        )
        .api_route(
            "/api/text-readings/{id}/image",
            get_with(download_image, download_image_docs),
        )
        .with_path_items(|item| item.tag("Text Readings"))
}

#[cfg(test)]
mod tests {
    use axum_test::multipart::{MultipartForm, Part};
    use lectio_ocr::ErrorKind as OcrErrorKind;
    use lectio_ocr::mock::MockOcrProvider;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{bearer, create_test_server, create_test_server_with_ocr};

    fn image_form(field: &str, content: Vec<u8>, file_name: &str) -> MultipartForm {
        MultipartForm::new().add_part(field, Part::bytes(content).file_name(file_name))
    }

    fn is_stored_name(file_name: &str, original: &str) -> bool {
        file_name.split_once('_').is_some_and(|(prefix, rest)| {
            prefix.len() == 5
                && prefix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
                && rest == original
        })
    }

    #[tokio::test]
    async fn submit_read_delete_lifecycle() -> anyhow::Result<()> {
        let (server, state, dir) = create_test_server("HELLO")?;
        let token = bearer(&state, "1")?;

        let response = server
            .post("/api/text-readings")
            .authorization_bearer(&token)
            .multipart(image_form("file", vec![0x01, 0x02, 0x03], "a.png"))
            .await;
        response.assert_status(StatusCode::CREATED);

        let created = response.json::<Value>();
        assert_eq!(created["ocrText"], "HELLO");
        assert_eq!(created["fileSize"], 3);

        let file_path = created["filePath"].as_str().unwrap_or_default().to_owned();
        let expected_root = dir.path().join("static").join("images");
        let stored = std::path::Path::new(&file_path);
        assert_eq!(stored.parent(), Some(expected_root.as_path()));
        let file_name = stored.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(is_stored_name(file_name, "a.png"), "unexpected name {file_name}");
        assert_eq!(std::fs::read(stored)?, vec![0x01, 0x02, 0x03]);

        let id = created["id"].as_i64().unwrap_or_default();
        let response = server
            .get(&format!("/api/text-readings/{id}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), created);

        let response = server
            .delete(&format!("/api/text-readings/{id}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>()["message"],
            "TextReading and associated file deleted"
        );
        assert!(!stored.exists());

        server
            .get(&format!("/api/text-readings/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_field_is_bad_request() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server("HELLO")?;
        let token = bearer(&state, "1")?;

        let response = server
            .post("/api/text-readings")
            .authorization_bearer(&token)
            .multipart(image_form("other", vec![1], "a.png"))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "File not provided");
        Ok(())
    }

    #[tokio::test]
    async fn recognition_failure_stores_nothing() -> anyhow::Result<()> {
        let provider = MockOcrProvider::failing(OcrErrorKind::UpstreamUnavailable);
        let (server, state, dir) = create_test_server_with_ocr(provider)?;
        let token = bearer(&state, "1")?;

        server
            .post("/api/text-readings")
            .authorization_bearer(&token)
            .multipart(image_form("file", vec![1, 2, 3], "a.png"))
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let listed = server
            .get("/api/text-readings")
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(listed, json!([]));

        let images_dir = dir.path().join("static").join("images");
        let stored = std::fs::read_dir(&images_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(stored, 0);
        Ok(())
    }

    #[tokio::test]
    async fn list_returns_oldest_first() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server("TEXT")?;
        let token = bearer(&state, "1")?;

        for name in ["first.png", "second.png"] {
            server
                .post("/api/text-readings")
                .authorization_bearer(&token)
                .multipart(image_form("file", vec![7, 7], name))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let listed = server
            .get("/api/text-readings")
            .authorization_bearer(&token)
            .await
            .json::<Vec<Value>>();
        assert_eq!(listed.len(), 2);
        assert!(listed[0]["id"].as_i64() < listed[1]["id"].as_i64());
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_text() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server("HELL0")?;
        let token = bearer(&state, "1")?;

        let created = server
            .post("/api/text-readings")
            .authorization_bearer(&token)
            .multipart(image_form("file", vec![1], "scan.jpg"))
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap_or_default();

        let response = server
            .put(&format!("/api/text-readings/{id}"))
            .authorization_bearer(&token)
            .json(&json!({"ocrText": "HELLO"}))
            .await;
        response.assert_status_ok();
        let updated = response.json::<Value>();
        assert_eq!(updated["ocrText"], "HELLO");
        assert_eq!(updated["filePath"], created["filePath"]);

        server
            .put("/api/text-readings/999")
            .authorization_bearer(&token)
            .json(&json!({"ocrText": "x"}))
            .await
            .assert_status_not_found();

        server
            .put(&format!("/api/text-readings/{id}"))
            .authorization_bearer(&token)
            .json(&json!({"text": "x"}))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn invalid_and_unknown_ids() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server("HELLO")?;
        let token = bearer(&state, "1")?;

        let response = server
            .get("/api/text-readings/abc")
            .authorization_bearer(&token)
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "Invalid ID format");

        let response = server
            .delete("/api/text-readings/42")
            .authorization_bearer(&token)
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "TextReading not found");
        Ok(())
    }

    #[tokio::test]
    async fn image_download_guesses_content_type() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server("HELLO")?;
        let token = bearer(&state, "1")?;

        let created = server
            .post("/api/text-readings")
            .authorization_bearer(&token)
            .multipart(image_form("file", vec![9, 8, 7], "photo.png"))
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap_or_default();

        let response = server
            .get(&format!("/api/text-readings/{id}/image"))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.header(header::CONTENT_TYPE), "image/png");
        assert_eq!(response.as_bytes().to_vec(), vec![9, 8, 7]);

        let file_path = created["filePath"].as_str().unwrap_or_default();
        std::fs::remove_file(file_path)?;

        let response = server
            .get(&format!("/api/text-readings/{id}/image"))
            .authorization_bearer(&token)
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Image file not found");
        Ok(())
    }

    #[tokio::test]
    async fn delete_tolerates_missing_image() -> anyhow::Result<()> {
        let (server, state, _dir) = create_test_server("HELLO")?;
        let token = bearer(&state, "1")?;

        let created = server
            .post("/api/text-readings")
            .authorization_bearer(&token)
            .multipart(image_form("file", vec![1], "a.png"))
            .await
            .json::<Value>();
        std::fs::remove_file(created["filePath"].as_str().unwrap_or_default())?;

        let id = created["id"].as_i64().unwrap_or_default();
        server
            .delete(&format!("/api/text-readings/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        server
            .get(&format!("/api/text-readings/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn requires_bearer_token() -> anyhow::Result<()> {
        let (server, _state, _dir) = create_test_server("HELLO")?;

        server.get("/api/text-readings").await.assert_status_unauthorized();
        server
            .get("/api/text-readings")
            .authorization_bearer("not-a-token")
            .await
            .assert_status_unauthorized();
        Ok(())
    }
}
