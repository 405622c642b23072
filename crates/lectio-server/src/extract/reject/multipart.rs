//! Multipart extractor and single-file field reader.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{FromRequest, Multipart as AxumMultipart, Request};
use bytes::{Bytes, BytesMut};
use derive_more::{Deref, DerefMut, From};

use crate::handler::{Error, ErrorKind, Result};

/// Drop-in replacement for [`axum::extract::Multipart`] with structured rejections.
#[must_use]
#[derive(Debug, Deref, DerefMut, From)]
pub struct Multipart(pub AxumMultipart);

/// A file read from a multipart form field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-provided filename, if any.
    pub file_name: Option<String>,
    pub content: Bytes,
}

impl Multipart {
    #[inline]
    pub fn into_inner(self) -> AxumMultipart {
        self.0
    }

    /// Reads the first field named `field_name`, skipping all others.
    ///
    /// Returns `None` when the form has no such field.
    pub async fn read_file(&mut self, field_name: &str) -> Result<Option<UploadedFile>> {
        while let Some(mut field) = self.0.next_field().await.map_err(|err| {
            ErrorKind::BadRequest
                .with_message("Invalid multipart data")
                .with_context(format!("Failed to parse multipart form: {}", err))
        })? {
            if field.name() != Some(field_name) {
                continue;
            }

            let file_name = field.file_name().map(ToOwned::to_owned);
            let mut content = BytesMut::new();
            while let Some(chunk) = field.chunk().await.map_err(|err| {
                ErrorKind::BadRequest
                    .with_message("Failed to read file data")
                    .with_context(format!("Multipart chunk error: {}", err))
            })? {
                content.extend_from_slice(&chunk);
            }

            return Ok(Some(UploadedFile {
                file_name,
                content: content.freeze(),
            }));
        }

        Ok(None)
    }
}

impl<S> FromRequest<S> for Multipart
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumMultipart::from_request(req, state)
            .await
            .map(Multipart)
            .map_err(Into::into)
    }
}

impl From<MultipartRejection> for Error<'static> {
    fn from(rejection: MultipartRejection) -> Self {
        match rejection {
            MultipartRejection::InvalidBoundary(_) => ErrorKind::BadRequest
                .with_message("File not provided")
                .with_context("Request must use 'multipart/form-data' with a valid boundary"),
            _ => ErrorKind::BadRequest
                .with_message("Invalid multipart request")
                .with_context(format!("Multipart parsing failed: {}", rejection)),
        }
    }
}

impl aide::OperationInput for Multipart {
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumMultipart::operation_input(ctx, operation);
    }
}
