//! Local filesystem storage for uploaded images.

use std::io::{self, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};

#[cfg(any(test, feature = "config"))]
use clap::Args;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::utility::tracing_targets::IMAGE_STORAGE as TRACING_TARGET;
use crate::{Error, Result};

/// Number of hex characters of the content hash kept in a stored filename.
const HASH_PREFIX_LEN: usize = 5;

/// How many names `write` derives before giving up on a free one.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Filename used when the upload carries none.
const FALLBACK_FILE_NAME: &str = "image";

/// Where uploaded images are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
pub struct StorageConfig {
    /// Directory holding stored images, relative to the working directory.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "STORAGE_ROOT", default_value = "static/images")
    )]
    #[serde(default = "StorageConfig::default_root")]
    pub storage_root: PathBuf,
}

impl StorageConfig {
    fn default_root() -> PathBuf {
        PathBuf::from("static").join("images")
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(Error::config("Storage root must not be empty"));
        }

        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_root: Self::default_root(),
        }
    }
}

/// An image written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Path as recorded in the database.
    pub file_path: String,
    pub file_size: i64,
}

/// Writes, reads and removes image files under a single root directory.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
}

impl ImageStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.storage_root.clone(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the storage root if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            Error::storage(format!(
                "Failed to create storage root {}",
                self.root.display()
            ))
            .with_source(err)
        })
    }

    /// Builds the stored filename for an upload.
    ///
    /// The name is the first five hex characters of
    /// `sha256(content ++ nanos)`, an underscore, and the final path
    /// component of `original_name`.
    pub fn derive_file_name(content: &[u8], original_name: &str, nanos: i128) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hasher.update(nanos.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());

        format!(
            "{}_{}",
            &digest[..HASH_PREFIX_LEN],
            base_name(original_name)
        )
    }

    /// Writes `content` under a freshly derived filename.
    ///
    /// Files are created exclusively, so an existing image is never
    /// overwritten. A taken name is derived again from a later timestamp,
    /// up to `MAX_NAME_ATTEMPTS` times. A failed write leaves no file behind.
    pub async fn write(&self, content: &[u8], original_name: &str) -> Result<StoredImage> {
        self.ensure_root().await?;

        let mut nanos = Timestamp::now().as_nanosecond();
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let file_name = Self::derive_file_name(content, original_name, nanos);
            let path = self.root.join(file_name);

            let created = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            let file = match created {
                Ok(file) => file,
                Err(err) if err.kind() == IoErrorKind::AlreadyExists => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        path = %path.display(),
                        attempt,
                        "image name taken, deriving another",
                    );
                    nanos = Timestamp::now().as_nanosecond().max(nanos.saturating_add(1));
                    continue;
                }
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        path = %path.display(),
                        error = %err,
                        "failed to create image file",
                    );
                    return Err(Error::storage("Failed to save file").with_source(err));
                }
            };

            fill_or_discard(&path, file, content).await.map_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET,
                    path = %path.display(),
                    error = %err,
                    "failed to write image",
                );
                Error::storage("Failed to save file").with_source(err)
            })?;

            tracing::debug!(
                target: TRACING_TARGET,
                path = %path.display(),
                size = content.len(),
                "image stored",
            );

            return Ok(StoredImage {
                file_path: path.to_string_lossy().into_owned(),
                file_size: i64::try_from(content.len()).unwrap_or(i64::MAX),
            });
        }

        tracing::error!(
            target: TRACING_TARGET,
            original_name,
            attempts = MAX_NAME_ATTEMPTS,
            "no free image name found",
        );
        Err(Error::storage("Failed to save file"))
    }

    /// Reads a stored image. Returns `None` when the file is absent.
    pub async fn read(&self, file_path: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(file_path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::storage("Failed to read image file").with_source(err)),
        }
    }

    /// Removes a stored image.
    ///
    /// Returns `false` when the file was already gone. Every other
    /// filesystem error is a storage failure.
    pub async fn remove(&self, file_path: &str) -> Result<bool> {
        match tokio::fs::remove_file(file_path).await {
            Ok(()) => {
                tracing::debug!(target: TRACING_TARGET, path = file_path, "image removed");
                Ok(true)
            }
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                tracing::debug!(target: TRACING_TARGET, path = file_path, "image already absent");
                Ok(false)
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    path = file_path,
                    error = %err,
                    "failed to remove image",
                );
                Err(Error::storage("Failed to delete associated file").with_source(err))
            }
        }
    }
}

/// Writes `content` into a file this call just created.
///
/// On failure the partial file is removed before the error is returned.
async fn fill_or_discard<W>(path: &Path, mut file: W, content: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(content).await?;
        file.flush().await
    }
    .await;

    let Err(err) = written else {
        return Ok(());
    };

    drop(file);
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(cleanup) if cleanup.kind() == IoErrorKind::NotFound => {}
        Err(cleanup) => {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %cleanup,
                "failed to remove partial image",
            );
        }
    }

    Err(err)
}

/// Returns the final path component, treating both separators as such.
fn base_name(original_name: &str) -> &str {
    original_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_FILE_NAME)
}

/// Guesses a `Content-Type` from the file extension.
pub fn content_type_for(file_path: &str) -> &'static str {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tempfile::TempDir;

    use super::*;

    fn storage_in(dir: &TempDir) -> ImageStorage {
        ImageStorage::new(&StorageConfig {
            storage_root: dir.path().join("images"),
        })
    }

    #[test]
    fn file_name_has_hash_prefix_and_base_name() {
        let name = ImageStorage::derive_file_name(&[1, 2, 3], "a.png", 42);
        let (prefix, rest) = name.split_once('_').expect("name has a separator");

        assert_eq!(prefix.len(), 5);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, "a.png");
    }

    #[test]
    fn file_name_strips_directories() {
        let name = ImageStorage::derive_file_name(b"x", "../../etc/passwd", 1);
        assert!(name.ends_with("_passwd"));

        let name = ImageStorage::derive_file_name(b"x", r"C:\photos\scan.jpg", 1);
        assert!(name.ends_with("_scan.jpg"));

        let name = ImageStorage::derive_file_name(b"x", "", 1);
        assert!(name.ends_with("_image"));
    }

    #[test]
    fn file_name_depends_on_time() {
        let first = ImageStorage::derive_file_name(b"same", "a.png", 1);
        let second = ImageStorage::derive_file_name(b"same", "a.png", 2);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn write_read_remove() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let storage = storage_in(&dir);

        let stored = storage.write(&[1, 2, 3], "a.png").await?;
        assert_eq!(stored.file_size, 3);
        assert!(stored.file_path.ends_with("_a.png"));

        let content = storage.read(&stored.file_path).await?;
        assert_eq!(content, Some(vec![1, 2, 3]));

        assert!(storage.remove(&stored.file_path).await?);
        assert!(!storage.remove(&stored.file_path).await?);
        assert_eq!(storage.read(&stored.file_path).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn repeated_writes_never_overwrite() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let storage = storage_in(&dir);

        let mut paths = std::collections::HashSet::new();
        for _ in 0..500 {
            let stored = storage.write(&[1, 2, 3], "a.png").await?;
            assert!(paths.insert(stored.file_path), "stored path reused");
        }

        let mut entries = tokio::fs::read_dir(storage.root()).await?;
        let mut on_disk = 0;
        while entries.next_entry().await?.is_some() {
            on_disk += 1;
        }
        assert_eq!(on_disk, paths.len());
        Ok(())
    }

    /// Accepts nothing, like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_write_removes_partial_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("abcde_a.png");
        tokio::fs::write(&path, b"partial").await?;

        let error = fill_or_discard(&path, FullDisk, &[1, 2, 3])
            .await
            .expect_err("write must fail");
        assert!(error.to_string().contains("no space"));
        assert!(!tokio::fs::try_exists(&path).await?);
        Ok(())
    }

    #[tokio::test]
    async fn successful_fill_keeps_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("abcde_a.png");
        let file = OpenOptions::new().write(true).create_new(true).open(&path).await?;

        fill_or_discard(&path, file, &[1, 2, 3]).await?;
        assert_eq!(tokio::fs::read(&path).await?, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("static/images/abcde_a.PNG"), "image/png");
        assert_eq!(content_type_for("x.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("x"), "application/octet-stream");
    }
}
