use std::sync::Arc;

use lectio_ocr::OcrService;
use lectio_postgres::PgClient;

use crate::Result;
use crate::service::{
    ImageStorage, PasswordHasher, PgStore, ServiceConfig, SharedResultStore, SharedUserStore,
    SubmissionService, TokenService,
};
use crate::utility::tracing_targets::SERVICE_STATE as TRACING_TARGET;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    postgres: Option<PgClient>,
    pub ocr: OcrService,

    // Persistence:
    pub results: SharedResultStore,
    pub users: SharedUserStore,
    pub image_storage: ImageStorage,

    // Internal services:
    pub password_hasher: PasswordHasher,
    pub token_service: TokenService,
    pub submission: SubmissionService,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to Postgres, applies migrations, loads the signing keys and
    /// builds the OCR client.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let postgres = config.connect_postgres().await?;
        let store = Arc::new(PgStore::new(postgres.clone()));
        let session_keys = config.load_session_keys().await?;
        let ocr = config.connect_ocr()?;

        let image_storage = ImageStorage::new(&config.storage);
        image_storage.ensure_root().await?;

        let state = Self::from_parts(
            ocr,
            store.clone(),
            store,
            image_storage,
            TokenService::new(session_keys, &config.token),
        )
        .with_postgres(postgres);

        tracing::info!(target: TRACING_TARGET, "service state initialized");
        Ok(state)
    }

    /// Assembles state from already constructed services.
    pub fn from_parts(
        ocr: OcrService,
        results: SharedResultStore,
        users: SharedUserStore,
        image_storage: ImageStorage,
        token_service: TokenService,
    ) -> Self {
        let submission =
            SubmissionService::new(ocr.clone(), results.clone(), image_storage.clone());

        Self {
            postgres: None,
            ocr,
            results,
            users,
            image_storage,
            password_hasher: PasswordHasher::new(),
            token_service,
            submission,
        }
    }

    fn with_postgres(mut self, postgres: PgClient) -> Self {
        self.postgres = Some(postgres);
        self
    }

    /// Releases the database pool. Pending checkouts fail after this call.
    pub fn shutdown(&self) {
        if let Some(postgres) = &self.postgres {
            postgres.close();
            tracing::info!(target: TRACING_TARGET, "database pool closed");
        }
    }
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("postgres", &self.postgres)
            .field("ocr", &self.ocr)
            .field("image_storage", &self.image_storage)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(ocr: OcrService);

// Persistence:
impl_di!(results: SharedResultStore);
impl_di!(users: SharedUserStore);
impl_di!(image_storage: ImageStorage);

// Internal services:
impl_di!(password_hasher: PasswordHasher);
impl_di!(token_service: TokenService);
impl_di!(submission: SubmissionService);

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use super::*;
    use crate::service::StorageConfig;
    use crate::service::TokenConfig;
    use crate::service::security::session_keys::tests::test_keys;
    use crate::service::store::memory::MemoryStore;

    /// State backed by in-memory stores and images under `storage_root`.
    pub(crate) fn test_state(ocr: OcrService, storage_root: &Path) -> ServiceState {
        let store = Arc::new(MemoryStore::new());
        let image_storage = ImageStorage::new(&StorageConfig {
            storage_root: storage_root.to_path_buf(),
        });

        ServiceState::from_parts(
            ocr,
            store.clone(),
            store,
            image_storage,
            TokenService::new(test_keys(), &TokenConfig::default()),
        )
    }

    #[test]
    fn shutdown_without_postgres_is_noop() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let ocr = OcrService::new(lectio_ocr::mock::MockOcrProvider::text(""));
        let state = test_state(ocr, dir.path());

        state.shutdown();
        state.shutdown();
        Ok(())
    }
}
