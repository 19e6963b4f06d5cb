//! OpenDAL-backed archive store.
//!
//! The fetch loop is synchronous, so every operator call is driven to
//! completion on a private current-thread runtime.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use opendal::{services, ErrorKind, Operator};
use serde::Deserialize;
use tokio::runtime::Runtime;

use crate::archive::{ArchiveKey, ArchiveStore};
use crate::error::IngestError;

/// The fields of a service account JSON key checked before any request.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            IngestError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;

        let key: ServiceAccountKey = serde_json::from_str(&contents).map_err(|e| {
            IngestError::Credentials(format!("cannot parse {}: {}", path.display(), e))
        })?;

        if !key.private_key.contains("-----BEGIN") {
            return Err(IngestError::Credentials(format!(
                "{} has no PEM private key",
                path.display()
            )));
        }

        Ok(key)
    }
}

pub struct OpendalStore {
    operator: Operator,
    runtime: Runtime,
}

impl OpendalStore {
    /// Cloud Storage bucket authenticated with a service account key file.
    /// The key file is validated here, before any network activity.
    pub fn gcs(bucket: &str, credential_path: &Path) -> Result<Self, IngestError> {
        let key = ServiceAccountKey::from_file(credential_path)?;
        log::debug!("Using service account {}", key.client_email);

        let credential_path = credential_path.to_str().ok_or_else(|| {
            IngestError::Credentials(format!(
                "path {} is not valid UTF-8",
                credential_path.display()
            ))
        })?;

        let builder = services::Gcs::default()
            .bucket(bucket)
            .credential_path(credential_path);

        let operator = Operator::new(builder)
            .map_err(|e| IngestError::Config(format!("Failed to create GCS operator: {}", e)))?
            .finish();

        Self::from_operator(operator)
    }

    pub fn from_operator(operator: Operator) -> Result<Self, IngestError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(OpendalStore { operator, runtime })
    }

    /// e.g. `gcs://projeto_nyc`
    pub fn location(&self) -> String {
        let info = self.operator.info();
        format!("{}://{}", info.scheme(), info.name())
    }
}

fn storage_error(key: &ArchiveKey, source: opendal::Error) -> IngestError {
    IngestError::Storage {
        object: key.to_string(),
        source,
    }
}

impl ArchiveStore for OpendalStore {
    fn exists(&self, key: &ArchiveKey) -> Result<bool> {
        match self.runtime.block_on(self.operator.stat(key.as_str())) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(key, e).into()),
        }
    }

    fn upload_file(&self, key: &ArchiveKey, path: &Path) -> Result<()> {
        let contents = fs::read(path)
            .with_context(|| format!("Failed to read staged file {}", path.display()))?;

        self.runtime
            .block_on(self.operator.write(key.as_str(), contents))
            .map_err(|e| storage_error(key, e))?;

        log::debug!("Stored {}/{}", self.location(), key);
        Ok(())
    }
}
