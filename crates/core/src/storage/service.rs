//! Storage service implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::StorageProvider;
use super::error::StorageError;

/// An object read back from storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Storage key.
    pub key: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// Storage service for report artifacts.
#[derive(Debug, Clone)]
pub struct StorageService {
    operator: Operator,
    provider: StorageProvider,
}

impl StorageService {
    /// Create a new storage service for a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(provider: StorageProvider) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&provider)?;
        Ok(Self { operator, provider })
    }

    /// In-memory storage, handy for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_provider(StorageProvider::Memory)
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root))
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };
        Ok(operator)
    }

    /// Storage key for a report artifact.
    ///
    /// Format: `rapports/{budget_id}/{rapport_id}/{sanitized_filename}`
    #[must_use]
    pub fn report_key(budget_id: Uuid, rapport_id: Uuid, nom_fichier: &str) -> String {
        format!(
            "rapports/{budget_id}/{rapport_id}/{}",
            sanitize_filename(nom_fichier)
        )
    }

    /// Key prefix holding every artifact of a budget.
    #[must_use]
    pub fn budget_prefix(budget_id: Uuid) -> String {
        format!("rapports/{budget_id}/")
    }

    /// Writes an object, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.operator.write(key, bytes).await?;
        Ok(())
    }

    /// Reads a whole object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the key is absent.
    pub async fn read(&self, key: &str) -> Result<StoredObject, StorageError> {
        let buffer = self.operator.read(key).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::from(e)
            }
        })?;
        Ok(StoredObject {
            key: key.to_string(),
            bytes: buffer.to_vec(),
        })
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Lists object keys under a prefix, recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self.operator.list_with(prefix).recursive(true).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.path().ends_with('/'))
            .map(|entry| entry.path().to_string())
            .collect())
    }

    /// Deletes every object under a prefix, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or any deletion fails.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let keys = self.list(prefix).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(keys.len())
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    /// Get the storage provider name.
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

/// Replaces anything but ASCII alphanumerics, dots, hyphens and underscores.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
