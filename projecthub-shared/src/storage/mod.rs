//! Blob storage for uploaded files
//!
//! File metadata lives in Postgres; the bytes live behind a [`BlobStore`].
//! Keys are slash-separated paths of the form `projects/{project_id}/{file_id}`
//! so all blobs of a project can be purged with one prefix delete.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte storage keyed by path-like strings
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `data` under `key`, replacing any existing blob
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Removes a blob; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Removes every blob whose key starts with `prefix`
    async fn delete_prefix(&self, prefix: &str) -> Result<(), StorageError>;
}

/// Prefix under which all blobs of a project are stored
pub fn project_prefix(project_id: Uuid) -> String {
    format!("projects/{}", project_id)
}

pub fn file_key(project_id: Uuid, file_id: Uuid) -> String {
    format!("{}/{}", project_prefix(project_id), file_id)
}

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Rejects keys that could escape the store root
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");

    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_key_layout() {
        let project_id = Uuid::new_v4();
        let file_id = Uuid::new_v4();
        let key = file_key(project_id, file_id);

        assert!(key.starts_with(&project_prefix(project_id)));
        assert_eq!(key, format!("projects/{}/{}", project_id, file_id));
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(sha256_hex(b"").len(), 64);
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        for key in ["", "/etc/passwd", "projects/../secret", "a//b", "a/./b", "a\\b"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }
    }
}
