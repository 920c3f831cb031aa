//! Uploaded-file persistence.
//!
//! Product images and bulk-import CSVs land under the public upload
//! directory with uniqued names. CSVs are deleted after processing
//! regardless of the import outcome.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::AppError;

/// Maximum product images accepted per upload.
pub const MAX_PRODUCT_IMAGES: usize = 5;

/// Persist uploaded bytes under `dir`, returning the public path
/// (`/uploads/<name>`) to store on the product.
pub async fn save_upload(
    dir: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(format!("create upload dir: {e}")))?;

    let name = unique_name(original_name);
    let path = Path::new(dir).join(&name);
    fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(format!("write upload: {e}")))?;

    Ok(format!("/uploads/{}", name))
}

/// Persist an uploaded CSV to a concrete filesystem path for processing.
pub async fn save_csv(dir: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(format!("create upload dir: {e}")))?;

    let path = Path::new(dir).join(unique_name("import.csv"));
    fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(format!("write csv: {e}")))?;
    Ok(path)
}

/// Delete a processed upload; failure is logged, not surfaced.
pub async fn remove_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "failed to delete upload");
    }
}

/// Unique filename preserving the original extension.
fn unique_name(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    format!("{}.{}", uuid::Uuid::new_v4().simple(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_keeps_extension() {
        let name = unique_name("photo.jpg");
        assert!(name.ends_with(".jpg"));
        assert_ne!(unique_name("photo.jpg"), unique_name("photo.jpg"));
    }

    #[test]
    fn test_unique_name_without_extension() {
        assert!(unique_name("blob").ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let public = save_upload(dir_str, "a.jpg", b"bytes").await.unwrap();
        assert!(public.starts_with("/uploads/"));

        let csv_path = save_csv(dir_str, b"name,price\n").await.unwrap();
        assert!(csv_path.exists());
        remove_file(&csv_path).await;
        assert!(!csv_path.exists());
    }
}
