// src/services/storage_service.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::common::error::AppError;

/// Publishes a rendered document and returns the URL it can be fetched from.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn store(&self, local_path: &Path, company_name: &str, customer_name: &str) -> Result<String, AppError>;
}

/// Copies documents under `root` and serves them from `<public_base_url>/files`.
pub struct LocalDocumentStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDocumentStorage {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn copy_into(&self, local_path: &Path, relative: &Path) -> Result<(), AppError> {
        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        }
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(anyhow::anyhow!("{} already exists", target.display()).into());
        }
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|e| anyhow::anyhow!("cannot copy invoice to {}: {e}", target.display()))?;
        Ok(())
    }

    fn url_for(&self, relative: &Path) -> String {
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/files/{}", self.public_base_url, path)
    }
}

#[async_trait]
impl DocumentStorage for LocalDocumentStorage {
    async fn store(&self, local_path: &Path, company_name: &str, customer_name: &str) -> Result<String, AppError> {
        let customer = sanitize_segment(customer_name);
        let folder = PathBuf::from("invoices")
            .join(sanitize_segment(company_name))
            .join(&customer);
        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");

        let first = folder.join(format!("{customer}_{stamp}.pdf"));
        match self.copy_into(local_path, &first).await {
            Ok(()) => Ok(self.url_for(&first)),
            Err(err) => {
                tracing::warn!(error = %err, "Invoice upload failed, retrying with a fresh name");
                let suffix = &Uuid::new_v4().simple().to_string()[..8];
                let second = folder.join(format!("{customer}_{stamp}_{suffix}.pdf"));
                self.copy_into(local_path, &second).await?;
                Ok(self.url_for(&second))
            }
        }
    }
}

/// Reduces a display name to a safe path segment: letters, digits, `-` and `_` only.
pub fn sanitize_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_tricks_and_spaces() {
        assert_eq!(sanitize_segment("Asha Devi"), "Asha_Devi");
        assert_eq!(sanitize_segment("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_segment("  ***  "), "unnamed");
        assert_eq!(sanitize_segment("Sri-Murugan & Co."), "Sri-Murugan_Co");
    }

    #[tokio::test]
    async fn stores_under_company_and_customer_folders() {
        let root = tempfile::tempdir().unwrap();
        let source = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(source.path(), b"%PDF-1.4").unwrap();

        let storage = LocalDocumentStorage::new(root.path().to_path_buf(), "http://shop.test/".into());
        let url = storage.store(source.path(), "Sivakasi Crackers", "Asha").await.unwrap();

        assert!(url.starts_with("http://shop.test/files/invoices/Sivakasi_Crackers/Asha/Asha_"));
        assert!(url.ends_with(".pdf"));

        let relative = url.trim_start_matches("http://shop.test/files/");
        let stored = std::fs::read(root.path().join(relative)).unwrap();
        assert_eq!(stored, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn missing_source_fails_after_retry() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalDocumentStorage::new(root.path().to_path_buf(), "http://shop.test".into());
        let result = storage
            .store(Path::new("/definitely/not/here.pdf"), "Shop", "Asha")
            .await;
        assert!(result.is_err());
    }
}
