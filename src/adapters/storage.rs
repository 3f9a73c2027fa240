use crate::core::{DocumentListing, DocumentSource, SourceDocument};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Folder of assessor reports on the local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

pub fn is_pdf(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

impl DocumentSource for LocalStorage {
    async fn list_documents(&self) -> Result<DocumentListing> {
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        let mut listing = DocumentListing::default();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry.file_type().await?.is_file();

            if is_file && is_pdf(&name) {
                listing.documents.push(SourceDocument {
                    path: entry.path(),
                    name,
                });
            } else {
                tracing::info!("Skipping non-PDF entry: {}", name);
                listing.skipped.push(name);
            }
        }

        // 依檔名排序，輸出順序才固定
        listing.documents.sort_by(|a, b| a.name.cmp(&b.name));
        listing.skipped.sort();
        Ok(listing)
    }

    async fn read_document(&self, document: &SourceDocument) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&document.path).await?)
    }
}
