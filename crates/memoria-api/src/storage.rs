use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Largest accepted upload. Enforced both here and by the server's body
/// limit layer.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// On-disk storage for uploaded images and videos.
///
/// Files are stored flat under the upload dir with a generated
/// `{uuid}.{ext}` name and served statically under `/static`.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Writes the bytes under a fresh unique name, keeping the original
    /// extension, and returns the stored filename.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let ext = extension_of(original_name);
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        fs::write(self.file_path(&filename), data).await?;
        Ok(filename)
    }

    /// Best-effort delete; a missing file is not an error.
    pub async fn delete(&self, filename: &str) -> Result<()> {
        match fs::remove_file(self.file_path(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} already gone", filename);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
        .to_ascii_lowercase()
}
