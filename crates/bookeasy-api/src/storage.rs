use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

/// On-disk store for support form attachments.
///
/// Each upload is a flat file `{dir}/attachment-{uuid}[.ext]`. Client file
/// names are never used as paths.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Writes `data` under a fresh name and returns that name.
    pub async fn save_attachment(&self, client_name: Option<&str>, data: &[u8]) -> Result<String> {
        let name = match client_name.and_then(safe_extension) {
            Some(ext) => format!("attachment-{}.{}", Uuid::new_v4(), ext),
            None => format!("attachment-{}", Uuid::new_v4()),
        };

        let path = self.file_path(&name);
        if let Err(e) = write_file(&path, data).await {
            // Never leave a truncated attachment behind
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        info!("Saved attachment {} ({} bytes)", path.display(), data.len());
        Ok(name)
    }
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await
}

/// Lowercased extension of `name` if it is short and alphanumeric.
fn safe_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
