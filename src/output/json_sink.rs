use crate::output::result::ScrapeResult;
use crate::output::ResultSink;
use crate::ScrapeError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Writes the latest result as pretty JSON to a single file
///
/// Each write replaces the previous record. The record is written to its own
/// sibling temporary file first and renamed into place, so readers never
/// observe a half-written file. Writes through one sink (and its clones) are
/// serialized; the last completed write wins.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique temporary path next to the result file
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "scrape_results.json".into());
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        ));
        self.path.with_file_name(name)
    }

    async fn write_atomic(&self, temp: &Path, bytes: &[u8]) -> Result<(), ScrapeError> {
        let mut file = tokio::fs::File::create(temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn persist(&self, result: &ScrapeResult) -> Result<(), ScrapeError> {
        let mut bytes = serde_json::to_vec_pretty(result)?;
        bytes.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let _guard = self.write_lock.lock().await;
        let temp = self.temp_path();
        if let Err(e) = self.write_atomic(&temp, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        tracing::debug!("Persisted result for {} to {}", result.url, self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Option<ScrapeResult>, ScrapeError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
