use std::path::{Path, PathBuf};

use fifo_core::{FifoError, FifoResult};
use tokio::sync::Mutex;
use tracing::debug;

use crate::aggregator::{MetricsAggregator, PersistedMetrics};

/// 指标快照文件
///
/// 写入先落到临时文件再重命名，读者不会看到写了一半的文件。
/// 并发请求的写入通过内部锁串行化。
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn persist(&self, metrics: &MetricsAggregator) -> FifoResult<()> {
        let _guard = self.write_lock.lock().await;
        let snapshot = metrics.persisted();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &bytes).await?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| FifoError::Persistence(format!("无法替换指标文件: {e}")))?;

        debug!(
            "指标快照已写入 {} (总请求数: {})",
            self.path.display(),
            snapshot.total_requests
        );
        Ok(())
    }

    /// 读取上次写入的快照，文件不存在时返回 `None`
    pub async fn load(&self) -> FifoResult<Option<PersistedMetrics>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
