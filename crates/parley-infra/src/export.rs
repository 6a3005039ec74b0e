//! JSON export of a finished run.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use parley_types::timeline::FinalizedEntry;
use parley_types::turn::UserOutcome;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to serialize run: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// On-disk shape of an exported run.
#[derive(Debug, Serialize)]
pub struct RunExport<'a> {
    pub exported_at: DateTime<Utc>,
    pub total_seconds: f64,
    pub timeline: &'a [FinalizedEntry],
    pub outcomes: &'a [UserOutcome],
}

/// Write `export` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
pub async fn write_run(path: &Path, export: &RunExport<'_>) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(export)?;
    let write_err = |source| ExportError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(path, json).await.map_err(write_err)?;
    tracing::info!(path = %path.display(), entries = export.timeline.len(), "Exported timeline");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::timeline::TimelineEntry;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_pretty_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("runs").join("timeline.json");
        let timeline = vec![FinalizedEntry {
            entry: TimelineEntry::send("a1", "deadbeef", None, "hello"),
            elapsed: 0.0,
        }];

        write_run(
            &path,
            &RunExport {
                exported_at: Utc::now(),
                total_seconds: 1.5,
                timeline: &timeline,
                outcomes: &[],
            },
        )
        .await
        .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["total_seconds"], 1.5);
        assert_eq!(value["timeline"][0]["user_id"], "a1");
        assert_eq!(value["timeline"][0]["kind"], "send");
        assert_eq!(value["timeline"][0]["elapsed"], 0.0);
    }

    #[tokio::test]
    async fn unwritable_path_is_write_error() {
        let tmp = TempDir::new().unwrap();
        // A directory cannot be overwritten as a file.
        let err = write_run(
            tmp.path(),
            &RunExport {
                exported_at: Utc::now(),
                total_seconds: 0.0,
                timeline: &[],
                outcomes: &[],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }
}
