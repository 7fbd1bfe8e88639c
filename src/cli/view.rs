//! View subcommand - render a graph from a JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::gesture::{HandTracking, SyntheticBackend};
use crate::models::GraphData;
use crate::viewer::{run_viewer, ViewerOptions};

/// Hand-tracking mode for the viewer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HandsMode {
    /// No tracking; the camera auto-rotates and follows the mouse only.
    Off,
    /// Scripted synthetic hand, no hardware needed.
    Synthetic,
}

/// Render a graph JSON file (`{"nodes": [...], "edges": [...]}`) in 3D.
#[derive(Parser)]
pub struct ViewCommand {
    /// Path to the graph JSON file.
    pub input: PathBuf,

    /// Hand-tracking mode.
    #[arg(long, value_enum, default_value = "off")]
    pub hands: HandsMode,

    /// Re-ingest the file whenever it changes on disk.
    #[arg(long)]
    pub watch: bool,
}

impl ViewCommand {
    /// Run the view command. Blocks until the window is closed.
    pub async fn run(self, config: Config) -> color_eyre::Result<()> {
        let graph = load_graph(&self.input)?;
        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "graph loaded"
        );

        let tracking = match self.hands {
            HandsMode::Off => None,
            HandsMode::Synthetic => {
                let mut tracking_config = config.tracking.clone();
                tracking_config.model = "builtin".to_string();
                let tracking =
                    HandTracking::initialize(&tracking_config, Arc::new(SyntheticBackend)).await?;
                Some(tracking)
            }
        };

        let (updates, watcher) = if self.watch {
            let (tx, rx) = mpsc::channel(4);
            let task = tokio::spawn(watch_graph_file(self.input.clone(), tx));
            (Some(rx), Some(task))
        } else {
            (None, None)
        };

        run_viewer(ViewerOptions {
            graph,
            settings: config.viewer.clone(),
            gesture: tracking.as_ref().map(|t| t.gesture()),
            status: tracking.as_ref().map(|t| t.status()),
            updates,
            on_select: Some(Box::new(|id| match id {
                Some(id) => info!(%id, "entity selected"),
                None => info!("selection cleared"),
            })),
        });

        // Window closed: tear down in order (watcher task, then the
        // tracking pipeline, which releases detector and camera)
        if let Some(task) = watcher {
            task.abort();
        }
        if let Some(tracking) = tracking {
            tracking.shutdown().await;
        }
        Ok(())
    }
}

fn load_graph(path: &Path) -> Result<GraphData, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::GraphFile(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::GraphFile(format!("{}: {e}", path.display())))
}

/// Poll the file's mtime off the render loop; push re-reads through the
/// channel. The render loop drains it non-blockingly.
async fn watch_graph_file(path: PathBuf, tx: mpsc::Sender<GraphData>) {
    let mut last_modified = None;
    let mut ticker = tokio::time::interval(Duration::from_secs(2));

    loop {
        ticker.tick().await;
        let modified = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        let first = last_modified.is_none();
        if last_modified == Some(modified) {
            continue;
        }
        last_modified = Some(modified);
        if first {
            // The initial load already went through the viewer
            continue;
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("graph re-read failed: {e}");
                continue;
            }
        };
        match serde_json::from_str::<GraphData>(&content) {
            Ok(data) => {
                info!(nodes = data.nodes.len(), "graph file changed, re-ingesting");
                if tx.send(data).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("graph file changed but failed to parse: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_graph_reports_missing_file() {
        let err = load_graph(Path::new("/nonexistent/graph.json")).unwrap_err();
        assert!(matches!(err, AppError::GraphFile(_)));
    }

    #[test]
    fn test_load_graph_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_graph(&path).unwrap_err();
        assert!(matches!(err, AppError::GraphFile(_)));
    }

    #[test]
    fn test_load_graph_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(
            &path,
            r#"{"nodes": [{"id": "a", "type": "agent", "label": "Ada"}], "edges": []}"#,
        )
        .unwrap();
        let data = load_graph(&path).unwrap();
        assert_eq!(data.nodes.len(), 1);
    }
}
