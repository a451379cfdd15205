use super::{ConsentPrompt, LabelVolumeHandle, Viewer, VolumeRef, VolumeStore, consent_message};
use crate::{Error, Result, decode::Artifact, transport::ProgressSink};
use async_trait::async_trait;
use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::{info, warn};

/// Volumes are plain files on disk; a `VolumeRef` id is the file path.
pub struct LocalVolumeStore {
    output_dir: PathBuf,
}

impl LocalVolumeStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Builds a reference to the volume file at `path`, named by its stem.
    pub fn volume_at(path: impl AsRef<Path>) -> VolumeRef {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.split('.').next().unwrap_or(n).to_string())
            .unwrap_or_else(|| "volume".to_string());
        VolumeRef::new(path.to_string_lossy(), name)
    }
}

#[async_trait]
impl VolumeStore for LocalVolumeStore {
    async fn save_volume(&self, volume: &VolumeRef, path: &Path) -> Result<()> {
        tokio::fs::copy(&volume.id, path).await?;
        Ok(())
    }

    async fn load_label_volume(&self, path: &Path) -> Result<LabelVolumeHandle> {
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Io(std::io::Error::other("result path has no file name")))?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let target = self.output_dir.join(file_name);
        tokio::fs::copy(path, &target).await?;

        let name = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(LabelVolumeHandle {
            id: target.to_string_lossy().into_owned(),
            name,
        })
    }
}

/// Viewer that only logs what it would display.
#[derive(Debug, Default)]
pub struct LogViewer;

impl Viewer for LogViewer {
    fn show_input(&self, volume: &VolumeRef) {
        info!(volume = %volume.name, "Input volume staged for upload");
    }

    fn show_artifact(&self, artifact: &Artifact) {
        match artifact {
            Artifact::LabelVolume(handle) => {
                info!(name = %handle.name, location = %handle.id, "Label volume received")
            }
        }
    }
}

/// Logs upload progress in 10% steps.
#[derive(Debug, Default)]
pub struct LogProgress {
    last_step: AtomicU64,
}

impl ProgressSink for LogProgress {
    fn begin(&self) {
        self.last_step.store(0, Ordering::SeqCst);
        info!("Uploading to remote server");
    }

    fn report(&self, fraction: f64) {
        let step = (fraction * 10.0).floor() as u64;
        if step > self.last_step.fetch_max(step, Ordering::SeqCst) {
            info!("Upload {}%", step * 10);
        }
    }

    fn finish(&self) {
        info!("Upload finished");
    }
}

/// Answers every consent request the same way, e.g. for `--yes`.
#[derive(Debug, Clone, Copy)]
pub struct AutoConsent(pub bool);

#[async_trait]
impl ConsentPrompt for AutoConsent {
    async fn confirm(&self, _prediction_url: &str) -> bool {
        self.0
    }
}

/// Asks on the terminal and waits for `y`/`yes`.
#[derive(Debug, Default)]
pub struct TerminalConsent;

#[async_trait]
impl ConsentPrompt for TerminalConsent {
    async fn confirm(&self, prediction_url: &str) -> bool {
        let message = consent_message(prediction_url);
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}", message);
            let _ = write!(stderr, "Submit? [y/N] ");
            let _ = stderr.flush();

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(Err(e)) => {
                warn!("Failed to read consent answer: {}", e);
                false
            }
            Err(e) => {
                warn!("Consent prompt task failed: {}", e);
                false
            }
        }
    }
}
