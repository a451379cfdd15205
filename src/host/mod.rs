//! Collaborators owned by the embedding application: volume storage, viewer,
//! consent prompt. The core only talks to them through these traits.

mod local;

pub use local::{AutoConsent, LocalVolumeStore, LogProgress, LogViewer, TerminalConsent};

use crate::{Result, decode::Artifact};
use async_trait::async_trait;
use std::path::Path;

/// Reference to a volume the host owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRef {
    pub id: String,
    pub name: String,
}

impl VolumeRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Handle to a label volume the host loaded from a result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVolumeHandle {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait VolumeStore: Send + Sync {
    /// Writes `volume` to `path` as a self-describing volumetric image.
    async fn save_volume(&self, volume: &VolumeRef, path: &Path) -> Result<()>;

    /// Loads `path` as a label volume. The file may be removed afterwards.
    async fn load_label_volume(&self, path: &Path) -> Result<LabelVolumeHandle>;
}

pub trait Viewer: Send + Sync {
    fn show_input(&self, volume: &VolumeRef);

    fn show_artifact(&self, artifact: &Artifact);
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    /// Asks the user to approve sending data to `prediction_url`.
    async fn confirm(&self, prediction_url: &str) -> bool;
}

pub fn consent_message(prediction_url: &str) -> String {
    format!(
        "You are about to send the selected data over the network to a remote server at {}.\n\
         It is your responsibility to make sure that doing so does not violate any rules \
         governing access to this data.",
        prediction_url
    )
}
