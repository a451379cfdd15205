use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::VecDeque,
    path::Path,
    sync::{Arc, Mutex},
};
use voxel_relay::{
    Result,
    decode::{Artifact, DecodeContext, ResponseDecoder},
    host::{ConsentPrompt, LabelVolumeHandle, Viewer, VolumeRef, VolumeStore},
};

/// Volume store backed by an in-memory map of volume id -> bytes.
#[derive(Debug, Default)]
pub struct MemoryVolumeStore {
    pub volumes: Mutex<Vec<(String, Vec<u8>)>>,
    pub loaded: Mutex<Vec<Vec<u8>>>,
}

impl MemoryVolumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volume(self, id: &str, bytes: &[u8]) -> Self {
        self.volumes
            .lock()
            .unwrap()
            .push((id.to_string(), bytes.to_vec()));
        self
    }

    pub fn loaded(&self) -> Vec<Vec<u8>> {
        self.loaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl VolumeStore for MemoryVolumeStore {
    async fn save_volume(&self, volume: &VolumeRef, path: &Path) -> Result<()> {
        let bytes = self
            .volumes
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| *id == volume.id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, volume.id.clone())
            })?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn load_label_volume(&self, path: &Path) -> Result<LabelVolumeHandle> {
        let bytes = tokio::fs::read(path).await?;
        self.loaded.lock().unwrap().push(bytes);
        Ok(LabelVolumeHandle {
            id: format!("label-{}", self.loaded.lock().unwrap().len()),
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })
    }
}

/// Viewer that remembers what it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingViewer {
    pub inputs: Mutex<Vec<VolumeRef>>,
    pub artifacts: Mutex<Vec<Artifact>>,
}

impl RecordingViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> Vec<VolumeRef> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().unwrap().clone()
    }
}

impl Viewer for RecordingViewer {
    fn show_input(&self, volume: &VolumeRef) {
        self.inputs.lock().unwrap().push(volume.clone());
    }

    fn show_artifact(&self, artifact: &Artifact) {
        self.artifacts.lock().unwrap().push(artifact.clone());
    }
}

/// Consent prompt that plays back scripted answers and counts questions.
/// Answers `false` once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedConsent {
    pub answers: Mutex<VecDeque<bool>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedConsent {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

#[async_trait]
impl ConsentPrompt for ScriptedConsent {
    async fn confirm(&self, prediction_url: &str) -> bool {
        self.asked.lock().unwrap().push(prediction_url.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Decoder that records each payload it receives and produces nothing.
#[derive(Debug, Default, Clone)]
pub struct CountingDecoder {
    pub payloads: Arc<Mutex<Vec<Value>>>,
}

impl CountingDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseDecoder for CountingDecoder {
    async fn decode(&self, payload: &Value, _ctx: &DecodeContext<'_>) -> Result<Option<Artifact>> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(None)
    }
}
