use super::mocks::{MemoryVolumeStore, RecordingViewer, ScriptedConsent};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use std::{path::Path, sync::Arc};
use tempfile::TempDir;
use voxel_relay::{
    Session,
    config::{Config, StorageConfig, TransportConfig},
    decode::DecoderRegistry,
    exchange::InferenceExchange,
    transport::HttpTransport,
};
use wiremock::MockServer;

/// Create a test configuration pointing at `discovery_url` with scratch
/// storage under `dir`.
pub fn create_test_config(dir: &Path, discovery_url: &str) -> Config {
    let mut config = Config::default();
    config.discovery.url = discovery_url.to_string();
    config.transport = TransportConfig {
        timeout_secs: 5,
        chunk_size: 16,
    };
    config.storage = StorageConfig {
        temp_dir: dir.to_path_buf(),
        output_dir: dir.join("results"),
        cleanup_uploads: false,
    };
    config
}

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// One directory entry whose endpoints live on `base`.
pub fn service_entry(base: &str, sid: &str, modality: &str, anatomy: &str, dim: &str) -> Value {
    json!({
        "name": format!("{} segmentation", anatomy),
        "SID": sid,
        "modality": modality,
        "anatomy": anatomy,
        "dimensionality": dim,
        "description": format!("Segments the {} in {} scans", anatomy, modality),
        "prediction_url": format!("{}/{}/predict", base, sid),
        "interface_url": format!("{}/{}/interface", base, sid),
    })
}

pub fn label_volume_reply(contents: &[&[u8]]) -> Value {
    json!({
        "descriptions": contents.iter().map(|_| json!({"type": "LabelVolume"})).collect::<Vec<_>>(),
        "responses": contents
            .iter()
            .map(|bytes| json!({"content": STANDARD.encode(bytes)}))
            .collect::<Vec<_>>(),
    })
}

/// Collaborators shared between a session and the test asserting on it.
pub struct TestHost {
    pub store: Arc<MemoryVolumeStore>,
    pub viewer: Arc<RecordingViewer>,
    pub consent: Arc<ScriptedConsent>,
}

impl TestHost {
    pub fn new(store: MemoryVolumeStore, consent: ScriptedConsent) -> Self {
        Self {
            store: Arc::new(store),
            viewer: Arc::new(RecordingViewer::new()),
            consent: Arc::new(consent),
        }
    }

    pub fn session(&self, config: &Config, decoders: Option<DecoderRegistry>) -> Session {
        let transport = Arc::new(HttpTransport::new(&config.transport).unwrap());
        let mut exchange = InferenceExchange::new(
            transport.clone(),
            self.store.clone(),
            self.viewer.clone(),
            self.consent.clone(),
            &config.storage,
        );
        if let Some(decoders) = decoders {
            exchange = exchange.with_decoders(decoders);
        }
        Session::new(transport, exchange, config)
    }
}

/// Bodies of every request the server saw on `path`.
pub async fn received_bodies(server: &MockServer, path: &str) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == path)
        .map(|request| String::from_utf8_lossy(&request.body).into_owned())
        .collect()
}
