mod label_volume;
mod response;

pub use label_volume::{LabelVolumeDecoder, RESULT_SUFFIX};
pub use response::{ResponsePart, parse_response};

use crate::{
    Result,
    host::{LabelVolumeHandle, VolumeStore},
};
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, path::Path, sync::Arc};

/// Reply part types the client knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    LabelVolume,
    VtkMesh,
    PlainText,
}

impl ResponseKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "LabelVolume" => Some(Self::LabelVolume),
            "VTKMesh" => Some(Self::VtkMesh),
            "PlainText" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Something a decoder produced for the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    LabelVolume(LabelVolumeHandle),
}

pub struct DecodeContext<'a> {
    /// Name of the most recently submitted volume, used for result files.
    pub volume_name: Option<&'a str>,
    pub temp_dir: &'a Path,
}

#[async_trait]
pub trait ResponseDecoder: Send + Sync {
    async fn decode(&self, payload: &Value, ctx: &DecodeContext<'_>) -> Result<Option<Artifact>>;
}

/// Accepts any payload and produces nothing. Holds the mesh and plain-text
/// slots.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDecoder;

#[async_trait]
impl ResponseDecoder for NoopDecoder {
    async fn decode(&self, _payload: &Value, _ctx: &DecodeContext<'_>) -> Result<Option<Artifact>> {
        Ok(None)
    }
}

/// Maps reply tags to decoders. Tags with no decoder are skipped by callers.
#[derive(Default, Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<ResponseKind, Arc<dyn ResponseDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label volumes go through `store`; meshes and plain text are accepted
    /// and ignored.
    pub fn with_defaults(store: Arc<dyn VolumeStore>) -> Self {
        let mut registry = Self::new();
        registry.register(ResponseKind::LabelVolume, Arc::new(LabelVolumeDecoder::new(store)));
        registry.register(ResponseKind::VtkMesh, Arc::new(NoopDecoder));
        registry.register(ResponseKind::PlainText, Arc::new(NoopDecoder));
        registry
    }

    pub fn register(&mut self, kind: ResponseKind, decoder: Arc<dyn ResponseDecoder>) {
        self.decoders.insert(kind, decoder);
    }

    pub fn lookup(&self, tag: &str) -> Option<Arc<dyn ResponseDecoder>> {
        ResponseKind::from_tag(tag).and_then(|kind| self.decoders.get(&kind).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocalVolumeStore;
    use rstest::rstest;

    #[rstest]
    #[case("LabelVolume", Some(ResponseKind::LabelVolume))]
    #[case("VTKMesh", Some(ResponseKind::VtkMesh))]
    #[case("PlainText", Some(ResponseKind::PlainText))]
    #[case("labelvolume", None)]
    #[case("PointCloud", None)]
    fn test_tags_map_to_kinds(#[case] tag: &str, #[case] expected: Option<ResponseKind>) {
        assert_eq!(ResponseKind::from_tag(tag), expected);
    }

    #[test]
    fn test_default_registry_covers_known_tags_only() {
        let registry = DecoderRegistry::with_defaults(Arc::new(LocalVolumeStore::new("out")));

        assert!(registry.lookup("LabelVolume").is_some());
        assert!(registry.lookup("VTKMesh").is_some());
        assert!(registry.lookup("PlainText").is_some());
        assert!(registry.lookup("Unknown").is_none());
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        assert!(DecoderRegistry::new().lookup("LabelVolume").is_none());
    }

    #[tokio::test]
    async fn test_noop_decoder_accepts_anything() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = DecodeContext {
            volume_name: None,
            temp_dir: dir.path(),
        };

        let result = NoopDecoder
            .decode(&serde_json::json!({"mesh": [1, 2, 3]}), &ctx)
            .await
            .unwrap();

        assert!(result.is_none());
    }
}
