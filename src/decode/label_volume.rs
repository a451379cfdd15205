use super::{Artifact, DecodeContext, ResponseDecoder};
use crate::{Error, Result, host::VolumeStore};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
use std::{path::Path, sync::Arc};
use tracing::{debug, warn};

/// Appended to the submitted volume's name to form the result file name.
pub const RESULT_SUFFIX: &str = "_result.mha";

/// Writes the base64 `content` of a reply part to a temp file, loads it as a
/// label volume and removes the file again.
pub struct LabelVolumeDecoder {
    store: Arc<dyn VolumeStore>,
}

impl LabelVolumeDecoder {
    pub fn new(store: Arc<dyn VolumeStore>) -> Self {
        Self { store }
    }
}

fn decode_content(payload: &Value) -> Result<Vec<u8>> {
    let content = payload
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::decode("label volume payload has no string 'content'"))?;
    // Servers may wrap the encoded text at fixed line widths.
    let compact: String = content.split_whitespace().collect();
    Ok(STANDARD.decode(compact)?)
}

/// File name for the result, built from the last path component of the
/// submitted volume's name so it stays inside the temp dir.
fn result_file_name(volume_name: Option<&str>) -> String {
    let stem = volume_name
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("volume");
    format!("{}{}", stem, RESULT_SUFFIX)
}

#[async_trait]
impl ResponseDecoder for LabelVolumeDecoder {
    async fn decode(&self, payload: &Value, ctx: &DecodeContext<'_>) -> Result<Option<Artifact>> {
        let bytes = decode_content(payload)?;
        let path = ctx.temp_dir.join(result_file_name(ctx.volume_name));
        debug!("Writing {} result bytes to {}", bytes.len(), path.display());
        tokio::fs::write(&path, &bytes).await?;

        let handle = match self.store.load_label_volume(&path).await {
            Ok(handle) => handle,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to remove {}: {}", path.display(), remove_err);
                }
                return Err(e);
            }
        };
        tokio::fs::remove_file(&path).await?;

        Ok(Some(Artifact::LabelVolume(handle)))
    }
}
