use std::path::PathBuf;

/// File name sent with every volume part.
pub const VOLUME_FILE_NAME: &str = "filename";
/// Content type sent with every volume part.
pub const VOLUME_CONTENT_TYPE: &str = "text/plain";

/// One named part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadPart {
    /// A serialized volume file, streamed from local storage.
    File {
        file_name: String,
        path: PathBuf,
        content_type: String,
    },
    /// A plain text field.
    Text(String),
}

impl UploadPart {
    pub fn volume(path: impl Into<PathBuf>) -> Self {
        Self::File {
            file_name: VOLUME_FILE_NAME.to_string(),
            path: path.into(),
            content_type: VOLUME_CONTENT_TYPE.to_string(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::File { .. } => None,
        }
    }
}

/// Destination key to part mapping for a single submission.
///
/// Keys keep insertion order; inserting an existing key replaces its part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadMessage {
    parts: Vec<(String, UploadPart)>,
}

impl UploadMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, part: UploadPart) {
        let key = key.into();
        match self.parts.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = part,
            None => self.parts.push((key, part)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&UploadPart> {
        self.parts
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, part)| part)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UploadPart)> {
        self.parts.iter().map(|(key, part)| (key.as_str(), part))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Paths of every file part, in message order.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.parts
            .iter()
            .filter_map(|(_, part)| match part {
                UploadPart::File { path, .. } => Some(path.clone()),
                UploadPart::Text(_) => None,
            })
            .collect()
    }
}
