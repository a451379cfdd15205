mod client;
mod message;
mod progress;

pub use client::{HttpTransport, Transport};
pub use message::{UploadMessage, UploadPart, VOLUME_CONTENT_TYPE, VOLUME_FILE_NAME};
pub use progress::{NoProgress, ProgressSink, RecordingProgress};

#[cfg(test)]
pub use client::MockTransport;
