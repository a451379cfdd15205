use super::{
    context::{AbortReason, PartFailure, SubmissionContext, SubmissionOutcome, SubmissionReport},
    fsm::{ExchangeEvent, ExchangeState, ExchangeStateMachine},
};
use crate::{
    Error, Result,
    config::StorageConfig,
    decode::{DecodeContext, DecoderRegistry, ResponsePart, parse_response},
    form::{Form, FormSlot},
    host::{ConsentPrompt, Viewer, VolumeStore},
    transport::{ProgressSink, Transport, UploadPart},
};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Drives one submission at a time: consent gate, staging, upload, dispatch.
pub struct InferenceExchange {
    transport: Arc<dyn Transport>,
    store: Arc<dyn VolumeStore>,
    viewer: Arc<dyn Viewer>,
    consent: Arc<dyn ConsentPrompt>,
    decoders: DecoderRegistry,
    temp_dir: PathBuf,
    cleanup_uploads: bool,
    last_volume_name: Option<String>,
    machine: ExchangeStateMachine,
}

impl InferenceExchange {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn VolumeStore>,
        viewer: Arc<dyn Viewer>,
        consent: Arc<dyn ConsentPrompt>,
        storage: &StorageConfig,
    ) -> Self {
        let decoders = DecoderRegistry::with_defaults(store.clone());
        Self {
            transport,
            store,
            viewer,
            consent,
            decoders,
            temp_dir: storage.temp_dir.clone(),
            cleanup_uploads: storage.cleanup_uploads,
            last_volume_name: None,
            machine: ExchangeStateMachine::new(),
        }
    }

    pub fn with_decoders(mut self, decoders: DecoderRegistry) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn state(&self) -> ExchangeState {
        self.machine.current_state()
    }

    pub fn last_volume_name(&self) -> Option<&str> {
        self.last_volume_name.as_deref()
    }

    /// Runs one submission of `form` against `prediction_url`.
    ///
    /// Pre-flight aborts (no service, consent declined) are reported as
    /// `SubmissionOutcome::Aborted` without touching the network. Failures
    /// after that are returned as errors; the exchange is back in `Idle`
    /// either way.
    pub async fn submit(
        &mut self,
        prediction_url: &str,
        form: &Form,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<SubmissionOutcome> {
        if prediction_url.trim().is_empty() {
            info!("No server has been specified");
            return Ok(SubmissionOutcome::Aborted(AbortReason::NoServiceSelected));
        }

        let mut ctx = SubmissionContext::new(prediction_url);
        ctx.grant_consent(self.consent.confirm(prediction_url).await);
        if !ctx.take_consent() {
            info!("User requested stop");
            return Ok(SubmissionOutcome::Aborted(AbortReason::ConsentDeclined));
        }

        info!(
            submission = %ctx.id,
            "Connecting to server {}", prediction_url
        );
        self.machine.transition(ExchangeEvent::Confirmed)?;

        let result = self.run(&mut ctx, form, progress).await;
        let elapsed_ms = ctx.elapsed().num_milliseconds();
        match &result {
            Ok(report) => info!(
                submission = %ctx.id,
                elapsed_ms,
                "Submission finished with {} artifacts", report.artifacts.len()
            ),
            Err(e) => {
                error!(submission = %ctx.id, elapsed_ms, "Submission failed: {}", e);
                self.machine.transition(ExchangeEvent::Aborted)?;
            }
        }

        if self.cleanup_uploads {
            remove_staged(&ctx.message.file_paths()).await;
        }

        result.map(SubmissionOutcome::Completed)
    }

    async fn run(
        &mut self,
        ctx: &mut SubmissionContext,
        form: &Form,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<SubmissionReport> {
        self.collect(ctx, form).await?;
        self.machine.transition(ExchangeEvent::MessageReady)?;

        progress.begin();
        let reply = self
            .transport
            .post_multipart(&ctx.prediction_url, &ctx.message, progress.clone())
            .await;
        progress.finish();
        let reply = reply?;
        info!(submission = %ctx.id, "Response received");
        self.machine.transition(ExchangeEvent::ReplyReceived)?;

        let parts = parse_response(reply)?;
        let report = self.dispatch(ctx.id, parts).await;
        self.machine.transition(ExchangeEvent::Finished)?;

        Ok(report)
    }

    /// Stages every slot of `form` into the submission's upload message.
    async fn collect(&mut self, ctx: &mut SubmissionContext, form: &Form) -> Result<()> {
        for slot in form.slots() {
            match slot {
                FormSlot::Volume(slot) => {
                    let volume = slot.volume.as_ref().ok_or_else(|| {
                        Error::schema(format!("no volume selected for '{}'", slot.destination))
                    })?;
                    let path = self.temp_dir.join(format!("{}.mha", Uuid::new_v4()));
                    self.store.save_volume(volume, &path).await?;
                    debug!("Staged volume '{}' at {}", volume.name, path.display());

                    ctx.message
                        .insert(slot.destination.clone(), UploadPart::volume(path));
                    self.last_volume_name = Some(volume.name.clone());
                    self.viewer.show_input(volume);
                }
                FormSlot::Range(slot) => {
                    ctx.message
                        .insert(slot.destination.clone(), UploadPart::text(slot.value_text()));
                }
            }
        }
        Ok(())
    }

    async fn dispatch(&self, submission_id: Uuid, parts: Vec<ResponsePart>) -> SubmissionReport {
        let mut report = SubmissionReport {
            submission_id,
            artifacts: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        };
        let decode_ctx = DecodeContext {
            volume_name: self.last_volume_name.as_deref(),
            temp_dir: &self.temp_dir,
        };

        for part in parts {
            let tag = part.tag.unwrap_or_default();
            let Some(decoder) = self.decoders.lookup(&tag) else {
                debug!("Ignoring reply part {} with type '{}'", part.index, tag);
                report.skipped.push(part.index);
                continue;
            };

            match decoder.decode(&part.payload, &decode_ctx).await {
                Ok(Some(artifact)) => {
                    self.viewer.show_artifact(&artifact);
                    report.artifacts.push(artifact);
                }
                Ok(None) => debug!("Reply part {} ({}) produced no artifact", part.index, tag),
                Err(e) => {
                    warn!("Failed to decode reply part {} ({}): {}", part.index, tag, e);
                    report.failures.push(PartFailure {
                        index: part.index,
                        tag,
                        error: e,
                    });
                }
            }
        }

        report
    }
}

async fn remove_staged(files: &[PathBuf]) {
    for path in files {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }
    }
}
