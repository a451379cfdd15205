use crate::{
    Error, Result,
    config::Config,
    directory::{ServiceCatalog, ServiceDescriptor, discover},
    exchange::{InferenceExchange, SubmissionOutcome},
    form::{Form, build_form},
    schema::fetch_schema,
    transport::{ProgressSink, Transport},
};
use std::sync::Arc;
use tracing::{info, warn};

/// What the user is currently pointed at: a discovered service or a server
/// URL typed in directly.
pub struct Session {
    transport: Arc<dyn Transport>,
    exchange: InferenceExchange,
    discovery_url: String,
    catalog: ServiceCatalog,
    prediction_url: String,
    interface_url: String,
    description: String,
    form: Form,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, exchange: InferenceExchange, config: &Config) -> Self {
        Self {
            transport,
            exchange,
            discovery_url: config.discovery.url.clone(),
            catalog: ServiceCatalog::default(),
            prediction_url: String::new(),
            interface_url: String::new(),
            description: String::new(),
            form: Form::default(),
        }
    }

    pub fn set_discovery_url(&mut self, url: impl Into<String>) {
        self.discovery_url = url.into();
    }

    /// Replaces the catalog with a fresh listing. On failure the catalog is
    /// left empty.
    pub async fn discover(&mut self) -> Result<&ServiceCatalog> {
        self.catalog = ServiceCatalog::default();
        self.catalog = discover(self.transport.as_ref(), &self.discovery_url).await?;
        Ok(&self.catalog)
    }

    /// Points submissions at `url` with no interface schema.
    pub fn select_direct(&mut self, url: impl Into<String>) {
        self.prediction_url = url.into();
        self.interface_url.clear();
        self.description.clear();
        self.form = Form::default();
        info!("Using direct connection to {}", self.prediction_url);
    }

    pub async fn select_service(&mut self, sid: &str) -> Result<()> {
        let service = self
            .catalog
            .find_by_sid(sid)
            .cloned()
            .ok_or_else(|| Error::schema(format!("no discovered service with SID '{}'", sid)))?;
        self.select_descriptor(&service).await
    }

    /// Fetches the service's schema and swaps in a fresh form. The previous
    /// selection and form survive a failed fetch.
    pub async fn select_descriptor(&mut self, service: &ServiceDescriptor) -> Result<()> {
        self.select_endpoints(&service.prediction_url, &service.interface_url)
            .await?;
        self.description = service.description.clone();
        info!(
            "Selected service '{}' ({}) with {} fields",
            service.name,
            service.sid,
            self.form.len()
        );
        Ok(())
    }

    /// Selects a prediction endpoint whose form is described at
    /// `interface_url`, without going through the catalog.
    pub async fn select_endpoints(&mut self, prediction_url: &str, interface_url: &str) -> Result<()> {
        let schema = match fetch_schema(self.transport.as_ref(), interface_url).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Failed to load interface from {}: {}", interface_url, e);
                return Err(e);
            }
        };

        self.prediction_url = prediction_url.to_string();
        self.interface_url = interface_url.to_string();
        self.description.clear();
        self.form = build_form(&schema);
        Ok(())
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn prediction_url(&self) -> &str {
        &self.prediction_url
    }

    pub fn interface_url(&self) -> &str {
        &self.interface_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    pub fn exchange(&self) -> &InferenceExchange {
        &self.exchange
    }

    pub async fn submit(&mut self, progress: Arc<dyn ProgressSink>) -> Result<SubmissionOutcome> {
        self.exchange
            .submit(&self.prediction_url, &self.form, progress)
            .await
    }
}
