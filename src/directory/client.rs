use super::types::{ServiceCatalog, ServiceDescriptor};
use crate::{Error, Result, transport::Transport};
use serde_json::Value;
use tracing::{debug, info};

/// Fetches the service list from `discovery_url` and groups it into a catalog.
///
/// The catalog is all-or-nothing: one malformed entry rejects the whole
/// response.
pub async fn discover(transport: &dyn Transport, discovery_url: &str) -> Result<ServiceCatalog> {
    info!("Discovering services at {}", discovery_url);

    let body = transport.get_json(discovery_url).await?;
    let services = parse_services(body)?;
    let catalog = ServiceCatalog::from_services(services);

    info!("Discovered {} services", catalog.len());
    Ok(catalog)
}

pub fn parse_services(body: Value) -> Result<Vec<ServiceDescriptor>> {
    let Value::Array(entries) = body else {
        return Err(Error::schema("discovery response is not a JSON array"));
    };

    let mut services = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let service: ServiceDescriptor = serde_json::from_value(entry)
            .map_err(|e| Error::schema(format!("service entry {}: {}", index, e)))?;
        debug!(
            "Service {} ({}) under {}/{}/{}",
            service.name, service.sid, service.modality, service.anatomy, service.dimensionality
        );
        services.push(service);
    }

    Ok(services)
}
