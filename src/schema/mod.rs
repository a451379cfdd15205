use crate::{Error, Result, transport::Transport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

/// One input field a service expects, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldSpec {
    Volume {
        destination: String,
    },
    Slider {
        destination: String,
        minimum: f64,
        maximum: f64,
    },
}

impl FieldSpec {
    pub fn destination(&self) -> &str {
        match self {
            Self::Volume { destination } | Self::Slider { destination, .. } => destination,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Volume { .. } => "volume",
            Self::Slider { .. } => "slider",
        }
    }
}

/// Fetches the ordered field list a service publishes at `interface_url`.
pub async fn fetch_schema(transport: &dyn Transport, interface_url: &str) -> Result<Vec<FieldSpec>> {
    info!("Fetching interface schema from {}", interface_url);

    let body = transport.get_json(interface_url).await?;
    let fields = parse_schema(body)?;

    debug!("Interface declares {} fields", fields.len());
    Ok(fields)
}

/// Parses and validates a schema document, keeping the declared order.
pub fn parse_schema(body: Value) -> Result<Vec<FieldSpec>> {
    let Value::Array(entries) = body else {
        return Err(Error::schema("interface response is not a JSON array"));
    };

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let field: FieldSpec = serde_json::from_value(entry)
            .map_err(|e| Error::schema(format!("field {}: {}", index, e)))?;

        let destination = field.destination();
        if destination.is_empty() {
            return Err(Error::schema(format!("field {}: empty destination", index)));
        }
        if !seen.insert(destination.to_string()) {
            return Err(Error::schema(format!(
                "field {}: duplicate destination '{}'",
                index, destination
            )));
        }
        if let FieldSpec::Slider {
            minimum, maximum, ..
        } = &field
        {
            if !minimum.is_finite() || !maximum.is_finite() || minimum > maximum {
                return Err(Error::schema(format!(
                    "field {}: invalid slider bounds [{}, {}]",
                    index, minimum, maximum
                )));
            }
        }

        fields.push(field);
    }

    Ok(fields)
}
