mod client;
mod types;

pub use client::{discover, parse_services};
pub use types::{AnatomyMap, DimensionalityMap, ServiceCatalog, ServiceDescriptor};
