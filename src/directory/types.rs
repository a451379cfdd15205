use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One remote inference service as advertised by the directory server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(rename = "SID")]
    pub sid: String,
    pub modality: String,
    pub anatomy: String,
    pub dimensionality: String,
    pub description: String,
    pub prediction_url: String,
    pub interface_url: String,
}

pub type DimensionalityMap = BTreeMap<String, Vec<ServiceDescriptor>>;
pub type AnatomyMap = BTreeMap<String, DimensionalityMap>;

/// Services grouped as modality -> anatomy -> dimensionality.
///
/// Every descriptor sits in exactly one leaf, keyed by its own category
/// fields, and leaves keep the order in which the directory listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    tree: BTreeMap<String, AnatomyMap>,
}

impl ServiceCatalog {
    /// Groups `services` in one pass.
    pub fn from_services(services: Vec<ServiceDescriptor>) -> Self {
        let mut tree: BTreeMap<String, AnatomyMap> = BTreeMap::new();
        for service in services {
            tree.entry(service.modality.clone())
                .or_default()
                .entry(service.anatomy.clone())
                .or_default()
                .entry(service.dimensionality.clone())
                .or_default()
                .push(service);
        }
        Self { tree }
    }

    pub fn get(&self, modality: &str, anatomy: &str, dimensionality: &str) -> &[ServiceDescriptor] {
        self.tree
            .get(modality)
            .and_then(|anatomies| anatomies.get(anatomy))
            .and_then(|dims| dims.get(dimensionality))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All services in tree order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.tree
            .values()
            .flat_map(|anatomies| anatomies.values())
            .flat_map(|dims| dims.values())
            .flatten()
    }

    pub fn find_by_sid(&self, sid: &str) -> Option<&ServiceDescriptor> {
        self.services().find(|service| service.sid == sid)
    }

    pub fn len(&self) -> usize {
        self.services().count()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Indented tree listing, one line per node.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (modality, anatomies) in &self.tree {
            let _ = writeln!(out, "Modality: {}", modality);
            for (anatomy, dims) in anatomies {
                let _ = writeln!(out, "  Anatomy: {}", anatomy);
                for (dimensionality, services) in dims {
                    let _ = writeln!(out, "    Dimensionality: {}", dimensionality);
                    for service in services {
                        let _ = writeln!(out, "      Service: {}. Sid:{}", service.name, service.sid);
                    }
                }
            }
        }
        out
    }
}
