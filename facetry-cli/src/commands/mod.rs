//! CLI command implementations.

pub mod inspect;
pub mod validate;

pub use inspect::inspect;
pub use validate::validate;

use anyhow::{Context, Result};
use facetry_core::{DescriptorRegistry, DomainDescription, MetamodelConfig, SpecificationLoader};
use std::path::Path;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "facetry.yml";

/// Load the configuration, falling back to defaults when no file is given or found
pub fn load_config(path: Option<&Path>) -> Result<MetamodelConfig> {
    match path {
        Some(path) => MetamodelConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            MetamodelConfig::from_file(DEFAULT_CONFIG).context("Failed to load facetry.yml")
        }
        None => Ok(MetamodelConfig::default()),
    }
}

/// Read a domain description and set up a loader over it
pub fn build_loader(config: MetamodelConfig, domain: &Path) -> Result<SpecificationLoader> {
    let description = DomainDescription::from_file(domain)
        .with_context(|| format!("Failed to read domain description {}", domain.display()))?;
    let registry = DescriptorRegistry::from_description(description)
        .context("Invalid domain description")?;
    tracing::debug!(types = registry.len(), "domain description loaded");
    Ok(SpecificationLoader::with_builtins(Arc::new(registry), config))
}
