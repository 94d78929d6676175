//! Bootstrap the metamodel eagerly and report every problem found.

use super::build_loader;
use anyhow::{bail, Context, Result};
use facetry_core::{
    BootstrapSummary, DeploymentError, IntrospectionMode, MetamodelConfig, ValidationReport,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidationResponse<'a> {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a BootstrapSummary>,
    report: &'a ValidationReport,
}

/// Validate a domain description; fails when the report is non-empty.
pub fn validate(mut config: MetamodelConfig, domain: &Path, json: bool) -> Result<()> {
    config.introspection.mode = IntrospectionMode::Eager;
    let loader = build_loader(config, domain)?;

    let (summary, report) = match loader.bootstrap() {
        Ok(summary) => (Some(summary), ValidationReport::new()),
        Err(DeploymentError::Invalid { report, .. }) => (None, report),
        Err(err) => return Err(err).context("Failed to bootstrap metamodel"),
    };

    if json {
        let payload = ValidationResponse {
            valid: report.is_empty(),
            summary: summary.as_ref(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if let Some(summary) = &summary {
        println!(
            "Metamodel valid: {} specifications, {} members",
            summary.specifications, summary.members
        );
    } else {
        println!("Metamodel invalid: {} problem(s)", report.len());
        print!("{}", report);
    }

    if !report.is_empty() {
        bail!("metamodel is invalid: {} problem(s)", report.len());
    }
    Ok(())
}
