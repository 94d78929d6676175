//! Print introspected specifications.

use super::build_loader;
use anyhow::{Context, Result};
use facetry_core::{
    Facet, FacetHolder, IntrospectionState, MemberKind, MetamodelConfig, ObjectMember,
    ObjectSpecification, TypeKind,
};
use facetry_types::LogicalType;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
struct SpecificationView {
    logical_type: String,
    kind: &'static str,
    state: IntrospectionState,
    rejected: bool,
    ancestors: Vec<String>,
    facets: Vec<Facet>,
    members: Vec<MemberView>,
}

#[derive(Serialize)]
struct MemberView {
    id: String,
    kind: MemberKind,
    #[serde(rename = "type")]
    type_ref: String,
    facets: Vec<Facet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<ParameterView>,
}

#[derive(Serialize)]
struct ParameterView {
    name: String,
    #[serde(rename = "type")]
    type_ref: String,
    facets: Vec<Facet>,
}

fn kind_label(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Concrete => "concrete",
        TypeKind::Abstract => "abstract",
        TypeKind::Interface => "interface",
        TypeKind::Value => "value",
    }
}

fn facets(holder: &FacetHolder) -> Vec<Facet> {
    holder.facets().cloned().collect()
}

fn member_view(member: &ObjectMember) -> MemberView {
    MemberView {
        id: member.id().to_string(),
        kind: member.kind(),
        type_ref: member.type_ref().to_string(),
        facets: facets(member.facets()),
        parameters: member
            .parameters()
            .iter()
            .map(|p| ParameterView {
                name: p.name().to_string(),
                type_ref: p.type_ref().to_string(),
                facets: facets(p.facets()),
            })
            .collect(),
    }
}

fn specification_view(spec: &ObjectSpecification) -> SpecificationView {
    SpecificationView {
        logical_type: spec.logical_type().to_string(),
        kind: kind_label(spec.kind()),
        state: spec.state(),
        rejected: spec.is_rejected(),
        ancestors: spec
            .ancestors()
            .iter()
            .map(|a| a.logical_type().to_string())
            .collect(),
        facets: facets(&spec.effective_facets()),
        members: spec.members().iter().map(|m| member_view(m)).collect(),
    }
}

fn print_facets(indent: &str, facets: &[Facet]) {
    for facet in facets {
        match facet.contributed_by() {
            Some(factory) => println!("{}{}  ({})", indent, facet, factory),
            None => println!("{}{}", indent, facet),
        }
    }
}

fn print_specification(view: &SpecificationView) {
    let rejected = if view.rejected { " REJECTED" } else { "" };
    println!("{} [{}] {}{}", view.logical_type, view.state, view.kind, rejected);
    if !view.ancestors.is_empty() {
        println!("  ancestors: {}", view.ancestors.join(", "));
    }
    print_facets("  ", &view.facets);
    for member in &view.members {
        println!("  {} {}: {}", member.kind, member.id, member.type_ref);
        print_facets("      ", &member.facets);
        for parameter in &member.parameters {
            println!("      param {}: {}", parameter.name, parameter.type_ref);
            print_facets("          ", &parameter.facets);
        }
    }
}

/// Introspect one type, or every known type, and print the result.
pub fn inspect(
    config: MetamodelConfig,
    domain: &Path,
    type_name: Option<&str>,
    json: bool,
) -> Result<()> {
    let loader = build_loader(config, domain)?;
    let specs: Vec<Arc<ObjectSpecification>> = match type_name {
        Some(name) => vec![loader
            .load_specification(&LogicalType::new(name))
            .with_context(|| format!("Failed to introspect {}", name))?],
        None => loader
            .load_all()
            .context("Failed to introspect domain")?
            .into_iter()
            .filter(|s| s.kind() != TypeKind::Value)
            .collect(),
    };

    let views: Vec<SpecificationView> = specs.iter().map(|s| specification_view(s)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        for (i, view) in views.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_specification(view);
        }
    }

    let report = loader.validation_report();
    if !report.is_empty() {
        tracing::warn!(problems = report.len(), "metamodel has problems; run `facetry validate`");
    }
    Ok(())
}
