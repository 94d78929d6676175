//! Error types for the metamodel engine

use crate::validation::ValidationReport;
use facetry_types::{Identifier, LogicalType};
use thiserror::Error;

/// Errors surfaced by the specification loader
#[derive(Debug, Clone, Error)]
pub enum MetamodelError {
    /// No descriptor is known for the requested type
    #[error("no descriptor for type {0}")]
    UnknownType(LogicalType),

    /// A factory failed while fail-fast introspection is configured
    #[error("factory '{factory}' failed on {identifier}: {message}")]
    FactoryFailed {
        identifier: Identifier,
        factory: String,
        message: String,
    },
}

/// Errors that block the application from starting
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("metamodel is invalid, {count} problem(s):\n{report}")]
    Invalid {
        count: usize,
        report: ValidationReport,
    },

    #[error(transparent)]
    Metamodel(#[from] MetamodelError),
}

impl DeploymentError {
    /// The collected report, if this error came from validation
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            DeploymentError::Invalid { report, .. } => Some(report),
            DeploymentError::Metamodel(_) => None,
        }
    }
}

/// Result type using MetamodelError
pub type Result<T> = std::result::Result<T, MetamodelError>;
