//! Error type shared by every decomposition entry point.

use crate::geometry::bounds::DomainBoxError;
use thiserror::Error;

/// Errors reported by partitioning, dispatch, and neighbor resolution.
///
/// Every failure is returned synchronously to the caller of the offending
/// operation; no partial decomposition is ever returned alongside an error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecompositionError {
    /// Malformed or infeasible numeric input (bad `leafsize`, invalid box,
    /// points outside the domain, ...).
    #[error("Invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// The requested partitioning strategy is not registered.
    #[error("Unknown decomposition algorithm '{name}' (expected one of: {known})")]
    UnknownAlgorithm {
        /// The tag that was requested.
        name: String,
        /// Comma-separated list of registered tags.
        known: String,
    },

    /// The feature is recognized but not supported for this configuration.
    #[error("Not implemented: {feature}")]
    NotImplemented {
        /// Description of the unsupported configuration.
        feature: String,
    },
}

impl DecompositionError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }
}

impl From<DomainBoxError> for DecompositionError {
    fn from(err: DomainBoxError) -> Self {
        Self::invalid("domain", err.to_string())
    }
}
