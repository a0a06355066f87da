//! Error types for the `mediastruct` crate.
//!
//! This module defines [`MediaStructError`], the unified error type returned
//! by all fallible operations in the crate. Each analysis call is a pure
//! transformation, so an error only ever describes the single probe result
//! or manifest (or manifest period) it was raised for.

use std::io::Error as IoError;

use thiserror::Error;

/// The unified error type for all `mediastruct` operations.
///
/// Every public method that can fail returns `Result<T, MediaStructError>`.
/// Variants carry the offending text or attribute name so the problem can be
/// diagnosed without additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediaStructError {
    /// A mandatory manifest element or attribute is missing or unusable.
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    /// A timestamp matched none of the accepted formats.
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// A duration string did not match the expected numeric pattern.
    #[error("Malformed duration: {0}")]
    MalformedDuration(String),

    /// The prober output is not structurally valid.
    #[error("Failed to parse probe output: {0}")]
    ProbeParseError(String),

    /// The manifest document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// An I/O error occurred while reading an input file.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// A report could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MediaStructError {
    /// Shorthand for a [`MediaStructError::MalformedManifest`] naming an
    /// attribute of an element.
    pub(crate) fn bad_attribute(element: &str, attribute: &str, value: &str) -> Self {
        MediaStructError::MalformedManifest(format!(
            "{element}@{attribute} has unusable value {value:?}"
        ))
    }
}
