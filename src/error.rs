use std::io;
use thiserror::Error;

/// Errors raised while converting field data.
///
/// Every variant is fatal for the run it occurs in. The caller decides how to
/// report it and whether to terminate.
#[derive(Debug, Error)]
pub enum Error {
    /// A marked line did not split into exactly nine tokens.
    #[error("Malformed input line: {line}")]
    MalformedInput { line: String },

    /// A numeric token on a marked line could not be parsed.
    #[error("Invalid {field} '{value}' in input line: {line}")]
    InvalidField {
        field: &'static str,
        value: String,
        line: String,
    },

    #[error("Failed to read input {source_name}")]
    InputRead {
        source_name: String,
        #[source]
        source: io::Error,
    },

    #[error("{ident} not found")]
    PointNotFound { ident: String },

    #[error("Geometry for {ident} not found")]
    GeometryNotFound { ident: String },

    #[error("Bad geometry format: {text}")]
    BadGeometryFormat { text: String },

    #[error("{code} not found in srid table")]
    ReferenceSystemNotFound { code: String },

    #[error("{name} not found in point information types")]
    InfoTypeNotFound { name: String },

    #[error("Failed to load reference snapshot {path}: {reason}")]
    Snapshot { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
