//! Error types for the protoc-gen-delphi crate.

use std::path::PathBuf;

/// Errors that can occur while turning a compiler request into Delphi units.
///
/// Every variant is fatal for the request: there is no partial output and no
/// retry, since generation is a deterministic function of its input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A generated identifier still collides after collision avoidance.
    #[error("{kind} identifier '{identifier}' for '{entity}' collides even after collision avoidance")]
    IdentifierCollision {
        kind: &'static str,
        entity: String,
        identifier: String,
    },

    /// A field uses a type tag outside the supported scalar/enum/message set.
    #[error("field '{field}' has unimplemented type {type_id}")]
    UnimplementedFieldType { field: String, type_id: i32 },

    /// An unrecognized `key=value` pair was passed in the plugin parameter.
    #[error("unimplemented generation option '{key}'")]
    UnimplementedOption { key: String },

    /// A dependency file name could not be resolved against the descriptor set.
    #[error("schema file '{name}' referenced by '{referenced_by}' not found in request")]
    MissingFile { name: String, referenced_by: String },

    /// A message or enum type name could not be resolved against the descriptor set.
    #[error("type '{name}' referenced by '{referenced_by}' not found in request")]
    MissingType { name: String, referenced_by: String },

    /// The descriptor violates a protobuf rule the generator relies on.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The serialized request or descriptor set could not be decoded.
    #[error("failed to decode descriptor: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The response could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(#[from] prost::EncodeError),

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write generated units.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Standard input/output failure in plugin mode.
    #[error("plugin I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// AST serialization error.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
