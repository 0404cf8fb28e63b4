//! Error taxonomy for the serialization boundary.
//!
//! | Type | Raised by | Typical status |
//! |------|-----------|----------------|
//! | [`SchemaError`] | field declarations, unknown entity types | 500 |
//! | [`InboundFormatError`] | malformed client payloads | 400 / 422 |
//! | [`WireFormatError`] | malformed `included` / related structures | 422 |
//!
//! [`WireError`] wraps all three so callers can use `?` across the engine
//! and turn any failure into a single-error document at the transport
//! boundary with [`WireError::to_document`].

use thiserror::Error;

use crate::envelope::{as_error, WireDocument};

/// Malformed or inconsistent field declarations. Fatal at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("no schema registered for entity type {0:?}")]
    UnknownEntityType(String),

    #[error("field {field:?} embeds entity type {target:?}, which has no registered schema")]
    UnknownEmbeddedType { field: String, target: String },

    #[error("entity type {entity:?} declares wire name {wire:?} more than once")]
    DuplicateWireName { entity: String, wire: String },

    #[error("field {0:?} cannot be both inbound and outbound")]
    InboundAndOutbound(String),

    #[error("field {0:?} cannot be both internal and meta")]
    InternalAndMeta(String),

    #[error("field {0:?} is write-only and cannot also be outbound or meta")]
    WriteOnlyEmitted(String),

    #[error("field {0:?} must have a non-empty name")]
    EmptyFieldName(String),

    #[error("entity type {0:?} is already registered with a different schema")]
    ConflictingDeclaration(String),

    #[error("wire type name {wire:?} of entity type {entity:?} is already used by {owner:?}")]
    WireTypeTaken {
        entity: String,
        wire: String,
        owner: String,
    },
}

/// Malformed client payload. Reported as a 4xx document, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InboundFormatError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload must be nested under {singular:?} or {plural:?}")]
    MissingRoot { singular: String, plural: String },

    #[error("expected a JSON object for {0}")]
    ExpectedObject(String),

    #[error("field {field:?} expects {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: String,
    },

    #[error("field {field:?} is not a valid RFC 3339 timestamp: {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("resource id must be a string or integer, got {0}")]
    InvalidId(String),
}

/// Malformed `included` / related structure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireFormatError {
    #[error("wire type name {0:?} does not resolve to a registered entity type")]
    UnresolvableType(String),

    #[error("`included` must be a list of resource objects")]
    IncludedNotList,

    #[error("malformed included resource at index {index}: {reason}")]
    MalformedIncluded { index: usize, reason: String },
}

/// Any failure raised while converting between entities and wire documents.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Inbound(#[from] InboundFormatError),

    #[error(transparent)]
    Format(#[from] WireFormatError),

    /// The caller-supplied resolver could not produce an entity.
    #[error("{0}")]
    Resolve(String),
}

impl WireError {
    /// HTTP status this error is reported with at the transport boundary.
    pub fn status(&self) -> u16 {
        match self {
            WireError::Schema(_) => 500,
            WireError::Inbound(InboundFormatError::InvalidJson(_))
            | WireError::Inbound(InboundFormatError::MissingRoot { .. })
            | WireError::Inbound(InboundFormatError::ExpectedObject(_))
            | WireError::Inbound(InboundFormatError::InvalidId(_)) => 400,
            WireError::Inbound(_) | WireError::Format(_) => 422,
            WireError::Resolve(_) => 404,
        }
    }

    /// Short title matching [`status`](Self::status).
    pub fn title(&self) -> &'static str {
        match self.status() {
            400 => "Bad Request",
            404 => "Not Found",
            422 => "Unprocessable Entity",
            _ => "Internal Server Error",
        }
    }

    /// A single-error document carrying this error's message as `detail`.
    pub fn to_document(&self) -> WireDocument {
        as_error(self.status(), self.title(), Some(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_shape_errors_are_bad_requests() {
        let e: WireError = InboundFormatError::MissingRoot {
            singular: "recall".into(),
            plural: "recalls".into(),
        }
        .into();
        assert_eq!(e.status(), 400);
        assert_eq!(e.title(), "Bad Request");
    }

    #[test]
    fn type_mismatch_is_unprocessable() {
        let e: WireError = InboundFormatError::TypeMismatch {
            field: "title".into(),
            expected: "a string",
            got: "true".into(),
        }
        .into();
        assert_eq!(e.status(), 422);
    }

    #[test]
    fn document_carries_message_as_detail() {
        let e: WireError = SchemaError::UnknownEntityType("widget".into()).into();
        let doc = e.to_document();
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].status, 500);
        assert_eq!(
            doc.errors[0].detail.as_deref(),
            Some("no schema registered for entity type \"widget\"")
        );
        assert!(doc.data.is_empty());
    }
}
